//! Benchmarks for diagnostic parsing, stream listing, and classification.
//!
//! Run with: cargo bench
//!
//! These are pure in-memory operations and need no fixtures.

use std::hint::black_box;

use criterion::Criterion;
use loudcheck::{classify, parse_diagnostics, parse_stream_listing};

const FILTER_DIAGNOSTICS: &str = "\
Input #0, wav, from 'programme.wav':
  Duration: 00:42:17.04, bitrate: 2304 kb/s
  Stream #0:0: Audio: pcm_s24le ([1][0][0][0] / 0x0001), 48000 Hz, stereo, s32 (24 bit), 2304 kb/s
Stream mapping:
  Stream #0:0 -> #0:0 (pcm_s24le (native) -> pcm_s16le (native))
[Parsed_loudnorm_0 @ 0x5581a4c0]
Input Integrated:    -25.2 LUFS
Input True Peak:      -0.5 dBTP
Input LRA:             8.1 LU
Input Threshold:     -35.6 LUFS

Output Integrated:   -23.0 LUFS
Output True Peak:     -2.1 dBTP
Output LRA:            6.9 LU
Output Threshold:    -33.3 LUFS

Normalization Type:   Dynamic
Target Offset:        +0.0 LU
";

const STREAM_LISTING: &str = r#"{"streams":[
    {"index":1,"codec_name":"pcm_s24le","channels":2,"sample_rate":"48000","duration":"2537.040000","tags":{"language":"eng"}},
    {"index":2,"codec_name":"pcm_s24le","channels":2,"sample_rate":"48000","duration":"2537.040000","tags":{"language":"fra"}},
    {"index":3,"codec_name":"ac3","channels":6,"sample_rate":"48000"}
]}"#;

fn benchmark_parse_diagnostics(criterion: &mut Criterion) {
    criterion.bench_function("parse loudnorm diagnostics", |bencher| {
        bencher.iter(|| parse_diagnostics(black_box(FILTER_DIAGNOSTICS)));
    });

    let progress_line = "frame= 1000 fps=250 q=-0.0 size=N/A time=00:00:40.00\n";
    let noisy: String = std::iter::repeat_n(progress_line, 2_000)
        .chain(std::iter::once(FILTER_DIAGNOSTICS))
        .collect();
    criterion.bench_function("parse diagnostics after long progress log", |bencher| {
        bencher.iter(|| parse_diagnostics(black_box(&noisy)));
    });
}

fn benchmark_stream_listing(criterion: &mut Criterion) {
    criterion.bench_function("parse stream listing", |bencher| {
        bencher.iter(|| parse_stream_listing(black_box(STREAM_LISTING.as_bytes())));
    });
}

fn benchmark_classify(criterion: &mut Criterion) {
    let locators = [
        "https://cdn.example.com/promo.mp4",
        "s3://media/masters/show.MXF",
        "https://bucket.s3.amazonaws.com/tape.avi?X-Amz-Signature=deadbeef&X-Amz-Expires=3600",
        "/mnt/archive/unknown.xyz",
    ];
    criterion.bench_function("classify locators", |bencher| {
        bencher.iter(|| {
            for locator in locators {
                black_box(classify(black_box(locator)));
            }
        });
    });
}

criterion::criterion_group!(
    benches,
    benchmark_parse_diagnostics,
    benchmark_stream_listing,
    benchmark_classify,
);
criterion::criterion_main!(benches);
