//! AnalysisOptions, ProbeBudget, ToolPaths, S3Credentials, and staging tests.

use std::collections::HashMap;
use std::time::Duration;

use loudcheck::{
    AnalysisOptions, FfmpegLogLevel, ProbeBudget, S3Credentials, StagedFile, StreamingPolicy,
    Tool, ToolPaths,
};

// ── AnalysisOptions builder ──────────────────────────────────────

#[test]
fn options_defaults() {
    let options = AnalysisOptions::new();
    assert_eq!(options.streaming_policy(), StreamingPolicy::Heuristic);
    assert_eq!(options.staging_dir(), &std::env::temp_dir());

    let debug = format!("{options:?}");
    assert!(debug.contains("AnalysisOptions"));
    assert!(debug.contains("list_streams: false"));
}

#[test]
fn options_builders() {
    let options = AnalysisOptions::new()
        .with_staging_dir("/scratch/loudcheck")
        .with_streaming_policy(StreamingPolicy::Never)
        .with_stream_listing(true)
        .with_tools(ToolPaths::new("ff", "fp"));

    assert_eq!(options.staging_dir().to_str(), Some("/scratch/loudcheck"));
    assert_eq!(options.streaming_policy(), StreamingPolicy::Never);
    assert_eq!(options.tools().program(Tool::Ffprobe).to_str(), Some("fp"));
    assert!(format!("{options:?}").contains("list_streams: true"));
}

#[test]
fn streaming_policy_names() {
    assert_eq!(StreamingPolicy::from_name("heuristic"), Some(StreamingPolicy::Heuristic));
    assert_eq!(StreamingPolicy::from_name("AUTO"), Some(StreamingPolicy::Heuristic));
    assert_eq!(StreamingPolicy::from_name("verified"), Some(StreamingPolicy::Verified));
    assert_eq!(StreamingPolicy::from_name("probe"), Some(StreamingPolicy::Verified));
    assert_eq!(StreamingPolicy::from_name("never"), Some(StreamingPolicy::Never));
    assert_eq!(StreamingPolicy::from_name("download"), Some(StreamingPolicy::Never));
    assert_eq!(StreamingPolicy::from_name("sometimes"), None);
}

// ── Probe budgets ────────────────────────────────────────────────

#[test]
fn budget_presets() {
    assert_eq!(ProbeBudget::local(), ProbeBudget::default());

    let remote = ProbeBudget::remote();
    assert_eq!(remote.analyze_duration_us, Some(5_000_000));
    assert_eq!(remote.probe_size_bytes, Some(5 * 1024 * 1024));

    let capability = ProbeBudget::capability_probe();
    assert_eq!(capability.analyze_duration_us, Some(1_000_000));
    assert_eq!(capability.probe_size_bytes, Some(1024 * 1024));

    let bounded = capability.with_io_timeout(Duration::from_secs(3));
    assert_eq!(bounded.io_timeout, Some(Duration::from_secs(3)));
}

// ── Tools ────────────────────────────────────────────────────────

#[test]
fn tool_paths() {
    let tools = ToolPaths::new("/usr/local/bin/ffmpeg", "/usr/local/bin/ffprobe");
    assert_eq!(
        tools.program(Tool::Ffmpeg).to_str(),
        Some("/usr/local/bin/ffmpeg")
    );
    assert_eq!(Tool::Ffmpeg.name(), "ffmpeg");
    assert_eq!(Tool::Ffprobe.name(), "ffprobe");
}

#[test]
fn log_levels() {
    assert_eq!(FfmpegLogLevel::Quiet.as_arg(), "quiet");
    assert_eq!(FfmpegLogLevel::Info.as_arg(), "info");
    assert_eq!(FfmpegLogLevel::Warning.as_arg(), "warning");
}

// ── S3 credentials ───────────────────────────────────────────────

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    move |name: &str| map.get(name).cloned()
}

#[test]
fn s3_names_take_priority() {
    let credentials = S3Credentials::from_lookup(lookup(&[
        ("S3_ACCESS_KEY_ID", "s3-key"),
        ("AWS_ACCESS_KEY_ID", "aws-key"),
        ("AWS_SECRET_ACCESS_KEY", "aws-secret"),
        ("AWS_REGION", "eu-west-1"),
        ("S3_ENDPOINT_URL", "https://minio.internal:9000"),
    ]));

    assert_eq!(credentials.access_key_id.as_deref(), Some("s3-key"));
    assert_eq!(credentials.secret_access_key.as_deref(), Some("aws-secret"));
    assert_eq!(credentials.region.as_deref(), Some("eu-west-1"));
    assert_eq!(
        credentials.endpoint_url.as_deref(),
        Some("https://minio.internal:9000")
    );
    assert_eq!(credentials.session_token, None);
}

#[test]
fn empty_values_count_as_unset() {
    let credentials = S3Credentials::from_lookup(lookup(&[
        ("S3_REGION", ""),
        ("AWS_REGION", "us-east-2"),
    ]));
    assert_eq!(credentials.region.as_deref(), Some("us-east-2"));
}

#[test]
fn credentials_debug_redacts_secrets() {
    let credentials = S3Credentials::from_lookup(lookup(&[
        ("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE"),
        ("AWS_SECRET_ACCESS_KEY", "wJalrXUtnFEMI"),
        ("AWS_SESSION_TOKEN", "FwoGZXIvYXdzEJr"),
    ]));
    let debug = format!("{credentials:?}");
    assert!(debug.contains("AKIAEXAMPLE"));
    assert!(!debug.contains("wJalrXUtnFEMI"));
    assert!(!debug.contains("FwoGZXIvYXdzEJr"));
    assert!(debug.contains("has_secret_access_key: true"));
}

// ── Staged files ─────────────────────────────────────────────────

#[test]
fn staged_names_are_unique_and_keep_basename() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let first = StagedFile::allocate(directory.path(), "show.mov").expect("Failed to stage file");
    let second = StagedFile::allocate(directory.path(), "show.mov").expect("Failed to stage file");

    assert_ne!(first.path(), second.path());
    assert!(first.path().starts_with(directory.path()));
    assert!(first.path().to_string_lossy().ends_with("_show.mov"));
    assert_eq!(
        std::fs::metadata(first.path()).expect("Staged file should exist").len(),
        0
    );
}

#[test]
fn staged_file_is_removed_on_drop() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let staged = StagedFile::allocate(directory.path(), "clip.avi").expect("Failed to stage file");
    std::fs::write(staged.path(), b"partial").expect("Failed to write staged file");
    let path = staged.path().to_path_buf();

    drop(staged);
    assert!(!path.exists());
}

#[test]
fn closing_staged_file_removes_it() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let staged =
        StagedFile::allocate(directory.path(), "never-written.wav").expect("Failed to stage file");
    staged.close().expect("Failed to remove staged file");
    assert_eq!(std::fs::read_dir(directory.path()).unwrap().count(), 0);
}

#[test]
fn staging_into_missing_directory_fails() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let missing = directory.path().join("not-created");
    assert!(StagedFile::allocate(&missing, "show.mov").is_err());
}
