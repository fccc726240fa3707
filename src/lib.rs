//! # loudcheck
//!
//! EBU R128 loudness compliance analysis for local files and remote
//! (HTTP/S3) media, measured in place whenever possible.
//!
//! `loudcheck` does not decode audio or compute loudness itself. It drives
//! `ffprobe` and `ffmpeg`, decides per source whether a remote object can be
//! measured without a local copy, falls back to a download when it cannot,
//! and turns the tool's diagnostic text into structured
//! [`LoudnessMetrics`].
//!
//! ## Quick Start
//!
//! ### Analyze a File
//!
//! ```no_run
//! use loudcheck::{AnalysisOptions, Analyzer};
//!
//! # async fn example() -> Result<(), loudcheck::LoudnessError> {
//! let analyzer = Analyzer::new(AnalysisOptions::new());
//! let outcome = analyzer.analyze_input("programme.mxf", None).await?;
//! println!("{:.1} LUFS", outcome.metrics.integrated_loudness);
//! # Ok(())
//! # }
//! ```
//!
//! ### Check Compliance
//!
//! ```no_run
//! use loudcheck::{AnalysisOptions, Analyzer, ComplianceStandard, StreamingPolicy};
//!
//! # async fn example() -> Result<(), loudcheck::LoudnessError> {
//! let options = AnalysisOptions::new().with_streaming_policy(StreamingPolicy::Verified);
//! let analyzer = Analyzer::new(options);
//! let outcome = analyzer
//!     .analyze_input("https://cdn.example.com/promo.mp4", Some(0))
//!     .await?;
//! let report = ComplianceStandard::lookup("ebu-r128")?.evaluate(&outcome.metrics);
//! print!("{report}");
//! # Ok(())
//! # }
//! ```
//!
//! ### Classify Without Running Anything
//!
//! ```
//! use loudcheck::classify;
//!
//! let verdict = classify("s3://archive/tape-0412.avi");
//! assert!(!verdict.can_stream);
//! assert_eq!(verdict.reason.as_deref(), Some("index usually at end"));
//! ```
//!
//! ## Features
//!
//! - **Format classification**: extension-based streamability verdicts with
//!   confidence tiers, presigned-URL aware
//! - **Remote probing**: bounded (10 s, 1 s / 1 MiB) capability checks
//! - **Stream listing**: audio stream metadata with probing budgets
//! - **Measurement**: loudness-normalization filter in analysis-only mode,
//!   with per-stream selection
//! - **Dual-vocabulary parsing**: summary and filter label sets
//! - **Download fallback**: staged copies deleted on every exit path
//! - **Compliance**: EBU R128, EBU R128 s1, ATSC A/85, streaming targets
//!
//! ## Requirements
//!
//! `ffmpeg` and `ffprobe` must be installed (or pointed to with
//! `LOUDCHECK_FFMPEG` / `LOUDCHECK_FFPROBE`). `s3://` sources additionally
//! need the `aws` command-line client.

pub mod analyzer;
pub mod classifier;
pub mod compliance;
pub mod config;
pub mod error;
pub mod invoker;
pub mod locator;
pub mod loudness;
pub mod probe;
pub mod runner;
pub mod staging;
pub mod streams;
pub mod tools;
pub mod transfer;

pub use analyzer::{AnalysisOutcome, Analyzer, Strategy};
pub use classifier::{Confidence, StreamingVerdict, classify, known_formats};
pub use compliance::{ComplianceReport, ComplianceStandard, STANDARDS};
pub use config::{AnalysisOptions, ProbeBudget, StreamingPolicy};
pub use error::LoudnessError;
pub use invoker::{LOUDNORM_ANALYSIS_FILTER, MeasurementInvoker};
pub use locator::{MAX_BASENAME_BYTES, RemoteKind, SourceLocator};
pub use loudness::{LoudnessMetrics, parse_diagnostics};
pub use probe::{PROBE_TIMEOUT, RemoteProbe};
pub use runner::{CommandRunner, Invocation, SystemRunner, ToolOutput};
pub use staging::StagedFile;
pub use streams::{AudioStreamDescriptor, parse_stream_listing};
pub use tools::{FfmpegLogLevel, Tool, ToolPaths};
pub use transfer::{DefaultTransfer, S3Credentials, Transfer};
