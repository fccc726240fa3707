//! External tool configuration.
//!
//! All decoding and loudness math happens inside `ffmpeg` and `ffprobe`.
//! This module locates those binaries and maps the crate's
//! [`FfmpegLogLevel`] onto their `-v` argument.
//!
//! # Note
//!
//! The level controls **the tools' own diagnostic output**, not Rust-side
//! messages emitted via the `log` crate. Measurement needs at least
//! [`FfmpegLogLevel::Info`], because the loudness summary is printed at that
//! level.

use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable overriding the `ffmpeg` binary.
pub const FFMPEG_ENV: &str = "LOUDCHECK_FFMPEG";
/// Environment variable overriding the `ffprobe` binary.
pub const FFPROBE_ENV: &str = "LOUDCHECK_FFPROBE";

/// Tool diagnostic verbosity level.
///
/// # Ordering (most verbose → most quiet)
///
/// `Trace` > `Debug` > `Verbose` > `Info` > `Warning` > `Error` > `Fatal` > `Panic` > `Quiet`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Print no output at all.
    Quiet,
    /// Only log conditions the tool cannot recover from and aborts on.
    Panic,
    /// Only log unrecoverable errors.
    Fatal,
    /// Log recoverable errors.
    Error,
    /// Log warnings.
    Warning,
    /// Log informational messages (tool default).
    Info,
    /// Log verbose informational messages.
    Verbose,
    /// Log debugging messages.
    Debug,
    /// Extremely verbose tracing output.
    Trace,
}

impl FfmpegLogLevel {
    /// The value passed after `-v`.
    pub fn as_arg(self) -> &'static str {
        match self {
            FfmpegLogLevel::Quiet => "quiet",
            FfmpegLogLevel::Panic => "panic",
            FfmpegLogLevel::Fatal => "fatal",
            FfmpegLogLevel::Error => "error",
            FfmpegLogLevel::Warning => "warning",
            FfmpegLogLevel::Info => "info",
            FfmpegLogLevel::Verbose => "verbose",
            FfmpegLogLevel::Debug => "debug",
            FfmpegLogLevel::Trace => "trace",
        }
    }

    /// `-v <level>` as an argument pair.
    pub(crate) fn to_args(self) -> [OsString; 2] {
        ["-v".into(), self.as_arg().into()]
    }
}

/// Which external tool an invocation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// The measurement tool.
    Ffmpeg,
    /// The stream-inspection tool.
    Ffprobe,
}

impl Tool {
    /// Short tool name used in errors and logs.
    pub fn name(self) -> &'static str {
        match self {
            Tool::Ffmpeg => "ffmpeg",
            Tool::Ffprobe => "ffprobe",
        }
    }
}

/// Locations of the external binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    /// `ffmpeg` binary.
    pub ffmpeg: PathBuf,
    /// `ffprobe` binary.
    pub ffprobe: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ToolPaths {
    /// Use explicit binary locations.
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Read [`FFMPEG_ENV`] / [`FFPROBE_ENV`], falling back to `ffmpeg` and
    /// `ffprobe` resolved through `PATH`.
    pub fn from_env() -> Self {
        let lookup = |name: &str, fallback: &str| {
            std::env::var_os(name)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(fallback))
        };
        Self {
            ffmpeg: lookup(FFMPEG_ENV, "ffmpeg"),
            ffprobe: lookup(FFPROBE_ENV, "ffprobe"),
        }
    }

    /// The binary for `tool`.
    pub fn program(&self, tool: Tool) -> &PathBuf {
        match tool {
            Tool::Ffmpeg => &self.ffmpeg,
            Tool::Ffprobe => &self.ffprobe,
        }
    }
}
