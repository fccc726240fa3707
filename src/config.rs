//! Analysis configuration.
//!
//! [`AnalysisOptions`] is a builder that threads tool locations, the
//! streaming policy, the staging directory, and probing budgets through an
//! [`Analyzer`](crate::Analyzer) without polluting every method signature.
//!
//! # Example
//!
//! ```no_run
//! use loudcheck::{AnalysisOptions, StreamingPolicy};
//!
//! let options = AnalysisOptions::new()
//!     .with_streaming_policy(StreamingPolicy::Verified)
//!     .with_staging_dir("/var/tmp/loudcheck")
//!     .with_stream_listing(true);
//! ```

use std::ffi::OsString;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::tools::ToolPaths;

/// When the analyzer may read a remote source directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamingPolicy {
    /// Stream whenever the format classifier says the format is streamable.
    #[default]
    Heuristic,
    /// Stream only when the classifier says streamable **and** a remote
    /// probe succeeds.
    Verified,
    /// Always download remote sources first.
    Never,
}

impl StreamingPolicy {
    /// Parse a policy name as accepted on the command line.
    pub fn from_name(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "heuristic" | "auto" => Some(StreamingPolicy::Heuristic),
            "verified" | "probe" => Some(StreamingPolicy::Verified),
            "never" | "download" | "off" => Some(StreamingPolicy::Never),
            _ => None,
        }
    }
}

/// How much input the stream-inspection tool may read before answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProbeBudget {
    /// `-analyzeduration`, in microseconds.
    pub analyze_duration_us: Option<u64>,
    /// `-probesize`, in bytes.
    pub probe_size_bytes: Option<u64>,
    /// I/O timeout passed to the tool (`-timeout`, microseconds).
    pub io_timeout: Option<Duration>,
}

impl ProbeBudget {
    /// The tool's own defaults; suited to local files.
    pub fn local() -> Self {
        Self::default()
    }

    /// Larger budget for remote sources: 5 s analysis, 5 MiB probe.
    pub fn remote() -> Self {
        Self {
            analyze_duration_us: Some(5_000_000),
            probe_size_bytes: Some(5 * 1024 * 1024),
            io_timeout: None,
        }
    }

    /// Minimal budget for capability probes: 1 s analysis, 1 MiB probe.
    pub fn capability_probe() -> Self {
        Self {
            analyze_duration_us: Some(1_000_000),
            probe_size_bytes: Some(1024 * 1024),
            io_timeout: None,
        }
    }

    /// Set the I/O timeout.
    #[must_use]
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = Some(timeout);
        self
    }

    /// Render as tool arguments, omitting unset limits.
    pub(crate) fn to_args(self) -> Vec<OsString> {
        let mut args = Vec::new();
        if let Some(duration) = self.analyze_duration_us {
            args.push("-analyzeduration".into());
            args.push(duration.to_string().into());
        }
        if let Some(size) = self.probe_size_bytes {
            args.push("-probesize".into());
            args.push(size.to_string().into());
        }
        if let Some(timeout) = self.io_timeout {
            args.push("-timeout".into());
            args.push(timeout.as_micros().to_string().into());
        }
        args
    }
}

/// Configuration for analysis operations.
///
/// All fields have sensible defaults: tools from `PATH` (or the
/// `LOUDCHECK_FFMPEG`/`LOUDCHECK_FFPROBE` environment variables), the system
/// temporary directory for staging, heuristic streaming, and no stream
/// listing.
#[derive(Clone)]
pub struct AnalysisOptions {
    pub(crate) tools: ToolPaths,
    pub(crate) staging_dir: PathBuf,
    pub(crate) streaming_policy: StreamingPolicy,
    pub(crate) list_streams: bool,
    pub(crate) remote_budget: ProbeBudget,
    pub(crate) local_budget: ProbeBudget,
}

impl Debug for AnalysisOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AnalysisOptions")
            .field("ffmpeg", &self.tools.ffmpeg)
            .field("ffprobe", &self.tools.ffprobe)
            .field("staging_dir", &self.staging_dir)
            .field("streaming_policy", &self.streaming_policy)
            .field("list_streams", &self.list_streams)
            .finish_non_exhaustive()
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            tools: ToolPaths::from_env(),
            staging_dir: std::env::temp_dir(),
            streaming_policy: StreamingPolicy::default(),
            list_streams: false,
            remote_budget: ProbeBudget::remote(),
            local_budget: ProbeBudget::local(),
        }
    }

    /// Set the `ffmpeg`/`ffprobe` locations.
    #[must_use]
    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    /// Set the directory fallback downloads are staged in.
    #[must_use]
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    /// Set when remote sources may be streamed.
    #[must_use]
    pub fn with_streaming_policy(mut self, policy: StreamingPolicy) -> Self {
        self.streaming_policy = policy;
        self
    }

    /// List audio streams before measuring.
    ///
    /// Enables the [`LoudnessError::NoAudioStreams`](crate::LoudnessError::NoAudioStreams)
    /// check and stream index validation, at the cost of one extra process.
    #[must_use]
    pub fn with_stream_listing(mut self, enabled: bool) -> Self {
        self.list_streams = enabled;
        self
    }

    /// Override the budget used when listing streams of remote sources.
    #[must_use]
    pub fn with_remote_budget(mut self, budget: ProbeBudget) -> Self {
        self.remote_budget = budget;
        self
    }

    /// Override the budget used when listing streams of local files.
    #[must_use]
    pub fn with_local_budget(mut self, budget: ProbeBudget) -> Self {
        self.local_budget = budget;
        self
    }

    /// Tool locations in use.
    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    /// Staging directory in use.
    pub fn staging_dir(&self) -> &PathBuf {
        &self.staging_dir
    }

    /// Streaming policy in use.
    pub fn streaming_policy(&self) -> StreamingPolicy {
        self.streaming_policy
    }
}
