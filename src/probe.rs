//! Remote streamability probing.
//!
//! [`RemoteProbe`] empirically checks whether the stream-inspection tool can
//! read a URL, complementing the extension-based
//! [`classify`](crate::classify) heuristic. The check reads at most one
//! second of media and one mebibyte of data, and the tool is killed after ten
//! seconds.
//!
//! # Example
//!
//! ```no_run
//! use loudcheck::{RemoteProbe, SystemRunner, ToolPaths};
//!
//! # async fn example() {
//! let probe = RemoteProbe::new(SystemRunner, ToolPaths::from_env());
//! if probe.probe("https://cdn.example.com/promo.mp4").await {
//!     println!("streamable");
//! }
//! # }
//! ```

use std::time::Duration;

use crate::config::ProbeBudget;
use crate::runner::{CommandRunner, Invocation};
use crate::tools::{FfmpegLogLevel, Tool, ToolPaths};

/// Hard limit on a single capability probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounded capability test against a remote URL.
#[derive(Debug, Clone)]
pub struct RemoteProbe<R> {
    runner: R,
    tools: ToolPaths,
}

impl<R: CommandRunner> RemoteProbe<R> {
    /// Create a probe using `runner` to spawn the stream-inspection tool.
    pub fn new(runner: R, tools: ToolPaths) -> Self {
        Self { runner, tools }
    }

    /// Build the capability-probe invocation for `url`.
    pub fn invocation(&self, url: &str) -> Invocation {
        let mut args = Vec::from(FfmpegLogLevel::Quiet.to_args());
        args.extend(["-print_format".into(), "json".into()]);
        args.extend(["-show_format".into(), "-show_streams".into()]);
        args.extend(ProbeBudget::capability_probe().to_args());
        args.extend(["-i".into(), url.into()]);

        Invocation {
            tool: Tool::Ffprobe,
            program: self.tools.program(Tool::Ffprobe).clone(),
            args,
            input: url.into(),
            timeout: Some(PROBE_TIMEOUT),
        }
    }

    /// Returns `true` iff the tool exits with status 0 and wrote at least one
    /// byte to stdout. Spawn failures, non-zero exits, and timeouts yield
    /// `false`; this never errors.
    pub async fn probe(&self, url: &str) -> bool {
        let invocation = self.invocation(url);
        match self.runner.run(&invocation).await {
            Ok(output) if output.timed_out => {
                log::info!("Remote probe of {url} timed out after {PROBE_TIMEOUT:?}");
                false
            }
            Ok(output) => {
                let reachable = output.success && !output.stdout.is_empty();
                log::debug!(
                    "Remote probe of {url}: exit {:?}, {} bytes -> {}",
                    output.exit_code,
                    output.stdout.len(),
                    reachable
                );
                reachable
            }
            Err(error) => {
                log::warn!("Remote probe of {url} could not run: {error}");
                false
            }
        }
    }
}
