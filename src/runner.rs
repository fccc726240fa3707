//! External process execution.
//!
//! Every call into `ffmpeg`/`ffprobe` goes through a [`CommandRunner`]. The
//! default [`SystemRunner`] spawns a Tokio child process, drains stdout and
//! stderr concurrently, and buffers both in full until the process exits.
//! The caller suspends until then; no two processes run concurrently within
//! one analysis.
//!
//! An [`Invocation`] may carry a hard timeout. When it expires the child is
//! killed and the returned [`ToolOutput`] is marked as timed out.

use std::ffi::{OsStr, OsString};
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;

use crate::error::LoudnessError;
use crate::tools::Tool;

/// A fully built external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Which tool this is.
    pub tool: Tool,
    /// Binary to spawn.
    pub program: PathBuf,
    /// Arguments, in order. The input locator appears among them.
    pub args: Vec<OsString>,
    /// The single input (local path or remote URL) this invocation reads.
    pub input: OsString,
    /// Hard limit after which the child is killed.
    pub timeout: Option<Duration>,
}

impl Invocation {
    /// Returns `true` if the input is a URL rather than a local path.
    pub fn is_remote(&self) -> bool {
        self.input.to_string_lossy().contains("://")
    }

    /// Returns `true` if `arg` appears verbatim among the arguments.
    pub fn has_arg(&self, arg: impl AsRef<OsStr>) -> bool {
        let arg = arg.as_ref();
        self.args.iter().any(|candidate| candidate == arg)
    }

    /// The argument following `flag`, if present.
    pub fn arg_value(&self, flag: impl AsRef<OsStr>) -> Option<&OsStr> {
        let flag = flag.as_ref();
        self.args
            .iter()
            .position(|candidate| candidate == flag)
            .and_then(|position| self.args.get(position + 1))
            .map(OsString::as_os_str)
    }

    /// Command line rendered for logs.
    pub fn display_command(&self) -> String {
        let mut rendered = self.program.display().to_string();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(&arg.to_string_lossy());
        }
        rendered
    }
}

/// Buffered result of a finished (or killed) process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code; `None` if killed by a signal or by the timeout.
    pub exit_code: Option<i32>,
    /// Whether the process exited with status 0.
    pub success: bool,
    /// Raw standard output.
    pub stdout: Vec<u8>,
    /// Standard error decoded lossily as UTF-8.
    pub stderr: String,
    /// Whether the process was killed because its timeout expired.
    pub timed_out: bool,
}

impl ToolOutput {
    /// A successful exit with the given output.
    pub fn success(stdout: impl Into<Vec<u8>>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: stderr.into(),
            timed_out: false,
        }
    }

    /// A non-zero exit with the given diagnostics.
    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            success: false,
            stdout: Vec::new(),
            stderr: stderr.into(),
            timed_out: false,
        }
    }

    /// A process killed after its timeout.
    pub fn timed_out() -> Self {
        Self {
            timed_out: true,
            ..Self::default()
        }
    }
}

/// Runs [`Invocation`]s.
///
/// Implementations must return [`LoudnessError::ToolUnavailable`] when the
/// program cannot be spawned and otherwise report the exit status through
/// [`ToolOutput`] without interpreting it.
pub trait CommandRunner: Send + Sync {
    /// Run the invocation to completion (or until its timeout).
    fn run(
        &self,
        invocation: &Invocation,
    ) -> impl Future<Output = Result<ToolOutput, LoudnessError>> + Send;
}

impl<R: CommandRunner> CommandRunner for &R {
    fn run(
        &self,
        invocation: &Invocation,
    ) -> impl Future<Output = Result<ToolOutput, LoudnessError>> + Send {
        (**self).run(invocation)
    }
}

impl<R: CommandRunner> CommandRunner for Arc<R> {
    fn run(
        &self,
        invocation: &Invocation,
    ) -> impl Future<Output = Result<ToolOutput, LoudnessError>> + Send {
        (**self).run(invocation)
    }
}

/// Spawns real child processes through Tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ToolOutput, LoudnessError> {
        log::debug!("Spawning {}", invocation.display_command());

        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|error| LoudnessError::ToolUnavailable {
                tool: invocation.tool.name(),
                program: invocation.program.clone(),
                reason: error.to_string(),
            })?;

        // Dropping the wait future drops the child, which kills it.
        let output = match invocation.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result?,
                Err(_) => {
                    log::warn!(
                        "{} exceeded {:?} and was killed",
                        invocation.tool.name(),
                        limit
                    );
                    return Ok(ToolOutput::timed_out());
                }
            },
            None => child.wait_with_output().await?,
        };

        log::debug!(
            "{} exited with {:?} ({} bytes stdout, {} bytes stderr)",
            invocation.tool.name(),
            output.status.code(),
            output.stdout.len(),
            output.stderr.len()
        );

        Ok(ToolOutput {
            exit_code: output.status.code(),
            success: output.status.success(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            timed_out: false,
        })
    }
}
