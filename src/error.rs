//! Error types for the `loudcheck` crate.
//!
//! This module defines [`LoudnessError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context (paths,
//! tool names, exit codes, captured diagnostics) to explain a failure without
//! additional logging at the call site.
//!
//! Classification and diagnostic parsing never fail; only process
//! invocation, transfer, and lookup operations produce these errors.

use std::{io::Error as IoError, path::PathBuf};

use thiserror::Error;

/// The unified error type for all `loudcheck` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoudnessError {
    /// A local input path does not exist. Raised before any process is
    /// spawned.
    #[error("Input not found: {}", path.display())]
    InputNotFound {
        /// The path that was checked.
        path: PathBuf,
    },

    /// An external tool could not be started (missing binary, permissions).
    #[error("Failed to start {tool} ({}): {reason}", program.display())]
    ToolUnavailable {
        /// Short tool name (`"ffmpeg"` or `"ffprobe"`).
        tool: &'static str,
        /// The program that was spawned.
        program: PathBuf,
        /// Underlying spawn error.
        reason: String,
    },

    /// The measurement tool exited unsuccessfully.
    ///
    /// `exit_code` is `None` when the process was terminated by a signal.
    #[error("Measurement failed (exit code {}): {}", display_code(*exit_code), last_line(diagnostics))]
    MeasurementFailed {
        /// Process exit code, if any.
        exit_code: Option<i32>,
        /// Full diagnostic text captured from the tool's error channel.
        diagnostics: String,
    },

    /// The stream-inspection tool produced output that is not the expected
    /// JSON document.
    #[error("Malformed {tool} output: {reason}")]
    MalformedToolOutput {
        /// Short tool name.
        tool: &'static str,
        /// What was wrong with the output.
        reason: String,
    },

    /// The container has no audio streams.
    #[error("No audio stream found in {source_name}")]
    NoAudioStreams {
        /// Locator of the inspected source.
        source_name: String,
    },

    /// Acquiring a local copy of a remote source failed. Any partial file
    /// has already been removed when this error is observed.
    #[error("Transfer of {locator} failed: {reason}")]
    TransferFailed {
        /// The remote locator being fetched.
        locator: String,
        /// Underlying reason.
        reason: String,
    },

    /// The requested audio stream does not exist in the source.
    #[error("Audio stream {stream_index} is out of range (source has {stream_count} audio streams)")]
    AudioStreamOutOfRange {
        /// Requested audio stream position (`0:a:<N>`).
        stream_index: u32,
        /// Number of audio streams found.
        stream_count: usize,
    },

    /// The named compliance standard is not in the threshold table.
    #[error("Unknown compliance standard: {0}")]
    UnknownStandard(String),

    /// The locator could not be interpreted (e.g. `s3://` without a key).
    #[error("Invalid source locator {locator}: {reason}")]
    InvalidLocator {
        /// The rejected locator.
        locator: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An I/O error occurred while preparing or removing staged files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),
}

fn display_code(code: Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |code| code.to_string())
}

fn last_line(diagnostics: &str) -> &str {
    diagnostics
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no diagnostic output")
}
