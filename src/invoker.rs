//! Measurement and stream-listing invocations.
//!
//! [`MeasurementInvoker`] builds the `ffprobe` and `ffmpeg` command lines for
//! one source (a local path or a remote URL, never both), runs them through a
//! [`CommandRunner`], and interprets the results. It never retries; fallback
//! policy lives in [`Analyzer`](crate::Analyzer).
//!
//! Measurement uses the loudness-normalization filter in analysis-only mode:
//! the audio is decoded, measured, and discarded (`-f null -`). The filter's
//! targets (`I=-23`, `TP=-1`, `LRA=7`) only shape its analysis pass and are
//! unrelated to the compliance standard applied afterwards.

use std::ffi::OsString;

use crate::config::ProbeBudget;
use crate::error::LoudnessError;
use crate::loudness::{LoudnessMetrics, parse_diagnostics};
use crate::runner::{CommandRunner, Invocation};
use crate::streams::{AudioStreamDescriptor, parse_stream_listing};
use crate::tools::{FfmpegLogLevel, Tool, ToolPaths};

/// Analysis-pass filter argument for the measurement tool.
pub const LOUDNORM_ANALYSIS_FILTER: &str = "loudnorm=I=-23:TP=-1:LRA=7:print_format=summary";

/// Runs the external tools against a single source.
#[derive(Debug, Clone)]
pub struct MeasurementInvoker<R> {
    runner: R,
    tools: ToolPaths,
}

impl<R: CommandRunner> MeasurementInvoker<R> {
    /// Create an invoker spawning processes through `runner`.
    pub fn new(runner: R, tools: ToolPaths) -> Self {
        Self { runner, tools }
    }

    /// The runner this invoker spawns through.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Build the stream-listing invocation.
    ///
    /// `source` is passed to the tool verbatim after `-i`, so it may be a
    /// path or a URL, and a leading dash is not read as an option.
    pub fn stream_listing_invocation(
        &self,
        source: impl Into<OsString>,
        budget: Option<ProbeBudget>,
    ) -> Invocation {
        let source = source.into();
        let mut args = Vec::from(FfmpegLogLevel::Quiet.to_args());
        args.extend(["-print_format".into(), "json".into(), "-show_streams".into()]);
        args.extend(["-select_streams".into(), "a".into()]);
        if let Some(budget) = budget {
            args.extend(budget.to_args());
        }
        args.extend(["-i".into(), source.clone()]);

        Invocation {
            tool: Tool::Ffprobe,
            program: self.tools.program(Tool::Ffprobe).clone(),
            args,
            input: source,
            timeout: None,
        }
    }

    /// Build the measurement invocation.
    ///
    /// With `audio_stream_index`, only that audio stream (`0:a:<N>`) is
    /// analyzed; otherwise the tool picks its default audio stream.
    pub fn measurement_invocation(
        &self,
        source: impl Into<OsString>,
        audio_stream_index: Option<u32>,
    ) -> Invocation {
        let source = source.into();
        let mut args: Vec<OsString> = vec!["-hide_banner".into(), "-nostats".into()];
        args.extend(FfmpegLogLevel::Info.to_args());
        args.extend(["-i".into(), source.clone()]);
        if let Some(index) = audio_stream_index {
            args.extend(["-map".into(), format!("0:a:{index}").into()]);
        }
        args.extend(["-af".into(), LOUDNORM_ANALYSIS_FILTER.into()]);
        args.extend(["-f".into(), "null".into(), "-".into()]);

        Invocation {
            tool: Tool::Ffmpeg,
            program: self.tools.program(Tool::Ffmpeg).clone(),
            args,
            input: source,
            timeout: None,
        }
    }

    /// List the audio streams of `source`, in container order.
    ///
    /// # Errors
    ///
    /// - [`LoudnessError::ToolUnavailable`] if `ffprobe` cannot be spawned.
    /// - [`LoudnessError::MeasurementFailed`] if it exits unsuccessfully.
    /// - [`LoudnessError::MalformedToolOutput`] if its JSON cannot be read.
    pub async fn list_audio_streams(
        &self,
        source: impl Into<OsString>,
        budget: Option<ProbeBudget>,
    ) -> Result<Vec<AudioStreamDescriptor>, LoudnessError> {
        let invocation = self.stream_listing_invocation(source, budget);
        log::debug!("Listing audio streams: {}", invocation.display_command());

        let output = self.runner.run(&invocation).await?;
        if !output.success {
            return Err(LoudnessError::MeasurementFailed {
                exit_code: output.exit_code,
                diagnostics: output.stderr,
            });
        }

        let streams = parse_stream_listing(&output.stdout)?;
        log::debug!(
            "Found {} audio stream(s) in {}",
            streams.len(),
            invocation.input.to_string_lossy()
        );
        Ok(streams)
    }

    /// Measure loudness of `source`.
    ///
    /// # Errors
    ///
    /// - [`LoudnessError::ToolUnavailable`] if `ffmpeg` cannot be spawned.
    /// - [`LoudnessError::MeasurementFailed`] with the exit code and full
    ///   diagnostics if it exits unsuccessfully.
    pub async fn measure(
        &self,
        source: impl Into<OsString>,
        audio_stream_index: Option<u32>,
    ) -> Result<LoudnessMetrics, LoudnessError> {
        let invocation = self.measurement_invocation(source, audio_stream_index);
        log::debug!("Measuring loudness: {}", invocation.display_command());

        let output = self.runner.run(&invocation).await?;
        if !output.success {
            return Err(LoudnessError::MeasurementFailed {
                exit_code: output.exit_code,
                diagnostics: output.stderr,
            });
        }

        let metrics = parse_diagnostics(&output.stderr);
        log::debug!(
            "Measured {}: I={} LUFS, LRA={} LU, TP={} dBTP",
            invocation.input.to_string_lossy(),
            metrics.integrated_loudness,
            metrics.loudness_range,
            metrics.true_peak_max
        );
        Ok(metrics)
    }
}
