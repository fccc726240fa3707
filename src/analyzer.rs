//! Source resolution and download fallback.
//!
//! [`Analyzer`] is the main entry point for the crate. For each request it
//! decides whether a remote source can be measured in place, runs the
//! measurement, and, if anything about the remote attempt fails, downloads
//! the source into the staging directory and measures the local copy.
//!
//! ```text
//! local path ──────────────────────────────────────────┐
//!                                                      ▼
//! remote ─▶ classify ─▶ [probe] ─▶ measure URL ─ok─▶ metrics
//!                │          │           │              ▲
//!                └─ no ─────┴─ fail ────┴─▶ download ─▶ measure copy ─▶ delete copy
//! ```
//!
//! A downloaded copy is owned by the request and removed on every exit path.
//!
//! # Example
//!
//! ```no_run
//! use loudcheck::{AnalysisOptions, Analyzer, ComplianceStandard};
//!
//! # async fn example() -> Result<(), loudcheck::LoudnessError> {
//! let analyzer = Analyzer::new(AnalysisOptions::new());
//! let outcome = analyzer.analyze_input("s3://media/promo.mov", None).await?;
//! let report = ComplianceStandard::lookup("ebu-r128")?.evaluate(&outcome.metrics);
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::classifier::{StreamingVerdict, classify};
use crate::config::{AnalysisOptions, StreamingPolicy};
use crate::error::LoudnessError;
use crate::invoker::MeasurementInvoker;
use crate::locator::SourceLocator;
use crate::loudness::LoudnessMetrics;
use crate::probe::RemoteProbe;
use crate::runner::{CommandRunner, SystemRunner};
use crate::staging::StagedFile;
use crate::streams::AudioStreamDescriptor;
use crate::transfer::{DefaultTransfer, Transfer};

/// How the metrics of an [`AnalysisOutcome`] were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// The input was a local file.
    Local,
    /// A remote source was measured in place.
    Streamed,
    /// A remote source was downloaded, measured, and deleted.
    Downloaded,
}

/// Result of one analysis request.
#[derive(Debug, Clone, Serialize)]
#[must_use]
pub struct AnalysisOutcome {
    /// The locator as given.
    pub source: String,
    /// How the metrics were obtained.
    pub strategy: Strategy,
    /// Classifier verdict; `None` for local inputs.
    pub verdict: Option<StreamingVerdict>,
    /// Remote probe result, when the policy required one.
    pub probe_confirmed: Option<bool>,
    /// Why in-place measurement was skipped or abandoned, for downloads.
    pub fallback_reason: Option<String>,
    /// Audio streams, when stream listing was enabled.
    pub streams: Option<Vec<AudioStreamDescriptor>>,
    /// Measured loudness.
    pub metrics: LoudnessMetrics,
}

/// Intermediate state of a remote attempt.
struct RemoteAttempt {
    verdict: StreamingVerdict,
    probe_confirmed: Option<bool>,
}

/// Drives classification, measurement, fallback, and cleanup.
///
/// Generic over the process runner and the remote transfer so both can be
/// replaced; [`Analyzer::new`] uses [`SystemRunner`] and
/// [`DefaultTransfer`].
#[derive(Debug)]
pub struct Analyzer<R = SystemRunner, T = DefaultTransfer> {
    options: AnalysisOptions,
    invoker: MeasurementInvoker<R>,
    transfer: T,
}

impl Analyzer {
    /// Create an analyzer that spawns real processes and uses the default
    /// HTTP/S3 transfer with credentials from the environment.
    pub fn new(options: AnalysisOptions) -> Self {
        Self::with_collaborators(options, SystemRunner, DefaultTransfer::default())
    }
}

impl<R: CommandRunner, T: Transfer> Analyzer<R, T> {
    /// Create an analyzer with explicit collaborators.
    pub fn with_collaborators(options: AnalysisOptions, runner: R, transfer: T) -> Self {
        let invoker = MeasurementInvoker::new(runner, options.tools.clone());
        Self {
            options,
            invoker,
            transfer,
        }
    }

    /// Options in use.
    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Parse `input` as a [`SourceLocator`] and analyze it.
    ///
    /// # Errors
    ///
    /// See [`Analyzer::analyze`]; additionally
    /// [`LoudnessError::InvalidLocator`] for unparseable input.
    pub async fn analyze_input(
        &self,
        input: &str,
        audio_stream_index: Option<u32>,
    ) -> Result<AnalysisOutcome, LoudnessError> {
        let locator = SourceLocator::parse(input)?;
        self.analyze(&locator, audio_stream_index).await
    }

    /// Measure the loudness of `locator`.
    ///
    /// Local inputs are measured directly. Remote inputs are measured in
    /// place when the streaming policy allows it; any failure of that attempt
    /// triggers a download into the staging directory and a local
    /// measurement. The downloaded copy is deleted before this returns.
    ///
    /// # Errors
    ///
    /// - [`LoudnessError::InputNotFound`] for a missing local path (no
    ///   process is spawned).
    /// - [`LoudnessError::IoError`] if the local path cannot be checked, or
    ///   the staged file cannot be created.
    /// - [`LoudnessError::TransferFailed`] if the fallback download fails.
    /// - [`LoudnessError::NoAudioStreams`] /
    ///   [`LoudnessError::AudioStreamOutOfRange`] when stream listing is
    ///   enabled and the local (or downloaded) source fails the check.
    /// - Any [`MeasurementInvoker`] error from the local measurement.
    pub async fn analyze(
        &self,
        locator: &SourceLocator,
        audio_stream_index: Option<u32>,
    ) -> Result<AnalysisOutcome, LoudnessError> {
        let source = locator.to_string();

        if let SourceLocator::Local(path) = locator {
            ensure_exists(path).await?;
            let (streams, metrics) = self.measure_local(path, audio_stream_index).await?;
            return Ok(AnalysisOutcome {
                source,
                strategy: Strategy::Local,
                verdict: None,
                probe_confirmed: None,
                fallback_reason: None,
                streams,
                metrics,
            });
        }

        let mut attempt = RemoteAttempt {
            verdict: classify(&source),
            probe_confirmed: None,
        };
        log::info!(
            "Classified {source} as {} ({} confidence, streamable: {})",
            display_format(&attempt.verdict),
            attempt.verdict.confidence,
            attempt.verdict.can_stream
        );

        let fallback_reason = match self
            .measure_remote(locator, &mut attempt, audio_stream_index)
            .await
        {
            Ok((streams, metrics)) => {
                log::info!("Measured {source} without a local copy");
                return Ok(AnalysisOutcome {
                    source,
                    strategy: Strategy::Streamed,
                    verdict: Some(attempt.verdict),
                    probe_confirmed: attempt.probe_confirmed,
                    fallback_reason: None,
                    streams,
                    metrics,
                });
            }
            Err(reason) => reason,
        };

        log::warn!("Falling back to download for {source}: {fallback_reason}");
        let (streams, metrics) = self
            .with_local_copy(locator, move |path| async move {
                self.measure_local(&path, audio_stream_index).await
            })
            .await?;

        Ok(AnalysisOutcome {
            source,
            strategy: Strategy::Downloaded,
            verdict: Some(attempt.verdict),
            probe_confirmed: attempt.probe_confirmed,
            fallback_reason: Some(fallback_reason),
            streams,
            metrics,
        })
    }

    /// List the audio streams of `locator`.
    ///
    /// Remote sources are inspected in place with the remote probing budget
    /// unless the policy is [`StreamingPolicy::Never`]; on failure they are
    /// downloaded and inspected locally. An empty list is returned as-is.
    ///
    /// # Errors
    ///
    /// Same as [`Analyzer::analyze`], minus the stream checks.
    pub async fn list_streams(
        &self,
        locator: &SourceLocator,
    ) -> Result<Vec<AudioStreamDescriptor>, LoudnessError> {
        if let SourceLocator::Local(path) = locator {
            ensure_exists(path).await?;
            return self
                .invoker
                .list_audio_streams(path, Some(self.options.local_budget))
                .await;
        }

        if self.options.streaming_policy != StreamingPolicy::Never {
            let remote = async {
                let url = self.transfer.stream_url(locator).await?;
                self.invoker
                    .list_audio_streams(url, Some(self.options.remote_budget))
                    .await
            };
            match remote.await {
                Ok(streams) => return Ok(streams),
                Err(error) => {
                    log::warn!("Remote stream listing of {locator} failed, downloading: {error}")
                }
            }
        }

        self.with_local_copy(locator, move |path| async move {
            self.invoker
                .list_audio_streams(path, Some(self.options.local_budget))
                .await
        })
        .await
    }

    /// Probe `url` with the capability budget. Never errors.
    pub async fn probe(&self, url: &str) -> bool {
        RemoteProbe::new(self.invoker.runner(), self.options.tools.clone())
            .probe(url)
            .await
    }

    /// Attempt in-place measurement. `Err` carries the reason to fall back.
    async fn measure_remote(
        &self,
        locator: &SourceLocator,
        attempt: &mut RemoteAttempt,
        audio_stream_index: Option<u32>,
    ) -> Result<(Option<Vec<AudioStreamDescriptor>>, LoudnessMetrics), String> {
        if self.options.streaming_policy == StreamingPolicy::Never {
            return Err("streaming disabled by policy".to_string());
        }
        if !attempt.verdict.can_stream {
            let reason = attempt.verdict.reason.as_deref().unwrap_or("not streamable");
            return Err(format!(
                "format {} is not streamable ({reason})",
                display_format(&attempt.verdict)
            ));
        }

        let url = self
            .transfer
            .stream_url(locator)
            .await
            .map_err(|error| error.to_string())?;

        if self.options.streaming_policy == StreamingPolicy::Verified {
            let confirmed = self.probe(&url).await;
            attempt.probe_confirmed = Some(confirmed);
            if !confirmed {
                return Err("remote probe could not read the source".to_string());
            }
        }

        let streams = if self.options.list_streams {
            let streams = self
                .invoker
                .list_audio_streams(url.as_str(), Some(self.options.remote_budget))
                .await
                .map_err(|error| error.to_string())?;
            check_streams(&streams, audio_stream_index, &locator.to_string())
                .map_err(|error| error.to_string())?;
            Some(streams)
        } else {
            None
        };

        let metrics = self
            .invoker
            .measure(url.as_str(), audio_stream_index)
            .await
            .map_err(|error| error.to_string())?;

        Ok((streams, metrics))
    }

    /// Measure a local file, listing and checking streams first if enabled.
    async fn measure_local(
        &self,
        path: &Path,
        audio_stream_index: Option<u32>,
    ) -> Result<(Option<Vec<AudioStreamDescriptor>>, LoudnessMetrics), LoudnessError> {
        let streams = if self.options.list_streams {
            let streams = self
                .invoker
                .list_audio_streams(path, Some(self.options.local_budget))
                .await?;
            check_streams(&streams, audio_stream_index, &path.display().to_string())?;
            Some(streams)
        } else {
            None
        };

        let metrics = self.invoker.measure(path, audio_stream_index).await?;
        Ok((streams, metrics))
    }

    /// Download `locator` to a staged file, run `operation` on it, and delete
    /// the file whatever the outcome.
    async fn with_local_copy<F, Fut, V>(
        &self,
        locator: &SourceLocator,
        operation: F,
    ) -> Result<V, LoudnessError>
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = Result<V, LoudnessError>>,
    {
        tokio::fs::create_dir_all(&self.options.staging_dir).await?;
        let staged = StagedFile::allocate(&self.options.staging_dir, &locator.basename())?;

        // On transfer failure the guard removes any partial file.
        self.transfer.fetch(locator, staged.path()).await?;

        let result = operation(staged.path().to_path_buf()).await;
        let path = staged.path().display().to_string();
        if let Err(error) = staged.close() {
            log::warn!("Failed to remove staged file {path}: {error}");
        }
        result
    }
}

/// Check a stream listing against the requested stream.
fn check_streams(
    streams: &[AudioStreamDescriptor],
    audio_stream_index: Option<u32>,
    source_name: &str,
) -> Result<(), LoudnessError> {
    if streams.is_empty() {
        return Err(LoudnessError::NoAudioStreams {
            source_name: source_name.to_string(),
        });
    }
    if let Some(index) = audio_stream_index {
        if index as usize >= streams.len() {
            return Err(LoudnessError::AudioStreamOutOfRange {
                stream_index: index,
                stream_count: streams.len(),
            });
        }
    }
    Ok(())
}

async fn ensure_exists(path: &Path) -> Result<(), LoudnessError> {
    if tokio::fs::try_exists(path).await? {
        Ok(())
    } else {
        Err(LoudnessError::InputNotFound {
            path: path.to_path_buf(),
        })
    }
}

fn display_format(verdict: &StreamingVerdict) -> &str {
    if verdict.format.is_empty() {
        "<none>"
    } else {
        &verdict.format
    }
}
