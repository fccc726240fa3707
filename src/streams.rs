//! Audio stream metadata.
//!
//! [`AudioStreamDescriptor`] describes one audio stream discovered in a
//! container. Descriptors are produced from the stream-inspection tool's
//! JSON output by [`parse_stream_listing`], in the container's stream order.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::error::LoudnessError;

/// Placeholder for sample rate and duration fields the tool did not report.
pub const UNKNOWN: &str = "unknown";

/// Metadata for one audio stream.
///
/// `index` is the container-native stream index, not the position in the
/// listing. Use the listing position with `0:a:<N>` stream selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[must_use]
pub struct AudioStreamDescriptor {
    /// Container-native stream index.
    pub index: u32,
    /// Codec name (e.g. `"aac"`, `"pcm_s24le"`).
    pub codec_name: String,
    /// Channel count, `0` if unreported.
    pub channels: u32,
    /// Sample rate in hertz as reported, or `"unknown"`.
    pub sample_rate: String,
    /// Duration in seconds as reported, or `"unknown"`.
    pub duration: String,
    /// Language tag, if present.
    pub language: Option<String>,
    /// Stream title, if present.
    pub title: Option<String>,
}

impl Display for AudioStreamDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "#{} {} {} ch @ {} Hz, {} s",
            self.index, self.codec_name, self.channels, self.sample_rate, self.duration
        )?;
        if let Some(language) = &self.language {
            write!(f, " [{language}]")?;
        }
        if let Some(title) = &self.title {
            write!(f, " \"{title}\"")?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ProbeDocument {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    index: u32,
    #[serde(default)]
    codec_name: Option<String>,
    #[serde(default)]
    channels: Option<u32>,
    #[serde(default)]
    sample_rate: Option<String>,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    tags: Option<ProbeTags>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeTags {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl From<ProbeStream> for AudioStreamDescriptor {
    fn from(stream: ProbeStream) -> Self {
        let tags = stream.tags.unwrap_or_default();
        Self {
            index: stream.index,
            codec_name: stream.codec_name.unwrap_or_else(|| UNKNOWN.to_string()),
            channels: stream.channels.unwrap_or(0),
            sample_rate: stream.sample_rate.unwrap_or_else(|| UNKNOWN.to_string()),
            duration: stream.duration.unwrap_or_else(|| UNKNOWN.to_string()),
            language: tags.language,
            title: tags.title,
        }
    }
}

/// Parse `ffprobe -print_format json -show_streams` output.
///
/// Missing per-stream fields fall back to defaults; a missing `streams`
/// array means no streams.
///
/// # Errors
///
/// Returns [`LoudnessError::MalformedToolOutput`] if the output is empty or
/// not a JSON document of the expected shape.
pub fn parse_stream_listing(stdout: &[u8]) -> Result<Vec<AudioStreamDescriptor>, LoudnessError> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Err(LoudnessError::MalformedToolOutput {
            tool: "ffprobe",
            reason: "empty output".to_string(),
        });
    }

    let document: ProbeDocument =
        serde_json::from_slice(stdout).map_err(|error| LoudnessError::MalformedToolOutput {
            tool: "ffprobe",
            reason: error.to_string(),
        })?;

    Ok(document
        .streams
        .into_iter()
        .map(AudioStreamDescriptor::from)
        .collect())
}
