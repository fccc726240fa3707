//! Container format classification.
//!
//! [`classify`] decides, from the file extension alone, whether the
//! measurement tool is likely to read a remote source progressively. Formats
//! whose index or metadata sits at the end of the file force the tool to seek
//! across the whole object, which over HTTP is slow or unsupported, so they
//! are marked as not streamable.
//!
//! The table is built once per process and never mutated.
//!
//! # Example
//!
//! ```
//! use loudcheck::{classify, Confidence};
//!
//! let verdict = classify("https://cdn.example.com/promo.MP4?X-Amz-Signature=abc");
//! assert!(verdict.can_stream);
//! assert_eq!(verdict.format, "MP4");
//! assert_eq!(verdict.confidence, Confidence::High);
//! ```

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::LazyLock;

use serde::Serialize;

use crate::locator::strip_query;

/// How much the classifier trusts its own verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Unknown or stream-hostile format.
    Low,
    /// Usually streamable, depends on how the file was muxed.
    Medium,
    /// Designed for progressive reading.
    High,
}

impl Display for Confidence {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        })
    }
}

/// Streaming capability of a source, derived from its extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamingVerdict {
    /// Whether remote analysis should be attempted without a local copy.
    pub can_stream: bool,
    /// The extension as written in the locator (may be empty).
    pub format: String,
    /// Confidence tier from the format table.
    pub confidence: Confidence,
    /// Why the format is not streamable, when known.
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct FormatEntry {
    can_stream: bool,
    confidence: Confidence,
    reason: Option<&'static str>,
}

const fn streamable(confidence: Confidence) -> FormatEntry {
    FormatEntry {
        can_stream: true,
        confidence,
        reason: None,
    }
}

const fn unstreamable(reason: &'static str) -> FormatEntry {
    FormatEntry {
        can_stream: false,
        confidence: Confidence::Low,
        reason: Some(reason),
    }
}

static FORMAT_TABLE: LazyLock<HashMap<&'static str, FormatEntry>> = LazyLock::new(|| {
    HashMap::from([
        ("mp4", streamable(Confidence::High)),
        ("mov", streamable(Confidence::High)),
        ("m4v", streamable(Confidence::High)),
        ("ts", streamable(Confidence::High)),
        ("m2ts", streamable(Confidence::High)),
        ("webm", streamable(Confidence::High)),
        ("mxf", streamable(Confidence::Medium)),
        ("mkv", streamable(Confidence::Medium)),
        ("3gp", streamable(Confidence::Medium)),
        ("avi", unstreamable("index usually at end")),
        ("wmv", unstreamable("poor streaming support")),
        ("flv", unstreamable("metadata at end")),
        ("rm", unstreamable("proprietary format")),
        ("rmvb", unstreamable("variable bitrate issues")),
    ])
});

/// Classify a locator (path or URL) by its extension.
///
/// Query strings and fragments are ignored, so presigned URLs classify like
/// their underlying object. Lookup is case-insensitive. Unknown extensions
/// are not streamable with [`Confidence::Low`].
pub fn classify(locator: &str) -> StreamingVerdict {
    let format = extension(locator).to_string();

    match FORMAT_TABLE.get(format.to_ascii_lowercase().as_str()) {
        Some(entry) => StreamingVerdict {
            can_stream: entry.can_stream,
            format,
            confidence: entry.confidence,
            reason: entry.reason.map(str::to_string),
        },
        None => StreamingVerdict {
            can_stream: false,
            format,
            confidence: Confidence::Low,
            reason: Some("unknown format".to_string()),
        },
    }
}

/// Extensions the classifier knows about, sorted.
pub fn known_formats() -> Vec<&'static str> {
    let mut formats: Vec<_> = FORMAT_TABLE.keys().copied().collect();
    formats.sort_unstable();
    formats
}

fn extension(locator: &str) -> &str {
    let path = strip_query(locator);
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext,
        _ => "",
    }
}
