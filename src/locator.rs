//! Source locators.
//!
//! A [`SourceLocator`] identifies where the audio to analyze lives: a local
//! filesystem path, an `s3://bucket/key` object, or an HTTP(S) URL. HTTP URLs
//! whose query string carries request-signing parameters are recognised as
//! presigned object-storage URLs.
//!
//! # Example
//!
//! ```
//! use loudcheck::SourceLocator;
//!
//! let locator = SourceLocator::parse("s3://media/show/episode.mxf")?;
//! assert!(locator.is_remote());
//! assert_eq!(locator.basename(), "episode.mxf");
//! # Ok::<(), loudcheck::LoudnessError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::LoudnessError;

/// Query parameters that mark an HTTP URL as presigned.
const PRESIGN_MARKERS: [&str; 5] = [
    "x-amz-signature=",
    "x-amz-credential=",
    "x-goog-signature=",
    "signature=",
    "expires=",
];

/// Longest basename, in bytes, that [`SourceLocator::basename`] returns.
///
/// Staged names add a timestamp and a random part, and must stay under the
/// usual 255-byte file name limit.
pub const MAX_BASENAME_BYTES: usize = 100;

/// The remote flavour of a [`SourceLocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteKind {
    /// An `s3://bucket/key` object.
    S3,
    /// A plain HTTP(S) URL.
    Http,
    /// An HTTP(S) URL carrying embedded request credentials.
    Presigned,
}

/// Where the media to analyze lives. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocator {
    /// A path on the local filesystem.
    Local(PathBuf),
    /// An object in an S3-compatible bucket.
    S3 {
        /// Bucket name.
        bucket: String,
        /// Object key (no leading slash).
        key: String,
    },
    /// An HTTP(S) URL, presigned or not.
    Http {
        /// The full URL including any query string.
        url: String,
        /// `true` if the query string carries signing parameters.
        presigned: bool,
    },
}

impl SourceLocator {
    /// Interpret a user-supplied string.
    ///
    /// Anything without a recognised scheme is a local path. No filesystem
    /// access happens here; existence is checked at analysis time.
    ///
    /// # Errors
    ///
    /// Returns [`LoudnessError::InvalidLocator`] for `s3://` locators without
    /// a bucket or key, and for unsupported URL schemes.
    pub fn parse(input: &str) -> Result<Self, LoudnessError> {
        let trimmed = input.trim();

        if let Some(rest) = strip_scheme(trimmed, "s3://") {
            let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
            let key = key.trim_start_matches('/');
            if bucket.is_empty() || key.is_empty() {
                return Err(LoudnessError::InvalidLocator {
                    locator: trimmed.to_string(),
                    reason: "expected s3://<bucket>/<key>".to_string(),
                });
            }
            return Ok(SourceLocator::S3 {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        if strip_scheme(trimmed, "http://").is_some() || strip_scheme(trimmed, "https://").is_some()
        {
            return Ok(SourceLocator::Http {
                url: trimmed.to_string(),
                presigned: is_presigned(trimmed),
            });
        }

        if let Some((scheme, _)) = trimmed.split_once("://") {
            if !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+') {
                return Err(LoudnessError::InvalidLocator {
                    locator: trimmed.to_string(),
                    reason: format!("unsupported scheme `{scheme}`"),
                });
            }
        }

        Ok(SourceLocator::Local(PathBuf::from(input)))
    }

    /// Returns `true` for S3 and HTTP locators.
    pub fn is_remote(&self) -> bool {
        !matches!(self, SourceLocator::Local(_))
    }

    /// The remote flavour, or `None` for local paths.
    pub fn remote_kind(&self) -> Option<RemoteKind> {
        match self {
            SourceLocator::Local(_) => None,
            SourceLocator::S3 { .. } => Some(RemoteKind::S3),
            SourceLocator::Http { presigned: true, .. } => Some(RemoteKind::Presigned),
            SourceLocator::Http { presigned: false, .. } => Some(RemoteKind::Http),
        }
    }

    /// The local path, if this is a local locator.
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            SourceLocator::Local(path) => Some(path),
            _ => None,
        }
    }

    /// Final path component without query string or fragment.
    ///
    /// Falls back to `"input"` when the locator has no usable name (e.g. a
    /// URL ending in `/`). Names longer than [`MAX_BASENAME_BYTES`] keep
    /// their last bytes, so the extension survives.
    pub fn basename(&self) -> String {
        let name = match self {
            SourceLocator::Local(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            SourceLocator::S3 { key, .. } => key.rsplit('/').next().unwrap_or_default().to_string(),
            SourceLocator::Http { url, .. } => {
                let without_query = strip_query(url);
                let path = without_query
                    .split_once("://")
                    .map_or(without_query, |(_, rest)| rest);
                match path.split_once('/') {
                    Some((_, path)) => path.rsplit('/').next().unwrap_or_default().to_string(),
                    None => String::new(),
                }
            }
        };

        let sanitized: String = name
            .chars()
            .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
            .collect();

        if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
            return "input".to_string();
        }

        let mut start = sanitized.len().saturating_sub(MAX_BASENAME_BYTES);
        while !sanitized.is_char_boundary(start) {
            start += 1;
        }
        sanitized[start..].to_string()
    }
}

impl Display for SourceLocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SourceLocator::Local(path) => write!(f, "{}", path.display()),
            SourceLocator::S3 { bucket, key } => write!(f, "s3://{bucket}/{key}"),
            SourceLocator::Http { url, .. } => f.write_str(url),
        }
    }
}

/// Drop the query string and fragment from a locator string.
pub(crate) fn strip_query(locator: &str) -> &str {
    let end = locator.find(['?', '#']).unwrap_or(locator.len());
    &locator[..end]
}

fn strip_scheme<'a>(input: &'a str, scheme: &str) -> Option<&'a str> {
    let prefix = input.get(..scheme.len())?;
    if prefix.eq_ignore_ascii_case(scheme) {
        Some(&input[scheme.len()..])
    } else {
        None
    }
}

fn is_presigned(url: &str) -> bool {
    let Some((_, query)) = url.split_once('?') else {
        return false;
    };
    let query = query.to_ascii_lowercase();
    query.split('&').any(|pair| {
        PRESIGN_MARKERS
            .iter()
            .any(|marker| pair.starts_with(marker))
    })
}
