//! Loudness metrics and diagnostic-text parsing.
//!
//! The measurement tool reports its results as human-readable text on its
//! error channel. Two vocabularies exist for the same concepts:
//!
//! | Metric | Summary vocabulary | Normalization-filter vocabulary | Unit |
//! |--------|--------------------|---------------------------------|------|
//! | integrated loudness | `Integrated loudness:` | `Input Integrated:` | LUFS |
//! | loudness range | `Loudness range:` | `Input LRA:` | LU |
//! | true peak | `True peak:` | `Input True Peak:` | dBTP |
//! | momentary max | `Momentary max:` | n/a | LUFS |
//! | short-term max | `Short-term max:` | n/a | LUFS |
//!
//! [`parse_diagnostics`] scans for either family per field, so callers need
//! not know which mode produced the text.
//!
//! # Example
//!
//! ```
//! use loudcheck::parse_diagnostics;
//!
//! let metrics = parse_diagnostics("Input Integrated:    -25.2 LUFS\nInput LRA:   8.1 LU");
//! assert_eq!(metrics.integrated_loudness, -25.2);
//! assert_eq!(metrics.loudness_range, 8.1);
//! assert_eq!(metrics.true_peak_max, 0.0);
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Loudness measurements for one audio stream.
///
/// Every field defaults to `0.0` when the tool's output did not contain it,
/// so a zero is ambiguous: it may be a real measurement or a missing one.
/// `momentary_max` and `short_term_max` are only reported by the summary
/// vocabulary and stay `0.0` for normalization-filter measurements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LoudnessMetrics {
    /// Integrated loudness in LUFS.
    pub integrated_loudness: f64,
    /// Loudness range in LU.
    pub loudness_range: f64,
    /// Maximum true peak in dBTP.
    pub true_peak_max: f64,
    /// Maximum momentary loudness in LUFS.
    pub momentary_max: f64,
    /// Maximum short-term loudness in LUFS.
    pub short_term_max: f64,
}

impl LoudnessMetrics {
    /// Whether the momentary/short-term maxima carry real values.
    ///
    /// Returns `false` when both are exactly zero, which is what the
    /// normalization-filter mode always produces.
    pub fn has_window_maxima(&self) -> bool {
        self.momentary_max != 0.0 || self.short_term_max != 0.0
    }
}

struct Field {
    labels: &'static [&'static str],
    value: &'static LazyLock<Regex>,
}

static LUFS_VALUE: LazyLock<Regex> = LazyLock::new(|| value_pattern("LUFS"));
static LU_VALUE: LazyLock<Regex> = LazyLock::new(|| value_pattern("LU"));
static DBTP_VALUE: LazyLock<Regex> = LazyLock::new(|| value_pattern("dBTP"));

static INTEGRATED: Field = Field {
    labels: &["Integrated loudness:", "Input Integrated:"],
    value: &LUFS_VALUE,
};
static RANGE: Field = Field {
    labels: &["Loudness range:", "Input LRA:"],
    value: &LU_VALUE,
};
static TRUE_PEAK: Field = Field {
    labels: &["True peak:", "Input True Peak:"],
    value: &DBTP_VALUE,
};
static MOMENTARY_MAX: Field = Field {
    labels: &["Momentary max:"],
    value: &LUFS_VALUE,
};
static SHORT_TERM_MAX: Field = Field {
    labels: &["Short-term max:"],
    value: &LUFS_VALUE,
};

fn value_pattern(unit: &str) -> Regex {
    Regex::new(&format!(r"([+-]?\d+(?:\.\d+)?)\s*{unit}\b"))
        .expect("loudness value pattern is a valid regex")
}

/// Extract loudness metrics from measurement diagnostics.
///
/// Total: unrecognised or empty text yields zero-valued fields. Lines may
/// appear in any order; the first line that carries both a label and a value
/// with the right unit wins for each field.
pub fn parse_diagnostics(text: &str) -> LoudnessMetrics {
    let mut integrated = None;
    let mut range = None;
    let mut true_peak = None;
    let mut momentary = None;
    let mut short_term = None;

    for line in text.lines() {
        for (field, slot) in [
            (&INTEGRATED, &mut integrated),
            (&RANGE, &mut range),
            (&TRUE_PEAK, &mut true_peak),
            (&MOMENTARY_MAX, &mut momentary),
            (&SHORT_TERM_MAX, &mut short_term),
        ] {
            if slot.is_none() {
                *slot = extract(field, line);
            }
        }
    }

    LoudnessMetrics {
        integrated_loudness: integrated.unwrap_or(0.0),
        loudness_range: range.unwrap_or(0.0),
        true_peak_max: true_peak.unwrap_or(0.0),
        momentary_max: momentary.unwrap_or(0.0),
        short_term_max: short_term.unwrap_or(0.0),
    }
}

fn extract(field: &Field, line: &str) -> Option<f64> {
    field.labels.iter().find_map(|label| {
        let (_, after) = line.split_once(label)?;
        let captures = field.value.captures(after)?;
        captures.get(1)?.as_str().parse().ok()
    })
}
