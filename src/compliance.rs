//! Loudness compliance evaluation.
//!
//! A [`ComplianceStandard`] holds the thresholds of one delivery
//! specification; [`ComplianceStandard::evaluate`] compares
//! [`LoudnessMetrics`] against them and returns a [`ComplianceReport`]
//! listing every violation.
//!
//! # Example
//!
//! ```
//! use loudcheck::{ComplianceStandard, LoudnessMetrics};
//!
//! let metrics = LoudnessMetrics {
//!     integrated_loudness: -23.4,
//!     true_peak_max: -1.8,
//!     ..LoudnessMetrics::default()
//! };
//! let report = ComplianceStandard::lookup("ebu-r128")?.evaluate(&metrics);
//! assert!(report.is_compliant());
//! # Ok::<(), loudcheck::LoudnessError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;

use crate::error::LoudnessError;
use crate::loudness::LoudnessMetrics;

/// Thresholds of one delivery specification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComplianceStandard {
    /// Lookup name (e.g. `"ebu-r128"`).
    pub name: &'static str,
    /// Human-readable title.
    pub description: &'static str,
    /// Target integrated loudness in LUFS.
    pub target_integrated: f64,
    /// Allowed deviation from the target, in LU, in either direction.
    pub tolerance: f64,
    /// Maximum permitted true peak in dBTP.
    pub max_true_peak: f64,
    /// Maximum permitted short-term loudness in LUFS, if the standard has one.
    pub max_short_term: Option<f64>,
}

/// Built-in standards.
pub const STANDARDS: [ComplianceStandard; 4] = [
    ComplianceStandard {
        name: "ebu-r128",
        description: "EBU R128 broadcast",
        target_integrated: -23.0,
        tolerance: 1.0,
        max_true_peak: -1.0,
        max_short_term: None,
    },
    ComplianceStandard {
        name: "ebu-r128-s1",
        description: "EBU R128 s1 short-form advertising",
        target_integrated: -23.0,
        tolerance: 1.0,
        max_true_peak: -1.0,
        max_short_term: Some(-18.0),
    },
    ComplianceStandard {
        name: "atsc-a85",
        description: "ATSC A/85 (US broadcast)",
        target_integrated: -24.0,
        tolerance: 2.0,
        max_true_peak: -2.0,
        max_short_term: None,
    },
    ComplianceStandard {
        name: "streaming",
        description: "Streaming platforms",
        target_integrated: -14.0,
        tolerance: 1.0,
        max_true_peak: -1.0,
        max_short_term: None,
    },
];

impl ComplianceStandard {
    /// Find a built-in standard by name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`LoudnessError::UnknownStandard`] if no standard matches.
    pub fn lookup(name: &str) -> Result<Self, LoudnessError> {
        STANDARDS
            .iter()
            .find(|standard| standard.name.eq_ignore_ascii_case(name.trim()))
            .copied()
            .ok_or_else(|| LoudnessError::UnknownStandard(name.to_string()))
    }

    /// Lowest compliant integrated loudness.
    pub fn min_integrated(&self) -> f64 {
        self.target_integrated - self.tolerance
    }

    /// Highest compliant integrated loudness.
    pub fn max_integrated(&self) -> f64 {
        self.target_integrated + self.tolerance
    }

    /// Compare `metrics` against this standard.
    ///
    /// Bounds are inclusive. The short-term limit is only checked when the
    /// measurement reported window maxima; a zero there means "not measured".
    pub fn evaluate(&self, metrics: &LoudnessMetrics) -> ComplianceReport {
        let mut report = ComplianceReport {
            standard: self.name,
            compliant: true,
            violations: Vec::new(),
            notes: Vec::new(),
        };

        let integrated = metrics.integrated_loudness;
        if integrated < self.min_integrated() {
            report.violations.push(format!(
                "Integrated loudness {integrated:.1} LUFS is below {:.1} LUFS",
                self.min_integrated()
            ));
        } else if integrated > self.max_integrated() {
            report.violations.push(format!(
                "Integrated loudness {integrated:.1} LUFS is above {:.1} LUFS",
                self.max_integrated()
            ));
        }

        if metrics.true_peak_max > self.max_true_peak {
            report.violations.push(format!(
                "True peak {:.1} dBTP exceeds {:.1} dBTP",
                metrics.true_peak_max, self.max_true_peak
            ));
        }

        if let Some(limit) = self.max_short_term {
            if !metrics.has_window_maxima() {
                report
                    .notes
                    .push("Short-term maximum not measured; limit not checked".to_string());
            } else if metrics.short_term_max > limit {
                report.violations.push(format!(
                    "Short-term maximum {:.1} LUFS exceeds {limit:.1} LUFS",
                    metrics.short_term_max
                ));
            }
        }

        report.compliant = report.violations.is_empty();
        report
    }
}

/// Outcome of a compliance evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceReport {
    /// Name of the standard evaluated against.
    pub standard: &'static str,
    /// `true` if there are no violations.
    pub compliant: bool,
    /// One message per failed threshold.
    pub violations: Vec<String>,
    /// Checks that could not be performed.
    pub notes: Vec<String>,
}

impl ComplianceReport {
    /// Returns `true` if no threshold was violated.
    pub fn is_compliant(&self) -> bool {
        self.compliant
    }
}

impl Display for ComplianceReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.compliant {
            writeln!(f, "[PASS] {}", self.standard)?;
        } else {
            writeln!(f, "[FAIL] {}", self.standard)?;
        }
        for violation in &self.violations {
            writeln!(f, "[VIOLATION] {violation}")?;
        }
        for note in &self.notes {
            writeln!(f, "[NOTE] {note}")?;
        }
        Ok(())
    }
}
