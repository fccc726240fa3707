//! Compliance threshold tests.

use loudcheck::{ComplianceStandard, LoudnessError, LoudnessMetrics, STANDARDS};

fn metrics(integrated: f64, true_peak: f64) -> LoudnessMetrics {
    LoudnessMetrics {
        integrated_loudness: integrated,
        true_peak_max: true_peak,
        ..LoudnessMetrics::default()
    }
}

#[test]
fn broadcast_bounds_are_inclusive() {
    let standard = ComplianceStandard::lookup("atsc-a85").unwrap();
    assert!(standard.evaluate(&metrics(-24.0, -3.0)).is_compliant());
    assert!(standard.evaluate(&metrics(-26.0, -3.0)).is_compliant());
    assert!(standard.evaluate(&metrics(-22.0, -3.0)).is_compliant());

    let standard = ComplianceStandard::lookup("ebu-r128").unwrap();
    assert!(standard.evaluate(&metrics(-24.0, -1.0)).is_compliant());
    assert!(standard.evaluate(&metrics(-22.0, -1.0)).is_compliant());
}

#[test]
fn just_outside_bounds_is_a_violation() {
    let standard = ComplianceStandard::lookup("ebu-r128").unwrap();

    let quiet = standard.evaluate(&metrics(-24.1, -3.0));
    assert!(!quiet.is_compliant());
    assert_eq!(quiet.violations.len(), 1);
    assert!(quiet.violations[0].contains("below"), "{:?}", quiet.violations);

    let loud = standard.evaluate(&metrics(-21.9, -3.0));
    assert!(!loud.is_compliant());
    assert!(loud.violations[0].contains("above"), "{:?}", loud.violations);
}

#[test]
fn true_peak_limit() {
    let standard = ComplianceStandard::lookup("ebu-r128").unwrap();
    let report = standard.evaluate(&metrics(-23.0, -0.5));
    assert!(!report.is_compliant());
    assert!(report.violations[0].contains("True peak"));

    let report = standard.evaluate(&metrics(-30.0, 0.2));
    assert_eq!(report.violations.len(), 2);
}

#[test]
fn short_term_limit_only_checked_when_measured() {
    let standard = ComplianceStandard::lookup("ebu-r128-s1").unwrap();

    let unmeasured = standard.evaluate(&metrics(-23.0, -2.0));
    assert!(unmeasured.is_compliant());
    assert_eq!(unmeasured.notes.len(), 1);

    let measured = standard.evaluate(&LoudnessMetrics {
        integrated_loudness: -23.0,
        true_peak_max: -2.0,
        momentary_max: -14.0,
        short_term_max: -16.5,
        ..LoudnessMetrics::default()
    });
    assert!(!measured.is_compliant());
    assert!(measured.notes.is_empty());
    assert!(measured.violations[0].contains("Short-term"));
}

#[test]
fn lookup_is_case_insensitive() {
    let standard = ComplianceStandard::lookup("EBU-R128").unwrap();
    assert_eq!(standard.target_integrated, -23.0);
    assert_eq!(standard.min_integrated(), -24.0);
    assert_eq!(standard.max_integrated(), -22.0);

    let streaming = ComplianceStandard::lookup(" streaming ").unwrap();
    assert_eq!(streaming.target_integrated, -14.0);
}

#[test]
fn unknown_standard() {
    let result = ComplianceStandard::lookup("netflix");
    assert!(matches!(result, Err(LoudnessError::UnknownStandard(name)) if name == "netflix"));
}

#[test]
fn table_names_are_unique() {
    for (position, standard) in STANDARDS.iter().enumerate() {
        assert!(
            STANDARDS[position + 1..]
                .iter()
                .all(|other| other.name != standard.name),
            "Duplicate standard {}",
            standard.name
        );
        assert_eq!(ComplianceStandard::lookup(standard.name).unwrap(), *standard);
    }
}

#[test]
fn report_display() {
    let standard = ComplianceStandard::lookup("ebu-r128").unwrap();
    let rendered = standard.evaluate(&metrics(-30.0, -3.0)).to_string();
    assert!(rendered.starts_with("[FAIL] ebu-r128"));
    assert!(rendered.contains("[VIOLATION] Integrated loudness -30.0 LUFS is below -24.0 LUFS"));

    let rendered = standard.evaluate(&metrics(-23.0, -3.0)).to_string();
    assert_eq!(rendered, "[PASS] ebu-r128\n");
}
