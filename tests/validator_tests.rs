use ch10gen::icd::load_icd_from_str;
use ch10gen::scenario::load_scenario_from_str;
use ch10gen::validator::{validate, Severity};
use ch10gen::writer::WriterConfig;

const ICD: &str = r#"
bus: A
messages:
  - name: AirData
    rate_hz: 25.0
    rt: 1
    tr: bc_to_rt
    sa: 1
    wc: 1
    words:
      - name: altitude
        encode: u16
"#;

const SCENARIO: &str = r#"
name: validator-smoke
duration_s: 2.0
seed: 5
messages:
  AirData:
    fields:
      altitude:
        mode: sine
        center: 1000.0
        amplitude: 10.0
        frequency_hz: 1.0
"#;

#[test]
fn a_freshly_generated_file_passes_validation_with_no_errors() {
    let icd = load_icd_from_str(ICD).unwrap();
    let scenario = load_scenario_from_str(SCENARIO, &icd).unwrap();
    let mut sink = Vec::new();
    ch10gen::generate(&icd, &scenario, WriterConfig::default(), &mut sink, None).unwrap();

    let report = validate(&sink);
    let errors: Vec<_> = report
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .collect();
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert!(report.is_ok());
}

#[test]
fn truncating_the_file_mid_packet_is_flagged_as_an_error() {
    let icd = load_icd_from_str(ICD).unwrap();
    let scenario = load_scenario_from_str(SCENARIO, &icd).unwrap();
    let mut sink = Vec::new();
    ch10gen::generate(&icd, &scenario, WriterConfig::default(), &mut sink, None).unwrap();

    let truncated = &sink[0..sink.len() - 4];
    let report = validate(truncated);
    assert!(!report.is_ok());
}

#[test]
fn an_empty_file_is_rejected_for_missing_tmats() {
    let report = validate(&[]);
    assert!(!report.is_ok());
    assert!(report.diagnostics.iter().any(|d| d.code == "E_NO_TMATS"));
}
