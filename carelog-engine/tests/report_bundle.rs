use std::path::Path;

use carelog_core::{
    ActivityCategory, AlertType, AnalyticsConfig, DoseEvent, DoseOutcome, DoseUnit, Percentile,
    Report, SafetyIssue, Trend,
};
use carelog_engine::{
    age_in_months, analyze_bundle_str, analyze_bundle_value, check_dose_safety, recommended_dose,
    render_json, render_text, ChildBundle, HealthStore, MemoryStore,
};
use chrono::{DateTime, Duration, Utc};

fn fixture() -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/child_bundle.json");
    std::fs::read_to_string(path).expect("fixture should be readable")
}

fn report() -> Report {
    analyze_bundle_str(&fixture(), &AnalyticsConfig::default()).expect("bundle should analyze")
}

fn utc(at: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(at).unwrap().with_timezone(&Utc)
}

#[test]
fn bundle_produces_growth_alerts_and_concerns() {
    let report = report();

    assert_eq!(report.growth.len(), 1);
    let entry = &report.growth[0];
    assert_eq!(entry.age_in_weeks, 13);
    let bands: Vec<_> = entry.readings.iter().map(|reading| reading.percentile).collect();
    assert_eq!(bands, vec![Some(Percentile::P3), Some(Percentile::P50)]);

    let mut types: Vec<_> = report.alerts.iter().map(|alert| alert.alert_type).collect();
    types.sort_by_key(|kind| format!("{kind:?}"));
    assert_eq!(
        types,
        vec![AlertType::LowPercentile, AlertType::NoGrowth, AlertType::RapidShift]
    );
    assert_eq!(report.concerns.len(), 3);
}

#[test]
fn bundle_patterns_cover_each_category() {
    let report = report();
    let categories: Vec<_> = report.patterns.iter().map(|summary| summary.category).collect();
    assert_eq!(
        categories,
        vec![ActivityCategory::Feeding, ActivityCategory::Sleep, ActivityCategory::Diaper]
    );

    let feeding = &report.patterns[0];
    assert_eq!(feeding.record_count, 6);
    assert_eq!(feeding.average_interval_minutes, Some(180.0));
    assert_eq!(feeding.average_quantity, Some(120.0));
    assert_eq!(feeding.peak_hours, vec![6, 9, 12]);
    assert_eq!(feeding.trend, Trend::Stable);

    let sleep = &report.patterns[1];
    assert_eq!(sleep.total_duration_minutes, 750.0);
    assert_eq!(sleep.open_count, 0);
}

#[test]
fn text_export_has_stable_layout() {
    let text = render_text(&report());

    assert!(text.starts_with("CHILD HEALTH REPORT\nName: Ada\n"));
    assert!(text.contains("Report period: 25/03/2024 - 07/04/2024"));
    assert!(text.contains("01/04/2024 (13 weeks): Weight 5 kg (<=3rd), Height 61.4 cm (50th)"));
    assert!(text.contains("Breakdown: bottle 3, breast 3"));
    assert!(text.contains("Total sleep: 12h 30m"));
    assert!(text.contains("30/03/2024 Rolls over (tummy to back)"));

    let order: Vec<usize> = [
        "SUMMARY", "SLEEP", "FEEDING", "NAPPY", "GROWTH NOTES", "MILESTONES", "CONCERNS",
    ]
    .iter()
    .map(|header| text.find(&format!("\n{header}\n")).expect("section present"))
    .collect();
    assert!(order.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn exports_are_deterministic() {
    let first = report();
    let second = report();
    assert_eq!(render_text(&first), render_text(&second));

    let json = render_json(&first).unwrap();
    let parsed: Report = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, first);
}

#[test]
fn value_entry_point_derives_period_when_absent() {
    let mut value: serde_json::Value = serde_json::from_str(&fixture()).unwrap();
    value.as_object_mut().unwrap().remove("period");

    let report = analyze_bundle_value(&value, &AnalyticsConfig::default()).unwrap();
    assert_eq!(report.period.start.to_string(), "2024-01-01");
    assert_eq!(report.period.end.to_string(), "2024-04-01");
    assert_eq!(report.growth.len(), 3);
}

#[test]
fn dose_checks_run_against_the_store() {
    let bundle: ChildBundle = serde_json::from_str(&fixture()).unwrap();
    let store = MemoryStore::from_bundle(&bundle).unwrap();
    let profile = store.medication_profile("paracetamol").unwrap().unwrap();

    let age = age_in_months(bundle.child.date_of_birth, utc("2024-04-01T10:00:00Z").date_naive());
    assert_eq!(age, 3);
    let recommendation = recommended_dose(&profile, age, None)
        .unwrap()
        .recommendation()
        .cloned()
        .expect("an age band matches");
    assert_eq!(recommendation.recommended_dose_mg, 60.0);
    assert_eq!(recommendation.volume_ml, Some(2.5));

    let proposed = DoseEvent {
        child_id: "c1".to_string(),
        medication_id: "paracetamol".to_string(),
        amount: 60.0,
        unit: DoseUnit::Mg,
        administered_at: utc("2024-04-01T10:00:00Z"),
    };
    let history = store
        .dose_history_for("c1", "paracetamol", proposed.administered_at - Duration::days(1))
        .unwrap();
    let config = AnalyticsConfig::default();

    let verdict = check_dose_safety(&profile, &proposed, &history, &config).unwrap();
    assert!(!verdict.safe);
    assert_eq!(verdict.next_safe_time, Some(utc("2024-04-01T12:00:00Z")));
    assert!(matches!(verdict.issues[..], [SafetyIssue::IntervalTooShort { .. }]));

    let later = DoseEvent {
        administered_at: utc("2024-04-01T13:00:00Z"),
        ..proposed
    };
    let verdict = check_dose_safety(&profile, &later, &history, &config).unwrap();
    assert!(verdict.safe);
    assert_eq!(verdict.current_daily_total_mg, 60.0);
    assert_eq!(verdict.remaining_daily_mg, Some(180.0));
}

#[test]
fn infants_below_the_minimum_age_are_restricted() {
    let bundle: ChildBundle = serde_json::from_str(&fixture()).unwrap();
    let profile = &bundle.medications[0];
    let outcome = recommended_dose(profile, 1, None).unwrap();
    assert!(matches!(
        outcome,
        DoseOutcome::AgeRestricted {
            min_age_months: 2,
            age_months: 1
        }
    ));
}
