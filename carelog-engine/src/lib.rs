//! Child health analytics: growth percentiles and alerts, activity patterns,
//! medication dose safety and report assembly.
//!
//! Every component is a pure function of its inputs. Rows come in through a
//! [`HealthStore`] (or a JSON [`ChildBundle`]) and results go back as values.

pub mod alerts;
pub mod dosing;
pub mod patterns;
pub mod percentile;
pub mod reference;
mod reference_data;
pub mod report;
pub mod store;
pub mod validate;

use carelog_core::{AnalyticsConfig, AnalyticsError, ChildProfile, Milestone, Report, ReportPeriod};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

pub use alerts::{growth_alerts, GrowthAlertEngine};
pub use dosing::{age_in_months, check_dose_safety, recommended_dose, MedicationDoseEngine};
pub use patterns::{analyze_patterns, ActivityPatternAnalyzer};
pub use percentile::{classify_percentile, PercentileCalculator};
pub use reference::{ReferenceCurveStore, ResolvedReference};
pub use report::{build_report, render_json, render_text, ReportAssembler};
pub use store::{load_reference_curves, ChildBundle, HealthStore, MemoryStore, MemoryStoreError};

/// Fetch everything for `child` through the store and assemble the report.
///
/// Alerts look at the whole measurement history up to the end of the period;
/// the report's growth table and patterns cover the period only.
pub fn analyze_child<S: HealthStore>(
    store: &S,
    references: &ReferenceCurveStore,
    child: &ChildProfile,
    period: ReportPeriod,
    milestones: &[Milestone],
    config: &AnalyticsConfig,
) -> Result<Report, AnalyticsError> {
    if period.end < period.start {
        return Err(AnalyticsError::invalid(
            "period",
            format!("ends {} before it starts {}", period.end, period.start),
        ));
    }

    let history: Vec<_> = store
        .measurements_for(&child.id, None)
        .map_err(store_error)?
        .into_iter()
        .filter(|measurement| measurement.date <= period.end)
        .collect();
    let alerts = growth_alerts(references, &history, config)?;

    let (start, end) = period_window(period, config)?;
    let records = store
        .activity_records_for(&child.id, start, end)
        .map_err(store_error)?;
    let patterns = analyze_patterns(&records, config)?;

    let in_period: Vec<_> = history
        .into_iter()
        .filter(|measurement| measurement.date >= period.start)
        .collect();
    let report = ReportAssembler::with_bounds(references, config.bounds).build(
        child,
        period,
        &in_period,
        &patterns,
        &alerts,
        milestones,
    )?;

    tracing::info!(
        child = %child.id,
        measurements = report.growth.len(),
        activities = records.len(),
        alerts = report.alerts.len(),
        "child analysis complete"
    );
    Ok(report)
}

/// Analyze a [`ChildBundle`] from a JSON string.
pub fn analyze_bundle_str(
    bundle_json: &str,
    config: &AnalyticsConfig,
) -> Result<Report, AnalyticsError> {
    let bundle: ChildBundle =
        serde_json::from_str(bundle_json).map_err(|err| AnalyticsError::Parse(err.to_string()))?;
    analyze_bundle(&bundle, config)
}

/// Analyze a [`ChildBundle`] from a `serde_json::Value`.
pub fn analyze_bundle_value(
    bundle: &Value,
    config: &AnalyticsConfig,
) -> Result<Report, AnalyticsError> {
    let bundle = ChildBundle::deserialize(bundle)
        .map_err(|err| AnalyticsError::Parse(err.to_string()))?;
    analyze_bundle(&bundle, config)
}

/// Runs [`analyze_child`] over an in-memory copy of the bundle.
///
/// Without an explicit period the report spans the first to the last dated row.
pub fn analyze_bundle(
    bundle: &ChildBundle,
    config: &AnalyticsConfig,
) -> Result<Report, AnalyticsError> {
    let store = MemoryStore::from_bundle(bundle)?;
    let references = load_reference_curves(&store)?;
    let period = match bundle.period {
        Some(period) => period,
        None => observed_period(bundle, config).ok_or(AnalyticsError::MissingData)?,
    };
    analyze_child(
        &store,
        &references,
        &bundle.child,
        period,
        &bundle.milestones,
        config,
    )
}

fn observed_period(bundle: &ChildBundle, config: &AnalyticsConfig) -> Option<ReportPeriod> {
    let offset = config.local_offset();
    let dates: Vec<NaiveDate> = bundle
        .measurements
        .iter()
        .map(|measurement| measurement.date)
        .chain(
            bundle
                .activities
                .iter()
                .map(|record| record.started_at.with_timezone(&offset).date_naive()),
        )
        .collect();
    Some(ReportPeriod {
        start: *dates.iter().min()?,
        end: *dates.iter().max()?,
    })
}

/// Local midnight at the start of the period to local midnight after its end.
fn period_window(
    period: ReportPeriod,
    config: &AnalyticsConfig,
) -> Result<(DateTime<Utc>, DateTime<Utc>), AnalyticsError> {
    let offset = config.local_offset();
    let midnight = |date: NaiveDate| {
        offset
            .from_local_datetime(&date.and_time(NaiveTime::MIN))
            .single()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| AnalyticsError::invalid("period", format!("{date} is out of range")))
    };
    let after_end = period
        .end
        .checked_add_signed(Duration::days(1))
        .ok_or_else(|| AnalyticsError::invalid("period", "end date is out of range"))?;
    Ok((midnight(period.start)?, midnight(after_end)?))
}

fn store_error(err: impl std::error::Error) -> AnalyticsError {
    AnalyticsError::Store(err.to_string())
}
