//! Boundary checks. Bad input is rejected, never repaired.

use std::collections::HashSet;

use carelog_core::{
    ActivityRecord, AnalyticsError, BoundsConfig, Measurement, MeasurementType,
};

pub fn measurement(measurement: &Measurement, bounds: &BoundsConfig) -> Result<(), AnalyticsError> {
    if !measurement.has_any_value() {
        return Err(AnalyticsError::invalid(
            format!("measurement {}", measurement.date),
            "needs at least one of height, weight or head circumference",
        ));
    }
    if measurement.age_in_weeks > bounds.max_age_in_weeks {
        return Err(AnalyticsError::invalid(
            "age_in_weeks",
            format!(
                "{} exceeds the supported maximum of {}",
                measurement.age_in_weeks, bounds.max_age_in_weeks
            ),
        ));
    }
    for (kind, value) in measurement.values() {
        measurement_value(kind, value, bounds)?;
    }
    Ok(())
}

pub fn measurement_value(
    kind: MeasurementType,
    value: f64,
    bounds: &BoundsConfig,
) -> Result<(), AnalyticsError> {
    let range = match kind {
        MeasurementType::Weight => bounds.weight_kg,
        MeasurementType::Height => bounds.height_cm,
        MeasurementType::HeadCircumference => bounds.head_circumference_cm,
    };
    if range.contains(value) {
        Ok(())
    } else {
        Err(AnalyticsError::invalid(
            kind.label(),
            format!(
                "{value} {} is outside the plausible range {}-{}",
                kind.unit(),
                range.min,
                range.max
            ),
        ))
    }
}

/// History must be most-recent-first with strictly decreasing dates.
pub fn history_order(history: &[Measurement]) -> Result<(), AnalyticsError> {
    for pair in history.windows(2) {
        let (newer, older) = (&pair[0], &pair[1]);
        if newer.date == older.date {
            return Err(AnalyticsError::Validation(format!(
                "duplicate measurement date {}",
                newer.date
            )));
        }
        if newer.date < older.date {
            return Err(AnalyticsError::Validation(format!(
                "measurement history must be most-recent-first, found {} before {}",
                newer.date, older.date
            )));
        }
    }
    Ok(())
}

pub fn activity_records(records: &[ActivityRecord]) -> Result<(), AnalyticsError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if let Some(ended_at) = record.ended_at {
            if ended_at < record.started_at {
                return Err(AnalyticsError::Validation(format!(
                    "{} record started at {} ends before it starts ({})",
                    record.category,
                    record.started_at.to_rfc3339(),
                    ended_at.to_rfc3339()
                )));
            }
        }
        if let Some(quantity) = record.quantity {
            if !quantity.is_finite() || quantity < 0.0 {
                return Err(AnalyticsError::invalid(
                    "quantity",
                    format!("{quantity} is not a valid amount"),
                ));
            }
        }
        if !seen.insert((record.category, record.started_at)) {
            return Err(AnalyticsError::Validation(format!(
                "duplicate {} record at {}",
                record.category,
                record.started_at.to_rfc3339()
            )));
        }
    }
    Ok(())
}

pub fn dose_amount(amount: f64, bounds: &BoundsConfig) -> Result<(), AnalyticsError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AnalyticsError::invalid(
            "amount",
            format!("{amount} is not a positive dose"),
        ));
    }
    if amount > bounds.max_single_dose_mg {
        return Err(AnalyticsError::invalid(
            "amount",
            format!(
                "{amount} mg exceeds the plausible single dose of {} mg",
                bounds.max_single_dose_mg
            ),
        ));
    }
    Ok(())
}
