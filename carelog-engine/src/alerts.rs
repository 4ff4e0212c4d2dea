//! Growth trajectory checks over a child's measurement history.

use carelog_core::{
    AlertSeverity, AlertType, AnalyticsConfig, AnalyticsError, BoundsConfig, GrowthAlert,
    GrowthThresholds, Measurement, MeasurementType, Percentile,
};
use chrono::NaiveDate;

use crate::percentile::PercentileCalculator;
use crate::reference::ReferenceCurveStore;
use crate::validate;

/// A reading of one measurement type with its resolved band.
#[derive(Debug, Clone, Copy)]
struct Reading {
    date: NaiveDate,
    age_in_weeks: u32,
    value: f64,
    percentile: Option<Percentile>,
}

#[derive(Debug, Clone)]
pub struct GrowthAlertEngine<'a> {
    calculator: PercentileCalculator<'a>,
    thresholds: GrowthThresholds,
    bounds: BoundsConfig,
}

impl<'a> GrowthAlertEngine<'a> {
    pub fn new(store: &'a ReferenceCurveStore, config: &AnalyticsConfig) -> Self {
        Self {
            calculator: PercentileCalculator::with_bounds(store, config.bounds),
            thresholds: config.growth.clone(),
            bounds: config.bounds,
        }
    }

    /// `history` is most-recent-first. Every rule runs independently per
    /// measurement type and all findings are returned.
    pub fn evaluate(&self, history: &[Measurement]) -> Result<Vec<GrowthAlert>, AnalyticsError> {
        history
            .iter()
            .try_for_each(|measurement| validate::measurement(measurement, &self.bounds))
            .and_then(|()| validate::history_order(history))
            .inspect_err(|err| tracing::warn!(%err, "measurement history rejected"))?;

        let mut alerts = Vec::new();
        for kind in MeasurementType::ALL {
            let readings = self.readings(history, kind)?;
            let Some(latest) = readings.first() else {
                continue;
            };

            alerts.extend(extremity(kind, latest));
            if let Some(previous) = readings.get(1) {
                alerts.extend(self.rapid_shift(kind, latest, previous));
            }
            alerts.extend(self.stagnation(kind, &readings));
        }

        if !alerts.is_empty() {
            tracing::info!(
                alerts = alerts.len(),
                measurements = history.len(),
                "growth alerts raised"
            );
        }
        Ok(alerts)
    }

    fn readings(
        &self,
        history: &[Measurement],
        kind: MeasurementType,
    ) -> Result<Vec<Reading>, AnalyticsError> {
        history
            .iter()
            .filter_map(|measurement| measurement.value(kind).map(|value| (measurement, value)))
            .map(|(measurement, value)| {
                let graded = self.calculator.classify(
                    measurement.sex,
                    measurement.age_in_weeks,
                    kind,
                    value,
                )?;
                Ok(Reading {
                    date: measurement.date,
                    age_in_weeks: measurement.age_in_weeks,
                    value,
                    percentile: graded.map(|result| result.percentile),
                })
            })
            .collect()
    }

    fn rapid_shift(
        &self,
        kind: MeasurementType,
        latest: &Reading,
        previous: &Reading,
    ) -> Option<GrowthAlert> {
        let (current, prior) = (latest.percentile?, previous.percentile?);
        if current.points_between(prior) < self.thresholds.rapid_shift_points {
            return None;
        }
        let direction = if current > prior { "up" } else { "down" };
        Some(GrowthAlert {
            alert_type: AlertType::RapidShift,
            measurement_type: kind,
            severity: AlertSeverity::Medium,
            message: format!(
                "{} moved {direction} from the {prior} to the {current} percentile since {}",
                kind.label(),
                previous.date.format("%d/%m/%Y")
            ),
            recommendation: Some("Re-measure and review at the next check-up".to_string()),
            requires_consultation: false,
        })
    }

    /// Longest recent run where each reading is no larger than the one before.
    fn stagnation(&self, kind: MeasurementType, readings: &[Reading]) -> Option<GrowthAlert> {
        let latest = readings.first()?;
        let run = 1 + readings
            .windows(2)
            .take_while(|pair| pair[0].value <= pair[1].value)
            .count();
        let oldest = &readings[run - 1];
        let span_days = (latest.date - oldest.date).num_days();

        if run < self.thresholds.stagnation_min_readings.max(2)
            || span_days < i64::from(self.thresholds.stagnation_min_weeks) * 7
        {
            return None;
        }

        Some(GrowthAlert {
            alert_type: AlertType::NoGrowth,
            measurement_type: kind,
            severity: AlertSeverity::Medium,
            message: format!(
                "{} has not increased across {run} readings over {} weeks",
                kind.label(),
                span_days / 7
            ),
            recommendation: Some(
                "Check feeding and discuss growth with your health visitor".to_string(),
            ),
            requires_consultation: false,
        })
    }
}

fn extremity(kind: MeasurementType, latest: &Reading) -> Option<GrowthAlert> {
    let percentile = latest.percentile?;
    let (alert_type, position) = if percentile.is_low_extreme() {
        (AlertType::LowPercentile, "at or below the 3rd")
    } else if percentile.is_high_extreme() {
        (AlertType::HighPercentile, "above the 97th")
    } else {
        return None;
    };

    Some(GrowthAlert {
        alert_type,
        measurement_type: kind,
        severity: AlertSeverity::High,
        message: format!(
            "{} of {} {} at {} weeks is {position} percentile",
            kind.label(),
            format_value(latest.value),
            kind.unit(),
            latest.age_in_weeks
        ),
        recommendation: Some("Book a review with your GP or health visitor".to_string()),
        requires_consultation: true,
    })
}

fn format_value(value: f64) -> String {
    let rounded = format!("{value:.2}");
    rounded
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Free-function form of [`GrowthAlertEngine::evaluate`].
pub fn growth_alerts(
    store: &ReferenceCurveStore,
    history: &[Measurement],
    config: &AnalyticsConfig,
) -> Result<Vec<GrowthAlert>, AnalyticsError> {
    GrowthAlertEngine::new(store, config).evaluate(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use carelog_core::Sex;

    fn reading(day: &str, age_in_weeks: u32, weight: f64) -> Measurement {
        Measurement {
            date: NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap(),
            age_in_weeks,
            sex: Sex::Male,
            height_cm: None,
            weight_kg: Some(weight),
            head_circumference_cm: None,
        }
    }

    fn alerts_for(history: &[Measurement]) -> Vec<GrowthAlert> {
        let store = ReferenceCurveStore::builtin();
        growth_alerts(&store, history, &AnalyticsConfig::default()).unwrap()
    }

    fn types(alerts: &[GrowthAlert]) -> Vec<AlertType> {
        alerts.iter().map(|alert| alert.alert_type).collect()
    }

    #[test]
    fn healthy_history_raises_nothing() {
        let history = vec![
            reading("2024-03-01", 8, 5.6),
            reading("2024-02-02", 4, 4.5),
            reading("2024-01-05", 0, 3.3),
        ];
        assert!(alerts_for(&history).is_empty());
    }

    #[test]
    fn extreme_low_weight_needs_consultation() {
        let alerts = alerts_for(&[reading("2024-01-05", 0, 2.3)]);
        assert_eq!(types(&alerts), vec![AlertType::LowPercentile]);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
        assert!(alerts[0].requires_consultation);
        assert!(alerts[0].message.contains("2.3 kg"));
    }

    #[test]
    fn extreme_high_weight_is_flagged() {
        let alerts = alerts_for(&[reading("2024-01-05", 0, 5.0)]);
        assert_eq!(types(&alerts), vec![AlertType::HighPercentile]);
    }

    #[test]
    fn rapid_shift_fires_in_either_direction() {
        // Week 4 p50 (4.5) down to week 8 p10 (4.7).
        let falling = vec![reading("2024-03-01", 8, 4.7), reading("2024-02-02", 4, 4.5)];
        let alerts = alerts_for(&falling);
        assert_eq!(types(&alerts), vec![AlertType::RapidShift]);
        assert_eq!(alerts[0].severity, AlertSeverity::Medium);
        assert!(alerts[0].message.contains("down"));

        // Week 4 p25 (4.1) up to week 8 p75 (6.0).
        let rising = vec![reading("2024-03-01", 8, 6.0), reading("2024-02-02", 4, 4.1)];
        let alerts = alerts_for(&rising);
        assert_eq!(types(&alerts), vec![AlertType::RapidShift]);
        assert!(alerts[0].message.contains("up"));
    }

    #[test]
    fn rapid_shift_threshold_is_inclusive() {
        // Week 4 p5 (3.6) to week 8 p25 (5.1) is exactly 20 points.
        let at_threshold = vec![reading("2024-03-01", 8, 5.1), reading("2024-02-02", 4, 3.6)];
        assert_eq!(types(&alerts_for(&at_threshold)), vec![AlertType::RapidShift]);

        // Week 4 p10 (3.8) to the same reading is 15.
        let below = vec![reading("2024-03-01", 8, 5.1), reading("2024-02-02", 4, 3.8)];
        assert!(alerts_for(&below).is_empty());
    }

    #[test]
    fn flat_weight_over_four_weeks_is_no_growth() {
        let history = vec![reading("2024-03-04", 12, 5.6), reading("2024-02-05", 8, 5.6)];
        let alerts = alerts_for(&history);
        assert!(types(&alerts).contains(&AlertType::NoGrowth));
    }

    #[test]
    fn short_plateau_is_not_stagnation() {
        let history = vec![reading("2024-02-20", 10, 5.6), reading("2024-02-05", 8, 5.6)];
        let alerts = alerts_for(&history);
        assert!(!types(&alerts).contains(&AlertType::NoGrowth));
    }

    #[test]
    fn rules_fire_together() {
        // Week 8 p50 (5.6) then no gain for five weeks, landing at the week 13 p3 line.
        let history = vec![reading("2024-03-11", 13, 5.0), reading("2024-02-05", 8, 5.6)];
        let alerts = alerts_for(&history);
        let found = types(&alerts);
        assert!(found.contains(&AlertType::LowPercentile));
        assert!(found.contains(&AlertType::RapidShift));
        assert!(found.contains(&AlertType::NoGrowth));
    }

    #[test]
    fn ascending_history_is_rejected() {
        let store = ReferenceCurveStore::builtin();
        let history = vec![reading("2024-02-02", 4, 4.5), reading("2024-03-01", 8, 5.6)];
        let result = growth_alerts(&store, &history, &AnalyticsConfig::default());
        assert!(matches!(result, Err(AnalyticsError::Validation(_))));
    }
}
