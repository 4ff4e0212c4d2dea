//! Grades a single value on the growth-chart ladder.

use carelog_core::{
    AnalyticsConfig, AnalyticsError, BoundsConfig, MeasurementType, Percentile, PercentileResult,
    Sex,
};

use crate::reference::ReferenceCurveStore;
use crate::validate;

/// Stateless view over a reference store.
#[derive(Debug, Clone, Copy)]
pub struct PercentileCalculator<'a> {
    store: &'a ReferenceCurveStore,
    bounds: BoundsConfig,
}

impl<'a> PercentileCalculator<'a> {
    /// Calculator applying the default plausibility bounds.
    pub fn new(store: &'a ReferenceCurveStore) -> Self {
        Self::with_bounds(store, BoundsConfig::default())
    }

    pub fn with_bounds(store: &'a ReferenceCurveStore, bounds: BoundsConfig) -> Self {
        Self { store, bounds }
    }

    /// `Ok(None)` means the store has no curve for this sex and type.
    ///
    /// The ladder of the resolved row is used as-is; rows are never
    /// interpolated across ages.
    pub fn classify(
        &self,
        sex: Sex,
        age_in_weeks: u32,
        kind: MeasurementType,
        value: f64,
    ) -> Result<Option<PercentileResult>, AnalyticsError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(AnalyticsError::invalid(
                kind.label(),
                format!("{value} is not a positive measurement"),
            ));
        }
        if age_in_weeks > self.bounds.max_age_in_weeks {
            return Err(AnalyticsError::invalid(
                "age_in_weeks",
                format!(
                    "{age_in_weeks} exceeds the supported maximum of {}",
                    self.bounds.max_age_in_weeks
                ),
            ));
        }
        validate::measurement_value(kind, value, &self.bounds)?;

        let Some(resolved) = self.store.resolve(sex, kind, age_in_weeks) else {
            tracing::debug!(?sex, measurement = %kind, "no reference curve available");
            return Ok(None);
        };

        Ok(Some(PercentileResult {
            measurement_type: kind,
            value,
            percentile: resolved.point.ladder.classify(value),
            reference_age_in_weeks: resolved.point.age_in_weeks,
            exact_match: resolved.exact_match,
        }))
    }
}

/// Convenience wrapper returning only the band.
pub fn classify_percentile(
    store: &ReferenceCurveStore,
    sex: Sex,
    age_in_weeks: u32,
    kind: MeasurementType,
    value: f64,
    config: &AnalyticsConfig,
) -> Result<Option<Percentile>, AnalyticsError> {
    PercentileCalculator::with_bounds(store, config.bounds)
        .classify(sex, age_in_weeks, kind, value)
        .map(|result| result.map(|graded| graded.percentile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grade(
        store: &ReferenceCurveStore,
        sex: Sex,
        age_in_weeks: u32,
        kind: MeasurementType,
        value: f64,
    ) -> Result<Option<Percentile>, AnalyticsError> {
        classify_percentile(store, sex, age_in_weeks, kind, value, &AnalyticsConfig::default())
    }

    fn newborn_boy_weight(value: f64) -> Option<u8> {
        let store = ReferenceCurveStore::builtin();
        grade(&store, Sex::Male, 0, MeasurementType::Weight, value)
            .expect("valid value")
            .map(Percentile::value)
    }

    #[test]
    fn newborn_boy_weights_match_reference_row() {
        assert_eq!(newborn_boy_weight(3.3), Some(50));
        assert_eq!(newborn_boy_weight(2.4), Some(3));
        assert_eq!(newborn_boy_weight(4.2), Some(97));
        assert_eq!(newborn_boy_weight(5.0), Some(99));
    }

    #[test]
    fn missing_age_row_uses_nearest_reference() {
        let store = ReferenceCurveStore::builtin();
        let result = PercentileCalculator::new(&store)
            .classify(Sex::Female, 6, MeasurementType::Weight, 4.7)
            .expect("valid value")
            .expect("curve exists");
        // Weeks 4 and 8 are equally close, the younger row wins.
        assert_eq!(result.reference_age_in_weeks, 4);
        assert!(!result.exact_match);
        assert_eq!(result.percentile, Percentile::P90);
    }

    #[test]
    fn empty_store_has_no_classification() {
        let store = ReferenceCurveStore::default();
        let result = grade(&store, Sex::Male, 0, MeasurementType::Weight, 3.3).expect("valid value");
        assert_eq!(result, None);
    }

    #[test]
    fn non_positive_values_are_invalid() {
        let store = ReferenceCurveStore::builtin();
        assert!(grade(&store, Sex::Male, 0, MeasurementType::Weight, 0.0).is_err());
        assert!(grade(&store, Sex::Male, 0, MeasurementType::Weight, f64::INFINITY).is_err());
    }

    #[test]
    fn implausible_values_are_rejected_not_graded() {
        let store = ReferenceCurveStore::builtin();
        let heavy_newborn = grade(&store, Sex::Male, 0, MeasurementType::Weight, 120.0);
        assert!(matches!(heavy_newborn, Err(AnalyticsError::InvalidInput { .. })));

        let tiny_head = grade(&store, Sex::Female, 4, MeasurementType::HeadCircumference, 9.0);
        assert!(matches!(tiny_head, Err(AnalyticsError::InvalidInput { .. })));

        let ancient = grade(&store, Sex::Male, 5000, MeasurementType::Weight, 12.0);
        assert!(matches!(ancient, Err(AnalyticsError::InvalidInput { .. })));
    }

    #[test]
    fn configured_bounds_apply() {
        let store = ReferenceCurveStore::builtin();
        let mut config = AnalyticsConfig::default();
        config.bounds.weight_kg.max = 4.0;
        let result = classify_percentile(&store, Sex::Male, 0, MeasurementType::Weight, 4.2, &config);
        assert!(result.is_err());
    }

    fn any_sex() -> impl Strategy<Value = Sex> {
        prop_oneof![Just(Sex::Male), Just(Sex::Female)]
    }

    fn any_kind() -> impl Strategy<Value = MeasurementType> {
        prop_oneof![
            Just(MeasurementType::Weight),
            Just(MeasurementType::Height),
            Just(MeasurementType::HeadCircumference),
        ]
    }

    fn plausible(kind: MeasurementType, fraction: f64) -> f64 {
        let bounds = BoundsConfig::default();
        let range = match kind {
            MeasurementType::Weight => bounds.weight_kg,
            MeasurementType::Height => bounds.height_cm,
            MeasurementType::HeadCircumference => bounds.head_circumference_cm,
        };
        range.min + (range.max - range.min) * fraction
    }

    proptest! {
        /// A larger value never lands in a lower band for the same row.
        #[test]
        fn classification_is_monotonic_in_value(
            sex in any_sex(),
            kind in any_kind(),
            age in 0u32..120,
            a in 0.0..=1.0f64,
            b in 0.0..=1.0f64,
        ) {
            let store = ReferenceCurveStore::builtin();
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let (low, high) = (plausible(kind, low), plausible(kind, high));
            let low_band = grade(&store, sex, age, kind, low).unwrap();
            let high_band = grade(&store, sex, age, kind, high).unwrap();
            prop_assert!(low_band <= high_band, "{:?} > {:?} for {} <= {}", low_band, high_band, low, high);
        }
    }
}
