//! Read-only store of percentile ladders keyed by `(sex, type, age_in_weeks)`.

use std::collections::btree_map::{BTreeMap, Entry};
use std::ops::Bound;

use carelog_core::{
    AnalyticsError, MeasurementType, PercentileLadder, ReferenceCurvePoint, Sex,
};

use crate::reference_data;

type CurveKey = (Sex, MeasurementType, u32);

/// Reference row chosen for a lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedReference {
    pub point: ReferenceCurvePoint,
    pub exact_match: bool,
}

/// Immutable after construction; share it by reference across threads.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCurveStore {
    ladders: BTreeMap<CurveKey, PercentileLadder>,
}

impl ReferenceCurveStore {
    /// Builds the store, rejecting duplicate keys and non-monotonic ladders.
    pub fn from_points<I>(points: I) -> Result<Self, AnalyticsError>
    where
        I: IntoIterator<Item = ReferenceCurvePoint>,
    {
        let mut ladders = BTreeMap::new();
        for point in points {
            if !point.ladder.is_monotonic() {
                return Err(AnalyticsError::Validation(format!(
                    "reference ladder for {:?} {} at week {} is not monotonic",
                    point.sex, point.measurement_type, point.age_in_weeks
                )));
            }
            match ladders.entry((point.sex, point.measurement_type, point.age_in_weeks)) {
                Entry::Occupied(_) => {
                    return Err(AnalyticsError::Validation(format!(
                        "duplicate reference row for {:?} {} at week {}",
                        point.sex, point.measurement_type, point.age_in_weeks
                    )));
                }
                Entry::Vacant(slot) => {
                    slot.insert(point.ladder);
                }
            }
        }
        tracing::debug!(rows = ladders.len(), "reference curves loaded");
        Ok(Self { ladders })
    }

    /// Parses a JSON array of `ReferenceCurvePoint` objects.
    pub fn from_json(json: &str) -> Result<Self, AnalyticsError> {
        let points: Vec<ReferenceCurvePoint> =
            serde_json::from_str(json).map_err(|err| AnalyticsError::Parse(err.to_string()))?;
        Self::from_points(points)
    }

    /// WHO-derived ladders shipped with the crate.
    pub fn builtin() -> Self {
        let ladders = reference_data::TABLES
            .iter()
            .flat_map(|(sex, kind, rows)| {
                rows.iter()
                    .map(move |(age, values)| ((*sex, *kind, *age), PercentileLadder::new(*values)))
            })
            .collect();
        Self { ladders }
    }

    pub fn len(&self) -> usize {
        self.ladders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ladders.is_empty()
    }

    /// All rows for one curve, youngest first.
    pub fn curve(&self, sex: Sex, kind: MeasurementType) -> Vec<ReferenceCurvePoint> {
        self.ladders
            .range((sex, kind, u32::MIN)..=(sex, kind, u32::MAX))
            .map(|(&(sex, measurement_type, age_in_weeks), ladder)| ReferenceCurvePoint {
                sex,
                age_in_weeks,
                measurement_type,
                ladder: *ladder,
            })
            .collect()
    }

    /// Exact row if present, otherwise the row with the closest age; ties go to
    /// the younger row. `None` when the curve has no rows at all.
    pub fn resolve(
        &self,
        sex: Sex,
        kind: MeasurementType,
        age_in_weeks: u32,
    ) -> Option<ResolvedReference> {
        if let Some(ladder) = self.ladders.get(&(sex, kind, age_in_weeks)) {
            return Some(ResolvedReference {
                point: ReferenceCurvePoint {
                    sex,
                    age_in_weeks,
                    measurement_type: kind,
                    ladder: *ladder,
                },
                exact_match: true,
            });
        }

        let younger = self
            .ladders
            .range((sex, kind, u32::MIN)..(sex, kind, age_in_weeks))
            .next_back();
        let older = self
            .ladders
            .range((
                Bound::Excluded((sex, kind, age_in_weeks)),
                Bound::Included((sex, kind, u32::MAX)),
            ))
            .next();

        let (&(_, _, reference_age), ladder) = match (younger, older) {
            (Some(young), Some(old)) => {
                let young_gap = age_in_weeks - young.0 .2;
                let old_gap = old.0 .2 - age_in_weeks;
                if young_gap <= old_gap {
                    young
                } else {
                    old
                }
            }
            (Some(young), None) => young,
            (None, Some(old)) => old,
            (None, None) => return None,
        };

        tracing::debug!(
            ?sex,
            measurement = %kind,
            requested_week = age_in_weeks,
            reference_week = reference_age,
            "no exact reference row, using nearest age"
        );

        Some(ResolvedReference {
            point: ReferenceCurvePoint {
                sex,
                age_in_weeks: reference_age,
                measurement_type: kind,
                ladder: *ladder,
            },
            exact_match: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(age: u32, base: f64) -> ReferenceCurvePoint {
        ReferenceCurvePoint {
            sex: Sex::Female,
            age_in_weeks: age,
            measurement_type: MeasurementType::Weight,
            ladder: PercentileLadder::new([
                base,
                base + 0.1,
                base + 0.2,
                base + 0.3,
                base + 0.4,
                base + 0.5,
                base + 0.6,
                base + 0.7,
                base + 0.8,
            ]),
        }
    }

    #[test]
    fn builtin_ladders_are_monotonic() {
        let store = ReferenceCurveStore::builtin();
        assert_eq!(store.len(), 60);
        for sex in [Sex::Male, Sex::Female] {
            for kind in MeasurementType::ALL {
                let curve = store.curve(sex, kind);
                assert_eq!(curve.len(), 10);
                assert!(curve.iter().all(|row| row.ladder.is_monotonic()));
            }
        }
    }

    #[test]
    fn nearest_age_breaks_ties_toward_younger_row() {
        let store = ReferenceCurveStore::from_points([point(4, 3.0), point(8, 4.0)])
            .expect("valid store");

        let tie = store
            .resolve(Sex::Female, MeasurementType::Weight, 6)
            .expect("curve exists");
        assert_eq!(tie.point.age_in_weeks, 4);
        assert!(!tie.exact_match);

        let closer_to_older = store
            .resolve(Sex::Female, MeasurementType::Weight, 7)
            .expect("curve exists");
        assert_eq!(closer_to_older.point.age_in_weeks, 8);

        let beyond = store
            .resolve(Sex::Female, MeasurementType::Weight, 300)
            .expect("curve exists");
        assert_eq!(beyond.point.age_in_weeks, 8);
    }

    #[test]
    fn missing_curve_resolves_to_none() {
        let store = ReferenceCurveStore::from_points([point(4, 3.0)]).expect("valid store");
        assert!(store
            .resolve(Sex::Male, MeasurementType::Weight, 4)
            .is_none());
        assert!(store
            .resolve(Sex::Female, MeasurementType::Height, 4)
            .is_none());
    }

    #[test]
    fn duplicate_and_inverted_rows_are_rejected() {
        let duplicate = ReferenceCurveStore::from_points([point(4, 3.0), point(4, 3.1)]);
        assert!(matches!(duplicate, Err(AnalyticsError::Validation(_))));

        let mut inverted = point(8, 4.0);
        inverted.ladder.p97 = 1.0;
        assert!(ReferenceCurveStore::from_points([inverted]).is_err());
    }

    #[test]
    fn json_rows_use_flat_ladder_fields() {
        let json = r#"[{
            "sex": "male", "age_in_weeks": 0, "measurement_type": "weight",
            "p3": 2.5, "p5": 2.6, "p10": 2.8, "p25": 3.0, "p50": 3.3,
            "p75": 3.7, "p90": 3.9, "p95": 4.1, "p97": 4.3
        }]"#;
        let store = ReferenceCurveStore::from_json(json).expect("parses");
        let resolved = store
            .resolve(Sex::Male, MeasurementType::Weight, 0)
            .expect("row");
        assert!(resolved.exact_match);
        assert_eq!(resolved.point.ladder.p50, 3.3);
    }
}
