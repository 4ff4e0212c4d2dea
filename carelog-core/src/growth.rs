//! Anthropometric measurements and the percentile ladder they are graded on.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sex used to select a reference curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn label(self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

/// Physical quantity a reference curve describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementType {
    Weight,
    Height,
    HeadCircumference,
}

impl MeasurementType {
    pub const ALL: [MeasurementType; 3] = [
        MeasurementType::Weight,
        MeasurementType::Height,
        MeasurementType::HeadCircumference,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MeasurementType::Weight => "Weight",
            MeasurementType::Height => "Height",
            MeasurementType::HeadCircumference => "Head circumference",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            MeasurementType::Weight => "kg",
            MeasurementType::Height | MeasurementType::HeadCircumference => "cm",
        }
    }
}

impl fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single growth check. Corrections arrive as new measurements; existing
/// ones are never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    pub date: NaiveDate,
    pub age_in_weeks: u32,
    pub sex: Sex,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub head_circumference_cm: Option<f64>,
}

impl Measurement {
    pub fn value(&self, kind: MeasurementType) -> Option<f64> {
        match kind {
            MeasurementType::Weight => self.weight_kg,
            MeasurementType::Height => self.height_cm,
            MeasurementType::HeadCircumference => self.head_circumference_cm,
        }
    }

    /// Recorded values in `MeasurementType::ALL` order.
    pub fn values(&self) -> impl Iterator<Item = (MeasurementType, f64)> + '_ {
        MeasurementType::ALL
            .into_iter()
            .filter_map(|kind| self.value(kind).map(|value| (kind, value)))
    }

    pub fn has_any_value(&self) -> bool {
        self.values().next().is_some()
    }
}

/// Band on the fixed growth-chart ladder.
///
/// `P99` stands for "above the 97th line"; `P3` for "at or below the 3rd line".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Percentile {
    P3,
    P5,
    P10,
    P25,
    P50,
    P75,
    P90,
    P95,
    P97,
    P99,
}

impl Percentile {
    pub const LADDER: [Percentile; 10] = [
        Percentile::P3,
        Percentile::P5,
        Percentile::P10,
        Percentile::P25,
        Percentile::P50,
        Percentile::P75,
        Percentile::P90,
        Percentile::P95,
        Percentile::P97,
        Percentile::P99,
    ];

    pub const fn value(self) -> u8 {
        match self {
            Percentile::P3 => 3,
            Percentile::P5 => 5,
            Percentile::P10 => 10,
            Percentile::P25 => 25,
            Percentile::P50 => 50,
            Percentile::P75 => 75,
            Percentile::P90 => 90,
            Percentile::P95 => 95,
            Percentile::P97 => 97,
            Percentile::P99 => 99,
        }
    }

    pub fn is_low_extreme(self) -> bool {
        self == Percentile::P3
    }

    pub fn is_high_extreme(self) -> bool {
        self == Percentile::P99
    }

    /// Distance in percentile points between two bands.
    pub fn points_between(self, other: Percentile) -> u8 {
        self.value().abs_diff(other.value())
    }
}

impl From<Percentile> for u8 {
    fn from(percentile: Percentile) -> Self {
        percentile.value()
    }
}

impl TryFrom<u8> for Percentile {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Percentile::LADDER
            .into_iter()
            .find(|band| band.value() == value)
            .ok_or_else(|| format!("{value} is not a growth-chart percentile"))
    }
}

impl fmt::Display for Percentile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Percentile::P3 => f.write_str("<=3rd"),
            Percentile::P99 => f.write_str(">97th"),
            other => write!(f, "{}th", other.value()),
        }
    }
}

/// Nine population boundaries for one (sex, age, type) row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PercentileLadder {
    pub p3: f64,
    pub p5: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p97: f64,
}

impl PercentileLadder {
    pub const fn new(values: [f64; 9]) -> Self {
        let [p3, p5, p10, p25, p50, p75, p90, p95, p97] = values;
        Self {
            p3,
            p5,
            p10,
            p25,
            p50,
            p75,
            p90,
            p95,
            p97,
        }
    }

    pub fn boundaries(&self) -> [(Percentile, f64); 9] {
        [
            (Percentile::P3, self.p3),
            (Percentile::P5, self.p5),
            (Percentile::P10, self.p10),
            (Percentile::P25, self.p25),
            (Percentile::P50, self.p50),
            (Percentile::P75, self.p75),
            (Percentile::P90, self.p90),
            (Percentile::P95, self.p95),
            (Percentile::P97, self.p97),
        ]
    }

    pub fn is_monotonic(&self) -> bool {
        let bounds = self.boundaries();
        bounds.iter().all(|(_, value)| value.is_finite())
            && bounds.windows(2).all(|pair| pair[0].1 <= pair[1].1)
    }

    /// First boundary the value does not exceed, or `P99` above the top line.
    pub fn classify(&self, value: f64) -> Percentile {
        self.boundaries()
            .into_iter()
            .find(|(_, boundary)| value <= *boundary)
            .map(|(band, _)| band)
            .unwrap_or(Percentile::P99)
    }
}

/// One row of a reference curve: the ladder for a (sex, age, type).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ReferenceCurvePoint {
    pub sex: Sex,
    pub age_in_weeks: u32,
    pub measurement_type: MeasurementType,
    #[serde(flatten)]
    pub ladder: PercentileLadder,
}

/// Outcome of grading one value against the reference table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PercentileResult {
    pub measurement_type: MeasurementType,
    pub value: f64,
    pub percentile: Percentile,
    /// Age of the reference row actually used.
    pub reference_age_in_weeks: u32,
    /// `false` when the nearest-age row stood in for a missing exact row.
    pub exact_match: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn newborn_boy_weight() -> PercentileLadder {
        PercentileLadder::new([2.5, 2.6, 2.8, 3.0, 3.3, 3.7, 3.9, 4.1, 4.3])
    }

    #[test]
    fn classify_uses_first_boundary_not_exceeded() {
        let ladder = newborn_boy_weight();
        assert_eq!(ladder.classify(2.4), Percentile::P3);
        assert_eq!(ladder.classify(2.5), Percentile::P3);
        assert_eq!(ladder.classify(2.55), Percentile::P5);
        assert_eq!(ladder.classify(3.3), Percentile::P50);
        assert_eq!(ladder.classify(4.2), Percentile::P97);
        assert_eq!(ladder.classify(5.0), Percentile::P99);
    }

    #[test]
    fn ladder_rejects_inverted_boundaries() {
        let mut ladder = newborn_boy_weight();
        assert!(ladder.is_monotonic());
        ladder.p75 = 3.1;
        ladder.p50 = 3.2;
        assert!(!ladder.is_monotonic());
    }

    #[test]
    fn percentile_serializes_as_plain_number() {
        let json = serde_json::to_string(&Percentile::P25).expect("serialize");
        assert_eq!(json, "25");
        let parsed: Percentile = serde_json::from_str("97").expect("deserialize");
        assert_eq!(parsed, Percentile::P97);
        assert!(serde_json::from_str::<Percentile>("42").is_err());
    }

    #[test]
    fn measurement_values_skip_missing_fields() {
        let measurement = Measurement {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).expect("date"),
            age_in_weeks: 8,
            sex: Sex::Female,
            height_cm: None,
            weight_kg: Some(5.1),
            head_circumference_cm: Some(38.3),
        };
        let kinds: Vec<_> = measurement.values().map(|(kind, _)| kind).collect();
        assert_eq!(
            kinds,
            vec![MeasurementType::Weight, MeasurementType::HeadCircumference]
        );
        assert!(measurement.has_any_value());
    }
}
