//! Medication reference data, dose log entries and the verdicts computed over them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a dosing table is keyed on age alone or also on weight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DosingBasis {
    Age,
    Weight,
}

/// Milligram range for a single dose.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DoseRange {
    pub min_mg: f64,
    pub max_mg: f64,
}

/// One row of a dosing table. Upper bounds are exclusive; `None` means open-ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DosingBand {
    pub min_age_months: u32,
    #[serde(default)]
    pub max_age_months: Option<u32>,
    #[serde(default)]
    pub min_weight_kg: Option<f64>,
    #[serde(default)]
    pub max_weight_kg: Option<f64>,
    pub dose_mg: DoseRange,
    /// Overrides the profile-wide daily ceiling for this band.
    #[serde(default)]
    pub max_daily_dose_mg: Option<f64>,
}

impl DosingBand {
    pub fn matches_age(&self, age_months: u32) -> bool {
        age_months >= self.min_age_months
            && self.max_age_months.map_or(true, |max| age_months < max)
    }

    pub fn matches_weight(&self, weight_kg: f64) -> bool {
        self.min_weight_kg.map_or(true, |min| weight_kg >= min)
            && self.max_weight_kg.map_or(true, |max| weight_kg < max)
    }
}

/// Ordered bands; the first matching band wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DosingTable {
    pub basis: DosingBasis,
    pub bands: Vec<DosingBand>,
}

fn default_strength_volume_ml() -> f64 {
    5.0
}

/// Immutable reference data for one medication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationProfile {
    pub id: String,
    pub name: String,
    /// Milligrams contained in `strength_volume_ml` of a liquid preparation.
    #[serde(default)]
    pub strength_mg: Option<f64>,
    #[serde(default = "default_strength_volume_ml")]
    pub strength_volume_ml: f64,
    pub min_age_months: u32,
    #[serde(default)]
    pub max_daily_dose_mg: Option<f64>,
    pub dosing_interval_hours: f64,
    pub dosing_table: DosingTable,
}

impl MedicationProfile {
    /// Converts a logged amount to milligrams. `None` when the unit is
    /// millilitres and the preparation strength is unknown.
    pub fn amount_in_mg(&self, amount: f64, unit: DoseUnit) -> Option<f64> {
        match unit {
            DoseUnit::Mg => Some(amount),
            DoseUnit::Ml => self.mg_per_ml().map(|mg_per_ml| amount * mg_per_ml),
        }
    }

    pub fn mg_per_ml(&self) -> Option<f64> {
        let strength = self.strength_mg?;
        if self.strength_volume_ml > 0.0 {
            Some(strength / self.strength_volume_ml)
        } else {
            None
        }
    }
}

/// Unit a dose amount was logged in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DoseUnit {
    Mg,
    Ml,
}

impl DoseUnit {
    pub fn label(self) -> &'static str {
        match self {
            DoseUnit::Mg => "mg",
            DoseUnit::Ml => "ml",
        }
    }
}

/// Append-only entry of the dose log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoseEvent {
    pub child_id: String,
    pub medication_id: String,
    pub amount: f64,
    pub unit: DoseUnit,
    pub administered_at: DateTime<Utc>,
}

/// Dose for the band matching the child.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoseRecommendation {
    pub medication_id: String,
    pub medication_name: String,
    pub dose_range: DoseRange,
    /// Lower end of the band's range.
    pub recommended_dose_mg: f64,
    /// Liquid volume for `recommended_dose_mg` when the strength is known.
    pub volume_ml: Option<f64>,
    pub max_daily_dose_mg: Option<f64>,
    pub dosing_interval_hours: f64,
}

/// A recommended dose, or the reason none can be given.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DoseOutcome {
    Recommended(DoseRecommendation),
    AgeRestricted { min_age_months: u32, age_months: u32 },
    WeightRequired,
    NoMatchingBand,
}

impl DoseOutcome {
    pub fn recommendation(&self) -> Option<&DoseRecommendation> {
        match self {
            DoseOutcome::Recommended(recommendation) => Some(recommendation),
            _ => None,
        }
    }

    pub fn is_age_restricted(&self) -> bool {
        matches!(self, DoseOutcome::AgeRestricted { .. })
    }
}

/// A single failed safety check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum SafetyIssue {
    MaxDailyDoseExceeded {
        current_daily_total_mg: f64,
        proposed_mg: f64,
        max_daily_dose_mg: f64,
    },
    IntervalTooShort {
        last_dose_at: DateTime<Utc>,
        next_safe_time: DateTime<Utc>,
    },
}

impl SafetyIssue {
    pub fn message(&self) -> &'static str {
        match self {
            SafetyIssue::MaxDailyDoseExceeded { .. } => "max dose exceeded",
            SafetyIssue::IntervalTooShort { .. } => "dosing interval not yet elapsed",
        }
    }
}

/// Safety assessment of a proposed dose. Unsafe verdicts are results, not errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafetyVerdict {
    pub safe: bool,
    /// Message of the first issue found.
    pub warning: Option<String>,
    pub current_daily_total_mg: f64,
    pub proposed_mg: f64,
    pub max_daily_dose_mg: Option<f64>,
    pub remaining_daily_mg: Option<f64>,
    pub last_dose_at: Option<DateTime<Utc>>,
    pub next_safe_time: Option<DateTime<Utc>>,
    pub issues: Vec<SafetyIssue>,
}
