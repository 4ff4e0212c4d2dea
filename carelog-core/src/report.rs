//! Structured report handed to the text renderer or serialized for export.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::activity::PatternSummary;
use crate::alert::GrowthAlert;
use crate::growth::{MeasurementType, Percentile, Sex};

/// Identity and birth details of the child a report is about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChildProfile {
    pub id: String,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub sex: Sex,
}

/// Inclusive date range the report covers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportPeriod {
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Developmental milestone, achieved or pending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Milestone {
    pub title: String,
    #[serde(default)]
    pub achieved_on: Option<NaiveDate>,
    #[serde(default)]
    pub note: Option<String>,
}

/// One recorded value and its band, when a reference curve exists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GrowthReading {
    pub measurement_type: MeasurementType,
    pub value: f64,
    pub percentile: Option<Percentile>,
}

/// Readings taken at one growth check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrowthEntry {
    pub date: NaiveDate,
    pub age_in_weeks: u32,
    pub readings: Vec<GrowthReading>,
}

/// Everything shown for a child over one period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub child: ChildProfile,
    pub period: ReportPeriod,
    /// Chronological, oldest first.
    pub growth: Vec<GrowthEntry>,
    pub patterns: Vec<PatternSummary>,
    pub alerts: Vec<GrowthAlert>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub concerns: Vec<String>,
}
