//! Feeding, sleep and nappy logs plus the summaries derived from them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Kind of logged care activity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    Feeding,
    Sleep,
    Diaper,
}

impl ActivityCategory {
    pub const ALL: [ActivityCategory; 3] = [
        ActivityCategory::Feeding,
        ActivityCategory::Sleep,
        ActivityCategory::Diaper,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ActivityCategory::Feeding => "Feeding",
            ActivityCategory::Sleep => "Sleep",
            ActivityCategory::Diaper => "Nappy",
        }
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One logged activity. `ended_at` is empty while the activity is running.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityRecord {
    pub child_id: String,
    pub category: ActivityCategory,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    /// Free-form refinement such as `breast`, `bottle`, `wet`, `dirty`, `nap`.
    #[serde(default)]
    pub subtype: String,
    /// Millilitres for bottle feeds; unused by other categories.
    #[serde(default)]
    pub quantity: Option<f64>,
}

impl ActivityRecord {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }
}

/// Direction of change between the two halves of a log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Worsening,
    Stable,
}

impl Trend {
    pub fn label(self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Worsening => "worsening",
            Trend::Stable => "stable",
        }
    }
}

/// Statistics for one category over the analysed window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternSummary {
    pub category: ActivityCategory,
    pub record_count: usize,
    /// Records still running (no `ended_at`).
    pub open_count: usize,
    pub average_interval_minutes: Option<f64>,
    pub average_duration_minutes: Option<f64>,
    pub total_duration_minutes: f64,
    pub records_per_day: Option<f64>,
    pub average_quantity: Option<f64>,
    /// Most frequent local hours of day, busiest first.
    pub peak_hours: Vec<u32>,
    #[serde(default)]
    pub subtype_counts: BTreeMap<String, usize>,
    pub trend: Trend,
}
