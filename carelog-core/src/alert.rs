use serde::{Deserialize, Serialize};

use crate::growth::MeasurementType;

/// Ordered from least to most severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Low,
    Medium,
    High,
    Urgent,
}

impl AlertSeverity {
    pub fn label(self) -> &'static str {
        match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Urgent => "urgent",
        }
    }
}

/// Rule that raised a [`GrowthAlert`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LowPercentile,
    HighPercentile,
    RapidShift,
    NoGrowth,
}

/// A concerning growth finding. Produced per analysis, never stored here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrowthAlert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub measurement_type: MeasurementType,
    pub severity: AlertSeverity,
    pub message: String,
    #[serde(default)]
    pub recommendation: Option<String>,
    pub requires_consultation: bool,
}
