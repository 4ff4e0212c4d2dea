use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Tuning knobs for every analysis. Missing keys fall back to the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub patterns: PatternConfig,
    pub growth: GrowthThresholds,
    pub bounds: BoundsConfig,
    /// Offset of the child's local time from UTC, used for calendar days and
    /// hour-of-day buckets.
    pub utc_offset_minutes: i32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            patterns: PatternConfig::default(),
            growth: GrowthThresholds::default(),
            bounds: BoundsConfig::default(),
            utc_offset_minutes: 0,
        }
    }
}

impl AnalyticsConfig {
    /// Local offset, falling back to UTC when the configured value is out of range.
    pub fn local_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }
}

/// Activity pattern settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatternConfig {
    /// Gaps between consecutive records longer than this are outliers.
    pub max_interval_hours: u32,
    /// Relative half-over-half change that counts as a trend.
    pub trend_threshold: f64,
    /// Below this many records a category is always `stable`.
    pub min_records_for_trend: usize,
    pub peak_hour_count: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            max_interval_hours: 12,
            trend_threshold: 0.10,
            min_records_for_trend: 4,
            peak_hour_count: 3,
        }
    }
}

/// Growth alert thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GrowthThresholds {
    /// Percentile points between the two latest readings that count as a rapid shift.
    pub rapid_shift_points: u8,
    pub stagnation_min_readings: usize,
    pub stagnation_min_weeks: u32,
}

impl Default for GrowthThresholds {
    fn default() -> Self {
        Self {
            rapid_shift_points: 20,
            stagnation_min_readings: 2,
            stagnation_min_weeks: 4,
        }
    }
}

/// Inclusive range of accepted values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

/// Biologically plausible limits applied before any computation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BoundsConfig {
    pub weight_kg: ValueRange,
    pub height_cm: ValueRange,
    pub head_circumference_cm: ValueRange,
    pub max_age_in_weeks: u32,
    pub max_single_dose_mg: f64,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            weight_kg: ValueRange::new(0.3, 80.0),
            height_cm: ValueRange::new(25.0, 190.0),
            head_circumference_cm: ValueRange::new(18.0, 65.0),
            max_age_in_weeks: 1040,
            max_single_dose_mg: 4000.0,
        }
    }
}
