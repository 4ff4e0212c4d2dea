//! Domain types shared by the child health analytics engine.
//!
//! The crate holds plain data only: measurements, activity logs, medication
//! reference data, the derived results the engine produces and the knobs that
//! tune it. All computation lives in `carelog-engine`.

pub mod activity;
pub mod alert;
pub mod config;
pub mod error;
pub mod growth;
pub mod medication;
pub mod report;

pub use activity::{ActivityCategory, ActivityRecord, PatternSummary, Trend};
pub use alert::{AlertSeverity, AlertType, GrowthAlert};
pub use config::{AnalyticsConfig, BoundsConfig, GrowthThresholds, PatternConfig, ValueRange};
pub use error::AnalyticsError;
pub use growth::{
    Measurement, MeasurementType, Percentile, PercentileLadder, PercentileResult,
    ReferenceCurvePoint, Sex,
};
pub use medication::{
    DoseEvent, DoseOutcome, DoseRange, DoseRecommendation, DoseUnit, DosingBand, DosingBasis,
    DosingTable, MedicationProfile, SafetyIssue, SafetyVerdict,
};
pub use report::{ChildProfile, GrowthEntry, GrowthReading, Milestone, Report, ReportPeriod};
