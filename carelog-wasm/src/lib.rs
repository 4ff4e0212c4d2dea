//! Framework-neutral WASM <-> JavaScript bridge.

use std::sync::OnceLock;

use carelog_core::{
    ActivityRecord, AnalyticsConfig, AnalyticsError, DoseEvent, MeasurementType,
    MedicationProfile, Sex,
};
use carelog_engine::{PercentileCalculator, ReferenceCurveStore};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

/// Subset of [`AnalyticsConfig`] a page may override; the rest stays default.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct JsAnalyticsConfig {
    #[serde(default)]
    utc_offset_minutes: Option<i32>,
    #[serde(default)]
    max_interval_hours: Option<u32>,
    #[serde(default)]
    trend_threshold: Option<f64>,
    #[serde(default)]
    rapid_shift_points: Option<u8>,
}

impl From<JsAnalyticsConfig> for AnalyticsConfig {
    fn from(cfg: JsAnalyticsConfig) -> Self {
        let mut base = AnalyticsConfig::default();
        if let Some(minutes) = cfg.utc_offset_minutes {
            base.utc_offset_minutes = minutes;
        }
        if let Some(hours) = cfg.max_interval_hours {
            base.patterns.max_interval_hours = hours;
        }
        if let Some(threshold) = cfg.trend_threshold {
            base.patterns.trend_threshold = threshold;
        }
        if let Some(points) = cfg.rapid_shift_points {
            base.growth.rapid_shift_points = points;
        }
        base
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PercentileRequest {
    sex: Sex,
    age_in_weeks: u32,
    measurement_type: MeasurementType,
    value: f64,
}

fn references() -> &'static ReferenceCurveStore {
    static REFERENCES: OnceLock<ReferenceCurveStore> = OnceLock::new();
    REFERENCES.get_or_init(ReferenceCurveStore::builtin)
}

/// `{ sex, ageInWeeks, measurementType, value }` to a percentile result, or
/// `null` when no reference curve covers the request.
#[wasm_bindgen]
pub fn classify_percentile(request: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    init();
    let request: PercentileRequest = read(request, "percentile request")?;
    let config = read_config(config)?;
    let result = PercentileCalculator::with_bounds(references(), config.bounds)
        .classify(
            request.sex,
            request.age_in_weeks,
            request.measurement_type,
            request.value,
        )
        .map_err(js_error)?;
    write(&result, "percentile result")
}

#[wasm_bindgen]
pub fn analyze_patterns(records: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    init();
    let records: Vec<ActivityRecord> = read(records, "activity records")?;
    let summaries =
        carelog_engine::analyze_patterns(&records, &read_config(config)?).map_err(js_error)?;
    write(&summaries, "pattern summaries")
}

/// Structured report for a child bundle.
#[wasm_bindgen]
pub fn analyze_bundle(bundle: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    init();
    let bundle: serde_json::Value = read(bundle, "child bundle")?;
    let report =
        carelog_engine::analyze_bundle_value(&bundle, &read_config(config)?).map_err(js_error)?;
    write(&report, "report")
}

/// Plain-text export for a child bundle.
#[wasm_bindgen]
pub fn build_report_text(bundle: JsValue, config: Option<JsValue>) -> Result<String, JsValue> {
    init();
    let bundle: serde_json::Value = read(bundle, "child bundle")?;
    let report =
        carelog_engine::analyze_bundle_value(&bundle, &read_config(config)?).map_err(js_error)?;
    Ok(carelog_engine::render_text(&report))
}

#[wasm_bindgen]
pub fn check_dose_safety(
    profile: JsValue,
    proposed: JsValue,
    history: JsValue,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    init();
    let profile: MedicationProfile = read(profile, "medication profile")?;
    let proposed: DoseEvent = read(proposed, "proposed dose")?;
    let history: Vec<DoseEvent> = read(history, "dose history")?;
    let verdict =
        carelog_engine::check_dose_safety(&profile, &proposed, &history, &read_config(config)?)
            .map_err(js_error)?;
    write(&verdict, "safety verdict")
}

fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn read<T: DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    from_value(value).map_err(|err| JsValue::from_str(&format!("Could not read {what}: {err}")))
}

fn write<T: Serialize>(value: &T, what: &str) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|err| JsValue::from_str(&format!("Could not serialize {what}: {err}")))
}

fn read_config(config: Option<JsValue>) -> Result<AnalyticsConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsAnalyticsConfig = read(js_cfg, "config")?;
            Ok(AnalyticsConfig::from(cfg))
        }
        _ => Ok(AnalyticsConfig::default()),
    }
}

fn js_error(err: AnalyticsError) -> JsValue {
    JsValue::from_str(&format_analytics_error(err))
}

fn format_analytics_error(err: AnalyticsError) -> String {
    format!("Analytics error: {err}")
}
