//! Store port: read queries the host application answers.
//!
//! The analytics never perform I/O themselves; callers fetch rows through a
//! [`HealthStore`] and pass them in. [`MemoryStore`] backs tests, the CLI and
//! the WASM bridge from a JSON [`ChildBundle`].

use std::collections::HashMap;

use carelog_core::{
    ActivityRecord, ChildProfile, DoseEvent, Measurement, MeasurementType, MedicationProfile,
    Milestone, ReferenceCurvePoint, ReportPeriod, Sex,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reference::ReferenceCurveStore;
use carelog_core::AnalyticsError;

/// Read-only queries against the host's persistence layer.
pub trait HealthStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Most-recent-first, at most `limit` rows.
    fn measurements_for(
        &self,
        child_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Measurement>, Self::Error>;

    /// Records whose `started_at` falls in `[start, end)`, in any order.
    fn activity_records_for(
        &self,
        child_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ActivityRecord>, Self::Error>;

    /// Doses administered at or after `since`.
    fn dose_history_for(
        &self,
        child_id: &str,
        medication_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<DoseEvent>, Self::Error>;

    fn reference_curve_for(
        &self,
        sex: Sex,
        kind: MeasurementType,
    ) -> Result<Vec<ReferenceCurvePoint>, Self::Error>;

    fn medication_profile(
        &self,
        medication_id: &str,
    ) -> Result<Option<MedicationProfile>, Self::Error>;
}

/// Loads every curve through the store once and freezes it.
pub fn load_reference_curves<S: HealthStore>(
    store: &S,
) -> Result<ReferenceCurveStore, AnalyticsError> {
    let mut points = Vec::new();
    for sex in [Sex::Male, Sex::Female] {
        for kind in MeasurementType::ALL {
            let curve = store
                .reference_curve_for(sex, kind)
                .map_err(|err| AnalyticsError::Store(err.to_string()))?;
            points.extend(curve);
        }
    }
    ReferenceCurveStore::from_points(points)
}

#[derive(Debug, thiserror::Error)]
pub enum MemoryStoreError {
    #[error("unknown child {0}")]
    UnknownChild(String),
}

/// Everything known about one child, as exported by the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChildBundle {
    pub child: ChildProfile,
    #[serde(default)]
    pub period: Option<ReportPeriod>,
    #[serde(default)]
    pub measurements: Vec<Measurement>,
    #[serde(default)]
    pub activities: Vec<ActivityRecord>,
    #[serde(default)]
    pub doses: Vec<DoseEvent>,
    #[serde(default)]
    pub medications: Vec<MedicationProfile>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    /// Replaces the built-in curves when present.
    #[serde(default)]
    pub reference_curves: Vec<ReferenceCurvePoint>,
}

#[derive(Debug, Clone, Default)]
struct ChildRows {
    measurements: Vec<Measurement>,
    activities: Vec<ActivityRecord>,
    doses: Vec<DoseEvent>,
}

/// In-memory [`HealthStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    children: HashMap<String, ChildRows>,
    medications: HashMap<String, MedicationProfile>,
    curves: ReferenceCurveStore,
}

impl MemoryStore {
    pub fn new(curves: ReferenceCurveStore) -> Self {
        Self {
            curves,
            ..Self::default()
        }
    }

    /// Store holding one bundle. Bundled curves replace the built-in ones.
    pub fn from_bundle(bundle: &ChildBundle) -> Result<Self, AnalyticsError> {
        let curves = if bundle.reference_curves.is_empty() {
            ReferenceCurveStore::builtin()
        } else {
            ReferenceCurveStore::from_points(bundle.reference_curves.iter().copied())?
        };
        let mut store = Self::new(curves);
        for profile in &bundle.medications {
            store.add_medication(profile.clone());
        }
        store.add_child(
            &bundle.child.id,
            bundle.measurements.clone(),
            bundle.activities.clone(),
            bundle.doses.clone(),
        );
        Ok(store)
    }

    pub fn add_child(
        &mut self,
        child_id: &str,
        measurements: Vec<Measurement>,
        activities: Vec<ActivityRecord>,
        doses: Vec<DoseEvent>,
    ) {
        let rows = self.children.entry(child_id.to_string()).or_default();
        rows.measurements.extend(measurements);
        rows.measurements.sort_by(|a, b| b.date.cmp(&a.date));
        rows.activities.extend(activities);
        rows.doses.extend(doses);
    }

    pub fn add_medication(&mut self, profile: MedicationProfile) {
        self.medications.insert(profile.id.clone(), profile);
    }

    fn rows(&self, child_id: &str) -> Result<&ChildRows, MemoryStoreError> {
        self.children
            .get(child_id)
            .ok_or_else(|| MemoryStoreError::UnknownChild(child_id.to_string()))
    }
}

impl HealthStore for MemoryStore {
    type Error = MemoryStoreError;

    fn measurements_for(
        &self,
        child_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Measurement>, Self::Error> {
        let rows = self.rows(child_id)?;
        let take = limit.unwrap_or(rows.measurements.len());
        Ok(rows.measurements.iter().take(take).cloned().collect())
    }

    fn activity_records_for(
        &self,
        child_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ActivityRecord>, Self::Error> {
        Ok(self
            .rows(child_id)?
            .activities
            .iter()
            .filter(|record| record.started_at >= start && record.started_at < end)
            .cloned()
            .collect())
    }

    fn dose_history_for(
        &self,
        child_id: &str,
        medication_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<DoseEvent>, Self::Error> {
        Ok(self
            .rows(child_id)?
            .doses
            .iter()
            .filter(|dose| dose.medication_id == medication_id && dose.administered_at >= since)
            .cloned()
            .collect())
    }

    fn reference_curve_for(
        &self,
        sex: Sex,
        kind: MeasurementType,
    ) -> Result<Vec<ReferenceCurvePoint>, Self::Error> {
        Ok(self.curves.curve(sex, kind))
    }

    fn medication_profile(
        &self,
        medication_id: &str,
    ) -> Result<Option<MedicationProfile>, Self::Error> {
        Ok(self.medications.get(medication_id).cloned())
    }
}
