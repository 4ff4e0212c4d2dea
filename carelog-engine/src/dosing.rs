//! Dose recommendation and same-day safety checks.
//!
//! Both operations are pure functions of the supplied profile and dose
//! history. An unsafe dose is reported through [`SafetyVerdict`]; whether the
//! dose is still logged is up to the caller.

use carelog_core::{
    AnalyticsConfig, AnalyticsError, BoundsConfig, DoseEvent, DoseOutcome, DoseRecommendation,
    DosingBasis, MeasurementType, MedicationProfile, SafetyIssue, SafetyVerdict,
};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};

use crate::validate;

/// Longest re-dosing interval a profile may declare.
const MAX_DOSING_INTERVAL_HOURS: f64 = 24.0 * 7.0;

#[derive(Debug, Clone)]
pub struct MedicationDoseEngine {
    offset: FixedOffset,
    bounds: BoundsConfig,
}

impl MedicationDoseEngine {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            offset: config.local_offset(),
            bounds: config.bounds,
        }
    }

    /// Picks the band for the child's age (and weight for weight-based tables).
    ///
    /// Children younger than the profile minimum always get
    /// [`DoseOutcome::AgeRestricted`]; no neighbouring band is substituted.
    pub fn recommended_dose(
        &self,
        profile: &MedicationProfile,
        age_months: u32,
        weight_kg: Option<f64>,
    ) -> Result<DoseOutcome, AnalyticsError> {
        check_profile(profile)?;
        if let Some(weight) = weight_kg {
            validate::measurement_value(MeasurementType::Weight, weight, &self.bounds)?;
        }

        if age_months < profile.min_age_months {
            tracing::info!(
                medication = %profile.id,
                age_months,
                min_age_months = profile.min_age_months,
                "medication is age restricted"
            );
            return Ok(DoseOutcome::AgeRestricted {
                min_age_months: profile.min_age_months,
                age_months,
            });
        }

        let band = match profile.dosing_table.basis {
            DosingBasis::Age => profile
                .dosing_table
                .bands
                .iter()
                .find(|band| band.matches_age(age_months)),
            DosingBasis::Weight => {
                let Some(weight) = weight_kg else {
                    return Ok(DoseOutcome::WeightRequired);
                };
                profile
                    .dosing_table
                    .bands
                    .iter()
                    .find(|band| band.matches_age(age_months) && band.matches_weight(weight))
            }
        };

        let Some(band) = band else {
            tracing::debug!(
                medication = %profile.id,
                age_months,
                ?weight_kg,
                "no dosing band matches"
            );
            return Ok(DoseOutcome::NoMatchingBand);
        };

        let recommended_dose_mg = band.dose_mg.min_mg;
        Ok(DoseOutcome::Recommended(DoseRecommendation {
            medication_id: profile.id.clone(),
            medication_name: profile.name.clone(),
            dose_range: band.dose_mg,
            recommended_dose_mg,
            volume_ml: profile
                .mg_per_ml()
                .map(|mg_per_ml| recommended_dose_mg / mg_per_ml),
            max_daily_dose_mg: strictest(band.max_daily_dose_mg, profile.max_daily_dose_mg),
            dosing_interval_hours: profile.dosing_interval_hours,
        }))
    }

    /// Checks the daily ceiling over the proposed dose's local calendar day and
    /// the minimum interval since the latest earlier dose.
    ///
    /// The ceiling is the profile's; a profile without one falls back to its
    /// strictest band ceiling. `history` may contain other medications or
    /// children; those rows are ignored.
    pub fn check_dose_safety(
        &self,
        profile: &MedicationProfile,
        proposed: &DoseEvent,
        history: &[DoseEvent],
    ) -> Result<SafetyVerdict, AnalyticsError> {
        check_profile(profile)?;
        self.verdict(profile, daily_ceiling(profile), proposed, history)
    }

    /// Like [`check_dose_safety`](Self::check_dose_safety), but against the
    /// ceiling of the band the child was given `recommendation` from.
    pub fn check_recommended_dose_safety(
        &self,
        profile: &MedicationProfile,
        recommendation: &DoseRecommendation,
        proposed: &DoseEvent,
        history: &[DoseEvent],
    ) -> Result<SafetyVerdict, AnalyticsError> {
        check_profile(profile)?;
        if recommendation.medication_id != profile.id {
            return Err(AnalyticsError::invalid(
                "medication_id",
                format!(
                    "recommendation is for {} but the profile is {}",
                    recommendation.medication_id, profile.id
                ),
            ));
        }
        let ceiling = strictest(recommendation.max_daily_dose_mg, profile.max_daily_dose_mg)
            .or_else(|| daily_ceiling(profile));
        self.verdict(profile, ceiling, proposed, history)
    }

    fn verdict(
        &self,
        profile: &MedicationProfile,
        max_daily_dose_mg: Option<f64>,
        proposed: &DoseEvent,
        history: &[DoseEvent],
    ) -> Result<SafetyVerdict, AnalyticsError> {
        if proposed.medication_id != profile.id {
            return Err(AnalyticsError::invalid(
                "medication_id",
                format!(
                    "proposed dose is for {} but the profile is {}",
                    proposed.medication_id, profile.id
                ),
            ));
        }

        let proposed_mg = to_mg(profile, proposed)?;
        validate::dose_amount(proposed_mg, &self.bounds)?;

        let mut relevant = Vec::new();
        for event in history {
            if event.child_id != proposed.child_id || event.medication_id != profile.id {
                continue;
            }
            let mg = to_mg(profile, event)?;
            validate::dose_amount(mg, &self.bounds).map_err(|err| {
                AnalyticsError::invalid(
                    "history",
                    format!("dose logged at {}: {err}", event.administered_at.to_rfc3339()),
                )
            })?;
            relevant.push((event.administered_at, mg));
        }

        let day = self.local_day(proposed.administered_at);
        let current_daily_total_mg: f64 = relevant
            .iter()
            .filter(|(at, _)| self.local_day(*at) == day)
            .map(|(_, mg)| mg)
            .sum();

        let mut issues = Vec::new();

        if let Some(max_daily) = max_daily_dose_mg {
            if current_daily_total_mg + proposed_mg > max_daily {
                issues.push(SafetyIssue::MaxDailyDoseExceeded {
                    current_daily_total_mg,
                    proposed_mg,
                    max_daily_dose_mg: max_daily,
                });
            }
        }

        let last_dose_at = relevant
            .iter()
            .map(|(at, _)| *at)
            .filter(|at| *at <= proposed.administered_at)
            .max();
        let mut next_safe_time = None;
        if let Some(last) = last_dose_at {
            let earliest = last
                .checked_add_signed(interval(profile.dosing_interval_hours)?)
                .ok_or_else(|| {
                    AnalyticsError::invalid(
                        "dosing_interval_hours",
                        "next dose time is out of range",
                    )
                })?;
            if proposed.administered_at < earliest {
                next_safe_time = Some(earliest);
                issues.push(SafetyIssue::IntervalTooShort {
                    last_dose_at: last,
                    next_safe_time: earliest,
                });
            }
        }

        let verdict = SafetyVerdict {
            safe: issues.is_empty(),
            warning: issues.first().map(|issue| issue.message().to_string()),
            current_daily_total_mg,
            proposed_mg,
            max_daily_dose_mg,
            remaining_daily_mg: max_daily_dose_mg
                .map(|max_daily| (max_daily - current_daily_total_mg).max(0.0)),
            last_dose_at,
            next_safe_time,
            issues,
        };

        if !verdict.safe {
            tracing::warn!(
                medication = %profile.id,
                child = %proposed.child_id,
                current_daily_total_mg,
                proposed_mg,
                warning = verdict.warning.as_deref().unwrap_or_default(),
                "proposed dose failed safety check"
            );
        }
        Ok(verdict)
    }

    fn local_day(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }
}

fn check_profile(profile: &MedicationProfile) -> Result<(), AnalyticsError> {
    let hours = profile.dosing_interval_hours;
    if !hours.is_finite() || !(0.0..=MAX_DOSING_INTERVAL_HOURS).contains(&hours) {
        return Err(AnalyticsError::invalid(
            "dosing_interval_hours",
            format!("{hours} is not an interval between 0 and {MAX_DOSING_INTERVAL_HOURS} hours"),
        ));
    }
    let band_ceilings = profile
        .dosing_table
        .bands
        .iter()
        .filter_map(|band| band.max_daily_dose_mg);
    for max_daily in profile.max_daily_dose_mg.into_iter().chain(band_ceilings) {
        if !max_daily.is_finite() || max_daily <= 0.0 {
            return Err(AnalyticsError::invalid(
                "max_daily_dose_mg",
                format!("{max_daily} is not a valid ceiling"),
            ));
        }
    }
    Ok(())
}

/// Profile ceiling, else the strictest band ceiling.
fn daily_ceiling(profile: &MedicationProfile) -> Option<f64> {
    profile.max_daily_dose_mg.or_else(|| {
        profile
            .dosing_table
            .bands
            .iter()
            .filter_map(|band| band.max_daily_dose_mg)
            .reduce(f64::min)
    })
}

fn strictest(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn to_mg(profile: &MedicationProfile, event: &DoseEvent) -> Result<f64, AnalyticsError> {
    profile
        .amount_in_mg(event.amount, event.unit)
        .ok_or_else(|| {
            AnalyticsError::invalid(
                "unit",
                format!(
                    "{} is logged in {} but its strength is unknown",
                    profile.name,
                    event.unit.label()
                ),
            )
        })
}

fn interval(hours: f64) -> Result<Duration, AnalyticsError> {
    Duration::try_seconds((hours * 3600.0).round() as i64).ok_or_else(|| {
        AnalyticsError::invalid("dosing_interval_hours", format!("{hours} is out of range"))
    })
}

/// Completed calendar months between birth and `on`; zero before birth.
pub fn age_in_months(date_of_birth: NaiveDate, on: NaiveDate) -> u32 {
    let mut months = (on.year() - date_of_birth.year()) * 12
        + on.month() as i32
        - date_of_birth.month() as i32;
    if on.day() < date_of_birth.day() {
        months -= 1;
    }
    u32::try_from(months).unwrap_or(0)
}

/// [`MedicationDoseEngine::recommended_dose`] with default configuration.
pub fn recommended_dose(
    profile: &MedicationProfile,
    age_months: u32,
    weight_kg: Option<f64>,
) -> Result<DoseOutcome, AnalyticsError> {
    MedicationDoseEngine::new(&AnalyticsConfig::default()).recommended_dose(
        profile, age_months, weight_kg,
    )
}

/// [`MedicationDoseEngine::check_dose_safety`] with the given configuration.
pub fn check_dose_safety(
    profile: &MedicationProfile,
    proposed: &DoseEvent,
    history: &[DoseEvent],
    config: &AnalyticsConfig,
) -> Result<SafetyVerdict, AnalyticsError> {
    MedicationDoseEngine::new(config).check_dose_safety(profile, proposed, history)
}
