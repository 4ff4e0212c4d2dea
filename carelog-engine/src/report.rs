//! Composes analysis results into a [`Report`] and renders the text export.
//!
//! The text layout is an export format read by clinicians: section headers,
//! field order and `dd/mm/yyyy` dates must stay stable between releases.

use carelog_core::{
    ActivityCategory, AlertSeverity, AnalyticsError, BoundsConfig, ChildProfile, GrowthAlert,
    GrowthEntry, GrowthReading, Measurement, Milestone, PatternSummary, Report, ReportPeriod, Trend,
};
use chrono::NaiveDate;

use crate::percentile::PercentileCalculator;
use crate::reference::ReferenceCurveStore;

const DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, Copy)]
pub struct ReportAssembler<'a> {
    calculator: PercentileCalculator<'a>,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(store: &'a ReferenceCurveStore) -> Self {
        Self::with_bounds(store, BoundsConfig::default())
    }

    pub fn with_bounds(store: &'a ReferenceCurveStore, bounds: BoundsConfig) -> Self {
        Self {
            calculator: PercentileCalculator::with_bounds(store, bounds),
        }
    }

    /// Measurements may arrive in any order; the report lists them oldest first.
    pub fn build(
        &self,
        child: &ChildProfile,
        period: ReportPeriod,
        measurements: &[Measurement],
        patterns: &[PatternSummary],
        alerts: &[GrowthAlert],
        milestones: &[Milestone],
    ) -> Result<Report, AnalyticsError> {
        let mut growth = measurements
            .iter()
            .map(|measurement| self.growth_entry(measurement))
            .collect::<Result<Vec<_>, _>>()?;
        growth.sort_by_key(|entry| entry.date);

        let mut patterns = patterns.to_vec();
        patterns.sort_by_key(|summary| summary.category);

        let mut milestones = milestones.to_vec();
        milestones.sort_by(|a, b| a.achieved_on.cmp(&b.achieved_on).then(a.title.cmp(&b.title)));

        Ok(Report {
            child: child.clone(),
            period,
            growth,
            concerns: concerns(&patterns, alerts),
            patterns,
            alerts: alerts.to_vec(),
            milestones,
        })
    }

    fn growth_entry(&self, measurement: &Measurement) -> Result<GrowthEntry, AnalyticsError> {
        let readings = measurement
            .values()
            .map(|(kind, value)| {
                let graded = self.calculator.classify(
                    measurement.sex,
                    measurement.age_in_weeks,
                    kind,
                    value,
                )?;
                Ok(GrowthReading {
                    measurement_type: kind,
                    value,
                    percentile: graded.map(|result| result.percentile),
                })
            })
            .collect::<Result<Vec<_>, AnalyticsError>>()?;

        Ok(GrowthEntry {
            date: measurement.date,
            age_in_weeks: measurement.age_in_weeks,
            readings,
        })
    }
}

/// Free-function form of [`ReportAssembler::build`] without milestones.
pub fn build_report(
    store: &ReferenceCurveStore,
    child: &ChildProfile,
    period: ReportPeriod,
    measurements: &[Measurement],
    patterns: &[PatternSummary],
    alerts: &[GrowthAlert],
) -> Result<Report, AnalyticsError> {
    ReportAssembler::new(store).build(child, period, measurements, patterns, alerts, &[])
}

fn concerns(patterns: &[PatternSummary], alerts: &[GrowthAlert]) -> Vec<String> {
    let mut concerns: Vec<String> = alerts
        .iter()
        .filter(|alert| alert.requires_consultation || alert.severity >= AlertSeverity::Medium)
        .map(|alert| alert.message.clone())
        .collect();
    concerns.extend(
        patterns
            .iter()
            .filter(|summary| summary.trend == Trend::Worsening)
            .map(|summary| format!("{} activity decreased over the period", summary.category)),
    );
    concerns.dedup();
    concerns
}

/// Deterministic plain-text export.
pub fn render_text(report: &Report) -> String {
    let mut out = TextWriter::default();

    out.line("CHILD HEALTH REPORT");
    out.line(format!("Name: {}", report.child.name));
    out.line(format!("Date of birth: {}", date(report.child.date_of_birth)));
    out.line(format!("Sex: {}", report.child.sex.label()));
    out.line(format!(
        "Report period: {} - {}",
        date(report.period.start),
        date(report.period.end)
    ));

    out.section("SUMMARY");
    summary_section(&mut out, report);

    for (header, category) in [
        ("SLEEP", ActivityCategory::Sleep),
        ("FEEDING", ActivityCategory::Feeding),
        ("NAPPY", ActivityCategory::Diaper),
    ] {
        out.section(header);
        match report.patterns.iter().find(|summary| summary.category == category) {
            Some(summary) => pattern_section(&mut out, summary),
            None => out.line(format!("No {} data recorded.", category.label().to_lowercase())),
        }
    }

    out.section("GROWTH NOTES");
    growth_section(&mut out, report);

    out.section("MILESTONES");
    if report.milestones.is_empty() {
        out.line("No milestones recorded.");
    }
    for milestone in &report.milestones {
        let when = milestone
            .achieved_on
            .map(date)
            .unwrap_or_else(|| "Not yet".to_string());
        match &milestone.note {
            Some(note) => out.line(format!("{when} {} ({note})", milestone.title)),
            None => out.line(format!("{when} {}", milestone.title)),
        }
    }

    out.section("CONCERNS");
    if report.concerns.is_empty() {
        out.line("None noted.");
    }
    for concern in &report.concerns {
        out.line(format!("- {concern}"));
    }

    out.finish()
}

/// Pretty JSON export of the same report.
pub fn render_json(report: &Report) -> Result<String, AnalyticsError> {
    serde_json::to_string_pretty(report).map_err(|err| AnalyticsError::Other(err.to_string()))
}

fn summary_section(out: &mut TextWriter, report: &Report) {
    out.line(format!("Measurements recorded: {}", report.growth.len()));
    if let Some(latest) = report.growth.last() {
        out.line(format!("Latest measurement: {}", date(latest.date)));
    }

    let activity = report
        .patterns
        .iter()
        .map(|summary| format!("{} {}", summary.category, summary.record_count))
        .collect::<Vec<_>>();
    if activity.is_empty() {
        out.line("Activities logged: none");
    } else {
        out.line(format!("Activities logged: {}", activity.join(", ")));
    }

    let consultations = report
        .alerts
        .iter()
        .filter(|alert| alert.requires_consultation)
        .count();
    out.line(format!(
        "Growth alerts: {} ({consultations} requiring consultation)",
        report.alerts.len()
    ));
}

fn pattern_section(out: &mut TextWriter, summary: &PatternSummary) {
    let noun = match summary.category {
        ActivityCategory::Sleep => "Sessions",
        ActivityCategory::Feeding => "Feeds",
        ActivityCategory::Diaper => "Changes",
    };
    if summary.open_count > 0 {
        out.line(format!(
            "{noun}: {} ({} in progress)",
            summary.record_count, summary.open_count
        ));
    } else {
        out.line(format!("{noun}: {}", summary.record_count));
    }
    if let Some(per_day) = summary.records_per_day {
        out.line(format!("Per day: {}", number(per_day)));
    }
    if let Some(interval) = summary.average_interval_minutes {
        out.line(format!("Average interval: {}", hours_minutes(interval)));
    }
    if let Some(duration) = summary.average_duration_minutes {
        out.line(format!("Average duration: {}", hours_minutes(duration)));
    }
    if summary.category == ActivityCategory::Sleep {
        out.line(format!(
            "Total sleep: {}",
            hours_minutes(summary.total_duration_minutes)
        ));
    }
    if let Some(quantity) = summary.average_quantity {
        out.line(format!("Average amount: {} ml", number(quantity)));
    }
    if !summary.subtype_counts.is_empty() {
        let breakdown = summary
            .subtype_counts
            .iter()
            .map(|(subtype, count)| format!("{subtype} {count}"))
            .collect::<Vec<_>>();
        out.line(format!("Breakdown: {}", breakdown.join(", ")));
    }
    if !summary.peak_hours.is_empty() {
        let hours = summary
            .peak_hours
            .iter()
            .map(|hour| format!("{hour:02}:00"))
            .collect::<Vec<_>>();
        out.line(format!("Common times: {}", hours.join(", ")));
    }
    out.line(format!("Trend: {}", summary.trend.label()));
}

fn growth_section(out: &mut TextWriter, report: &Report) {
    if report.growth.is_empty() {
        out.line("No measurements recorded.");
    }
    for entry in &report.growth {
        let readings = entry
            .readings
            .iter()
            .map(|reading| {
                let band = reading
                    .percentile
                    .map(|percentile| percentile.to_string())
                    .unwrap_or_else(|| "no reference".to_string());
                format!(
                    "{} {} {} ({band})",
                    reading.measurement_type,
                    number(reading.value),
                    reading.measurement_type.unit()
                )
            })
            .collect::<Vec<_>>();
        out.line(format!(
            "{} ({} weeks): {}",
            date(entry.date),
            entry.age_in_weeks,
            readings.join(", ")
        ));
    }
    for alert in &report.alerts {
        out.line(format!(
            "[{}] {}",
            alert.severity.label().to_uppercase(),
            alert.message
        ));
        if let Some(recommendation) = &alert.recommendation {
            out.line(format!("  Recommendation: {recommendation}"));
        }
    }
}

#[derive(Default)]
struct TextWriter {
    lines: Vec<String>,
}

impl TextWriter {
    fn line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    fn section(&mut self, header: &str) {
        self.lines.push(String::new());
        self.lines.push(header.to_string());
        self.lines.push("-".repeat(header.len()));
    }

    fn finish(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

fn date(value: NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

/// One decimal place, trailing `.0` dropped.
fn number(value: f64) -> String {
    let text = format!("{value:.1}");
    match text.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => text,
    }
}

fn hours_minutes(minutes: f64) -> String {
    let total = minutes.round().max(0.0) as i64;
    let (hours, rest) = (total / 60, total % 60);
    if hours == 0 {
        format!("{rest}m")
    } else {
        format!("{hours}h {rest:02}m")
    }
}
