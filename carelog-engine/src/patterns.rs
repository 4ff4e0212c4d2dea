//! Interval, duration, time-of-day and trend statistics over activity logs.
//!
//! The trend splits records at the chronological midpoint of their span and
//! compares the two halves by count (sleep: by total closed duration). A change
//! of at least `trend_threshold` in either direction moves it off `Stable`.

use std::collections::BTreeMap;

use carelog_core::{
    ActivityCategory, ActivityRecord, AnalyticsConfig, AnalyticsError, PatternConfig,
    PatternSummary, Trend,
};
use chrono::{Duration, FixedOffset, NaiveDate, Timelike};

use crate::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrendMetric {
    Count,
    TotalDuration,
}

#[derive(Debug, Clone)]
pub struct ActivityPatternAnalyzer {
    config: PatternConfig,
    offset: FixedOffset,
}

impl ActivityPatternAnalyzer {
    pub fn new(config: PatternConfig, offset: FixedOffset) -> Self {
        Self { config, offset }
    }

    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self::new(config.patterns.clone(), config.local_offset())
    }

    /// One summary per category present; absent categories are omitted.
    pub fn analyze(
        &self,
        records: &[ActivityRecord],
    ) -> Result<Vec<PatternSummary>, AnalyticsError> {
        validate::activity_records(records)
            .inspect_err(|err| tracing::warn!(%err, "activity records rejected"))?;

        let mut by_category: BTreeMap<ActivityCategory, Vec<&ActivityRecord>> = BTreeMap::new();
        for record in records {
            by_category.entry(record.category).or_default().push(record);
        }

        let summaries: Vec<PatternSummary> = by_category
            .into_iter()
            .map(|(category, mut group)| {
                group.sort_by_key(|record| record.started_at);
                match category {
                    ActivityCategory::Feeding => self.feeding(&group),
                    ActivityCategory::Sleep => self.sleep(&group),
                    ActivityCategory::Diaper => self.diaper(&group),
                }
            })
            .collect();

        tracing::info!(
            records = records.len(),
            categories = summaries.len(),
            "activity patterns analysed"
        );
        Ok(summaries)
    }

    fn feeding(&self, records: &[&ActivityRecord]) -> PatternSummary {
        let mut summary = self.base_summary(ActivityCategory::Feeding, records);
        summary.average_quantity = average(records.iter().filter_map(|record| record.quantity));
        summary.trend = self.trend(records, TrendMetric::Count);
        summary
    }

    fn sleep(&self, records: &[&ActivityRecord]) -> PatternSummary {
        let mut summary = self.base_summary(ActivityCategory::Sleep, records);
        if summary.open_count > 1 {
            // Only one session can really be running; keep them all open.
            tracing::warn!(
                open_sessions = summary.open_count,
                "several sleep sessions are open at once"
            );
        }
        summary.trend = self.trend(records, TrendMetric::TotalDuration);
        summary
    }

    fn diaper(&self, records: &[&ActivityRecord]) -> PatternSummary {
        let mut summary = self.base_summary(ActivityCategory::Diaper, records);
        summary.trend = self.trend(records, TrendMetric::Count);
        summary
    }

    /// Statistics shared by every category. `records` must be sorted.
    fn base_summary(
        &self,
        category: ActivityCategory,
        records: &[&ActivityRecord],
    ) -> PatternSummary {
        let max_interval = Duration::hours(i64::from(self.config.max_interval_hours));
        let mut discarded = 0usize;
        let intervals: Vec<f64> = records
            .windows(2)
            .map(|pair| pair[1].started_at - pair[0].started_at)
            .filter(|gap| {
                let keep = *gap > Duration::zero() && *gap <= max_interval;
                if !keep {
                    discarded += 1;
                }
                keep
            })
            .map(minutes)
            .collect();
        if discarded > 0 {
            tracing::debug!(%category, discarded, "interval outliers discarded");
        }

        let durations: Vec<f64> = records
            .iter()
            .filter_map(|record| record.duration())
            .map(minutes)
            .collect();

        let mut subtype_counts = BTreeMap::new();
        for record in records {
            if !record.subtype.is_empty() {
                *subtype_counts.entry(record.subtype.clone()).or_insert(0) += 1;
            }
        }

        PatternSummary {
            category,
            record_count: records.len(),
            open_count: records.iter().filter(|record| record.is_open()).count(),
            average_interval_minutes: average(intervals.iter().copied()),
            average_duration_minutes: average(durations.iter().copied()),
            total_duration_minutes: durations.iter().sum(),
            records_per_day: self.records_per_day(records),
            average_quantity: None,
            peak_hours: self.peak_hours(records),
            subtype_counts,
            trend: Trend::Stable,
        }
    }

    fn local_date(&self, record: &ActivityRecord) -> NaiveDate {
        record.started_at.with_timezone(&self.offset).date_naive()
    }

    /// Records divided by the number of local calendar days spanned.
    fn records_per_day(&self, records: &[&ActivityRecord]) -> Option<f64> {
        let first = self.local_date(records.first()?);
        let last = self.local_date(records.last()?);
        let days = (last - first).num_days() + 1;
        Some(records.len() as f64 / days as f64)
    }

    /// Busiest local hours, ties resolved toward the earlier hour.
    fn peak_hours(&self, records: &[&ActivityRecord]) -> Vec<u32> {
        let mut buckets = [0usize; 24];
        for record in records {
            let hour = record.started_at.with_timezone(&self.offset).hour();
            buckets[hour as usize] += 1;
        }

        let mut ranked: Vec<(u32, usize)> = buckets
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(hour, count)| (hour as u32, *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
            .into_iter()
            .take(self.config.peak_hour_count)
            .map(|(hour, _)| hour)
            .collect()
    }

    fn trend(&self, records: &[&ActivityRecord], metric: TrendMetric) -> Trend {
        if records.len() < self.config.min_records_for_trend.max(2) {
            return Trend::Stable;
        }
        let (Some(first), Some(last)) = (records.first(), records.last()) else {
            return Trend::Stable;
        };
        if last.started_at <= first.started_at {
            return Trend::Stable;
        }

        let midpoint = first.started_at + (last.started_at - first.started_at) / 2;
        let (early, late): (Vec<&ActivityRecord>, Vec<&ActivityRecord>) = records
            .iter()
            .copied()
            .partition(|record| record.started_at < midpoint);

        let (before, after) = match metric {
            TrendMetric::Count => (early.len() as f64, late.len() as f64),
            TrendMetric::TotalDuration => (closed_minutes(&early), closed_minutes(&late)),
        };
        classify_change(before, after, self.config.trend_threshold)
    }
}

/// Free-function form of [`ActivityPatternAnalyzer::analyze`].
pub fn analyze_patterns(
    records: &[ActivityRecord],
    config: &AnalyticsConfig,
) -> Result<Vec<PatternSummary>, AnalyticsError> {
    ActivityPatternAnalyzer::from_config(config).analyze(records)
}

fn classify_change(before: f64, after: f64, threshold: f64) -> Trend {
    if before <= 0.0 {
        return if after > 0.0 {
            Trend::Improving
        } else {
            Trend::Stable
        };
    }
    let change = (after - before) / before;
    if change >= threshold {
        Trend::Improving
    } else if change <= -threshold {
        Trend::Worsening
    } else {
        Trend::Stable
    }
}

fn closed_minutes(records: &[&ActivityRecord]) -> f64 {
    records
        .iter()
        .filter_map(|record| record.duration())
        .map(minutes)
        .sum()
}

fn minutes(duration: Duration) -> f64 {
    duration.num_seconds() as f64 / 60.0
}

fn average(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, minute, 0).unwrap()
    }

    fn feed(started_at: DateTime<Utc>, ml: Option<f64>) -> ActivityRecord {
        ActivityRecord {
            child_id: "c1".to_string(),
            category: ActivityCategory::Feeding,
            started_at,
            ended_at: Some(started_at + Duration::minutes(20)),
            subtype: "bottle".to_string(),
            quantity: ml,
        }
    }

    fn nap(started_at: DateTime<Utc>, minutes: Option<i64>) -> ActivityRecord {
        ActivityRecord {
            child_id: "c1".to_string(),
            category: ActivityCategory::Sleep,
            started_at,
            ended_at: minutes.map(|m| started_at + Duration::minutes(m)),
            subtype: "nap".to_string(),
            quantity: None,
        }
    }

    fn analyzer() -> ActivityPatternAnalyzer {
        ActivityPatternAnalyzer::from_config(&AnalyticsConfig::default())
    }

    fn summary_for(summaries: &[PatternSummary], category: ActivityCategory) -> &PatternSummary {
        summaries
            .iter()
            .find(|summary| summary.category == category)
            .expect("category present")
    }

    #[test]
    fn fewer_than_four_records_are_stable() {
        let records = vec![feed(at(1, 6, 0), None), feed(at(3, 6, 0), None), feed(at(3, 7, 0), None)];
        let summaries = analyzer().analyze(&records).unwrap();
        assert_eq!(summaries[0].trend, Trend::Stable);
    }

    #[test]
    fn absent_categories_are_omitted() {
        let summaries = analyzer().analyze(&[feed(at(1, 6, 0), Some(90.0))]).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].category, ActivityCategory::Feeding);

        assert!(analyzer().analyze(&[]).unwrap().is_empty());
    }

    #[test]
    fn evenly_spread_records_are_stable() {
        // Eight feeds three hours apart; four fall on each side of the midpoint.
        let records: Vec<_> = (0..8).map(|i| feed(at(1, i * 3, 0), None)).collect();
        let summaries = analyzer().analyze(&records).unwrap();
        assert_eq!(summaries[0].trend, Trend::Stable);
    }

    #[test]
    fn more_feeds_in_second_half_is_improving() {
        // Span 00:00 to 22:00, midpoint 11:00. Ten feeds before, eleven after.
        let mut records: Vec<_> = (0..10).map(|i| feed(at(2, i, 0), None)).collect();
        records.extend((0..11).map(|i| feed(at(2, 12 + i, 0), None)));
        let summaries = analyzer().analyze(&records).unwrap();
        assert_eq!(summaries[0].record_count, 21);
        assert_eq!(summaries[0].trend, Trend::Improving);
    }

    #[test]
    fn fewer_feeds_in_second_half_is_worsening() {
        let mut records: Vec<_> = (0..6).map(|i| feed(at(4, i, 0), None)).collect();
        records.push(feed(at(4, 8, 0), None));
        records.push(feed(at(4, 10, 0), None));
        let summaries = analyzer().analyze(&records).unwrap();
        // Span 00:00 to 10:00, midpoint 05:00: five before, three after.
        assert_eq!(summaries[0].trend, Trend::Worsening);
    }

    #[test]
    fn unsorted_input_gives_sorted_intervals() {
        let records = vec![
            feed(at(5, 9, 0), Some(120.0)),
            feed(at(5, 3, 0), Some(100.0)),
            feed(at(5, 6, 0), Some(110.0)),
        ];
        let summary = &analyzer().analyze(&records).unwrap()[0];
        assert_eq!(summary.average_interval_minutes, Some(180.0));
        assert_eq!(summary.average_duration_minutes, Some(20.0));
        assert_eq!(summary.average_quantity, Some(110.0));
        assert_eq!(summary.subtype_counts.get("bottle"), Some(&3));
    }

    #[test]
    fn long_gaps_are_not_intervals() {
        // 2h gap kept, 30h gap discarded.
        let records = vec![feed(at(1, 6, 0), None), feed(at(1, 8, 0), None), feed(at(2, 14, 0), None)];
        let summary = &analyzer().analyze(&records).unwrap()[0];
        assert_eq!(summary.average_interval_minutes, Some(120.0));
        assert_eq!(summary.records_per_day, Some(1.5));
    }

    #[test]
    fn open_sleep_sessions_count_but_have_no_duration() {
        let records = vec![
            nap(at(7, 13, 0), Some(60)),
            nap(at(7, 19, 0), None),
            nap(at(7, 20, 0), None),
        ];
        let summaries = analyzer().analyze(&records).unwrap();
        let sleep = summary_for(&summaries, ActivityCategory::Sleep);
        assert_eq!(sleep.record_count, 3);
        assert_eq!(sleep.open_count, 2);
        assert_eq!(sleep.average_duration_minutes, Some(60.0));
        assert_eq!(sleep.total_duration_minutes, 60.0);
    }

    #[test]
    fn longer_sleep_in_second_half_is_improving() {
        let records = vec![
            nap(at(8, 0, 0), Some(60)),
            nap(at(8, 4, 0), Some(60)),
            nap(at(8, 8, 0), Some(90)),
            nap(at(8, 12, 0), Some(90)),
        ];
        // Midpoint 06:00: 120 minutes before, 180 after.
        let summaries = analyzer().analyze(&records).unwrap();
        assert_eq!(summaries[0].trend, Trend::Improving);
    }

    #[test]
    fn equal_sleep_in_both_halves_is_stable() {
        let records = vec![
            nap(at(8, 0, 0), Some(60)),
            nap(at(8, 4, 0), Some(60)),
            nap(at(8, 8, 0), Some(60)),
            nap(at(8, 12, 0), Some(60)),
        ];
        let summaries = analyzer().analyze(&records).unwrap();
        assert_eq!(summaries[0].trend, Trend::Stable);
    }

    #[test]
    fn feeds_at_one_instant_are_rejected() {
        let records: Vec<_> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|subtype| ActivityRecord {
                subtype: subtype.to_string(),
                ..feed(at(1, 8, 0), None)
            })
            .collect();
        assert!(matches!(
            analyzer().analyze(&records),
            Err(AnalyticsError::Validation(_))
        ));
    }

    #[test]
    fn zero_span_has_no_trend() {
        let first = feed(at(1, 8, 0), None);
        let second = ActivityRecord {
            subtype: "breast".to_string(),
            ..first.clone()
        };
        let group = vec![&first, &second, &first, &second];
        let analyzer = ActivityPatternAnalyzer::new(
            PatternConfig {
                min_records_for_trend: 2,
                ..PatternConfig::default()
            },
            FixedOffset::east_opt(0).unwrap(),
        );
        assert_eq!(analyzer.trend(&group, TrendMetric::Count), Trend::Stable);
    }

    #[test]
    fn peak_hours_follow_local_offset() {
        let config = AnalyticsConfig {
            utc_offset_minutes: 120,
            ..AnalyticsConfig::default()
        };
        let records = vec![
            feed(at(9, 5, 0), None),
            feed(at(9, 5, 30), None),
            feed(at(9, 9, 0), None),
            feed(at(10, 5, 10), None),
            feed(at(10, 9, 15), None),
            feed(at(10, 14, 0), None),
            feed(at(10, 18, 0), None),
        ];
        let summary = &analyze_patterns(&records, &config).unwrap()[0];
        // Local hours: 7 x3, 11 x2, 16 x1, 20 x1.
        assert_eq!(summary.peak_hours, vec![7, 11, 16]);
    }

    #[test]
    fn change_from_empty_half() {
        assert_eq!(classify_change(0.0, 0.0, 0.1), Trend::Stable);
        assert_eq!(classify_change(0.0, 3.0, 0.1), Trend::Improving);
        assert_eq!(classify_change(10.0, 11.0, 0.1), Trend::Improving);
        assert_eq!(classify_change(10.0, 10.5, 0.1), Trend::Stable);
        assert_eq!(classify_change(10.0, 9.0, 0.1), Trend::Worsening);
    }
}
