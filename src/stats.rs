use crate::models::{AnalyticsData, DailyPoint, StatsResponse, WeeklyAveragePoint, WeeklyPoint};
use crate::store::{counter_id, today_utc};
use chrono::{Datelike, Duration, NaiveDate};

pub fn build_stats(data: &AnalyticsData) -> StatsResponse {
    build_stats_at(today_utc(), data)
}

pub fn build_stats_at(today: NaiveDate, data: &AnalyticsData) -> StatsResponse {
    const WEEK_COUNT: usize = 8;

    let mut last_7_days = Vec::with_capacity(7);
    for offset in (0..7).rev() {
        let date = today - Duration::days(offset as i64);
        last_7_days.push(DailyPoint {
            date: date.to_string(),
            count: count_on(data, date),
        });
    }

    let current_week_start = week_start(today);
    let mut weekly_totals = Vec::with_capacity(WEEK_COUNT);
    let mut weekly_averages = Vec::with_capacity(WEEK_COUNT);

    for offset in (0..WEEK_COUNT).rev() {
        let start = current_week_start - Duration::weeks(offset as i64);
        let end = start + Duration::days(6);

        let mut total = 0u64;
        for day_offset in 0..7 {
            total = total.saturating_add(count_on(data, start + Duration::days(day_offset)));
        }

        let days_counted = if today < start {
            0
        } else if today > end {
            7
        } else {
            (today - start).num_days() as u8 + 1
        };

        let denom = if days_counted == 0 {
            1.0
        } else {
            f64::from(days_counted)
        };

        weekly_totals.push(WeeklyPoint {
            week: week_label(start),
            start_date: start.to_string(),
            end_date: end.to_string(),
            count: total,
        });

        weekly_averages.push(WeeklyAveragePoint {
            week: week_label(start),
            days_counted,
            avg_count: total as f64 / denom,
        });
    }

    StatsResponse {
        last_7_days,
        weekly_totals,
        weekly_averages,
    }
}

fn count_on(data: &AnalyticsData, date: NaiveDate) -> u64 {
    data.counters
        .get(&counter_id(date))
        .map_or(0, |counter| counter.count)
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailyVisitCounter;

    fn counter(date: NaiveDate, count: u64) -> (String, DailyVisitCounter) {
        (
            counter_id(date),
            DailyVisitCounter {
                date: date.to_string(),
                count,
            },
        )
    }

    #[test]
    fn stats_last_7_days_includes_each_day() {
        let mut data = AnalyticsData::default();
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let two_days_ago = today - Duration::days(2);
        let (id, doc) = counter(two_days_ago, 5);
        data.counters.insert(id, doc);

        let stats = build_stats_at(today, &data);
        assert_eq!(stats.last_7_days.len(), 7);
        let point = stats
            .last_7_days
            .iter()
            .find(|day| day.date == two_days_ago.to_string())
            .expect("missing day");
        assert_eq!(point.count, 5);
    }

    #[test]
    fn stats_weekly_series_lengths() {
        let data = AnalyticsData::default();
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let stats = build_stats_at(today, &data);
        assert_eq!(stats.weekly_totals.len(), 8);
        assert_eq!(stats.weekly_averages.len(), 8);
        assert_eq!(stats.last_7_days.len(), 7);
    }

    #[test]
    fn stats_current_week_average_uses_elapsed_days() {
        let mut data = AnalyticsData::default();
        // Wednesday; the week began on Monday 2026-01-05.
        let today = NaiveDate::from_ymd_opt(2026, 1, 7).unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let (id, doc) = counter(monday, 6);
        data.counters.insert(id, doc);

        let stats = build_stats_at(today, &data);
        let current = stats.weekly_averages.last().expect("current week");
        assert_eq!(current.days_counted, 3);
        assert_eq!(current.avg_count, 2.0);

        let totals = stats.weekly_totals.last().expect("current week");
        assert_eq!(totals.count, 6);
        assert_eq!(totals.start_date, "2026-01-05");
    }
}
