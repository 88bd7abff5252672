//! Range aggregation and day classification.
//!
//! A day's population is every non-cancelled recurring unit (missions and
//! their sub-items each count once) plus the one-off tasks due that day.
//! `not_started` is always the complement of completed and skipped: no entry
//! means not started, so it is never tallied directly.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Days, NaiveDate};

use crate::clock::Clock;
use crate::day::{check_bounds, days_inclusive, parse_optional_day};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{
    CompletionEntry, DateRange, DayBreakdown, DayStatus, DayTotals, RangeStats, Task, TaskState,
};
use crate::streak;

/// Where the default stats window starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsConfig {
    pub default_start: NaiveDate,
    /// When set, the default window is the last N days ending today.
    pub default_window_days: Option<u32>,
}

impl StatsConfig {
    /// First day of the default window ending at `end`.
    pub fn window_start(&self, end: NaiveDate) -> Result<NaiveDate> {
        match self.default_window_days {
            Some(days) if days > 0 => end
                .checked_sub_days(Days::new(u64::from(days) - 1))
                .ok_or_else(|| Error::invalid("Default stats window is too long"))
                .and_then(check_bounds),
            _ => Ok(self.default_start),
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            default_start: NaiveDate::from_ymd_opt(2025, 11, 30).unwrap_or(NaiveDate::MIN),
            default_window_days: None,
        }
    }
}

#[derive(Clone)]
pub struct RangeAggregator {
    db: Database,
    clock: Arc<dyn Clock>,
    config: StatsConfig,
}

impl RangeAggregator {
    pub fn new(db: Database, clock: Arc<dyn Clock>, config: StatsConfig) -> Self {
        Self { db, clock, config }
    }

    pub fn default_range(&self) -> Result<DateRange> {
        let end = self.clock.today();
        let start = self.config.window_start(end)?;
        Ok(DateRange { start, end })
    }

    /// Resolve optional bounds; either missing side comes from the default window.
    pub fn resolve_range(&self, start: Option<&str>, end: Option<&str>) -> Result<DateRange> {
        let offset = self.clock.offset();
        let start = parse_optional_day(start, offset)?;
        let end = parse_optional_day(end, offset)?;

        let end = end.unwrap_or_else(|| self.clock.today());
        let start = match start {
            Some(start) => start,
            None => self.config.window_start(self.clock.today())?,
        };
        let range = DateRange { start, end };

        if range.start > range.end {
            return Err(Error::invalid("Start date must be before end date"));
        }
        Ok(range)
    }

    pub fn range_stats(
        &self,
        user_id: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<RangeStats> {
        let range = self.resolve_range(start, end)?;

        let (daily_units, due_dates, entries) = self.db.with_connection(|conn| {
            let daily_units = Task::count_active_daily(conn, user_id)?;
            let due_dates = Task::one_time_due_dates(conn, user_id, range.start, range.end)?;
            let entries = CompletionEntry::states_in_range(conn, user_id, range.start, range.end)?;
            Ok((daily_units, due_dates, entries))
        })?;

        let mut one_time_by_day: HashMap<NaiveDate, u32> = HashMap::new();
        for day in due_dates {
            *one_time_by_day.entry(day).or_default() += 1;
        }

        let mut states_by_day: HashMap<NaiveDate, Vec<TaskState>> = HashMap::new();
        for (day, state) in entries {
            states_by_day.entry(day).or_default().push(state);
        }

        let breakdown = fold_days(range, daily_units, &one_time_by_day, &states_by_day);
        tracing::debug!(
            user_id,
            start = %range.start,
            end = %range.end,
            days = breakdown.len(),
            "Aggregated range stats"
        );

        Ok(summarize(range, breakdown))
    }
}

/// Per-day totals and classification for every day in `range`.
pub fn fold_days(
    range: DateRange,
    daily_units: u32,
    one_time_by_day: &HashMap<NaiveDate, u32>,
    states_by_day: &HashMap<NaiveDate, Vec<TaskState>>,
) -> Vec<DayBreakdown> {
    days_inclusive(range.start, range.end)
        .map(|day| {
            let total = daily_units + one_time_by_day.get(&day).copied().unwrap_or(0);
            let states = states_by_day.get(&day).map(Vec::as_slice).unwrap_or(&[]);
            let totals = tally(total, states);

            DayBreakdown {
                date: day,
                totals,
                status: classify(totals.completed, totals.total),
            }
        })
        .collect()
}

/// Count states, considering at most `total` entries so leftovers from
/// cancelled tasks cannot push a day past its population.
pub fn tally(total: u32, states: &[TaskState]) -> DayTotals {
    let mut totals = DayTotals {
        total,
        ..DayTotals::default()
    };

    for state in states.iter().take(total as usize) {
        match state {
            TaskState::Completed => totals.completed += 1,
            TaskState::Skipped => totals.skipped += 1,
            TaskState::NotStarted => {}
        }
    }
    totals.not_started = total.saturating_sub(totals.completed + totals.skipped);
    totals
}

/// `FLAWLESS` at 100%, `GOOD` at 70% or more, else `NONE`. Empty days are `NONE`.
pub fn classify(completed: u32, total: u32) -> DayStatus {
    if total == 0 {
        return DayStatus::None;
    }

    let (completed, total) = (u64::from(completed), u64::from(total));
    if completed >= total {
        DayStatus::Flawless
    } else if completed * 10 >= total * 7 {
        DayStatus::Good
    } else {
        DayStatus::None
    }
}

fn summarize(range: DateRange, breakdown: Vec<DayBreakdown>) -> RangeStats {
    let mut aggregates = DayTotals::default();
    for day in &breakdown {
        aggregates.add(&day.totals);
    }

    let statuses: Vec<DayStatus> = breakdown.iter().map(|day| day.status).collect();
    let report = streak::analyze(&statuses);

    RangeStats {
        range,
        aggregates,
        streaks: report.streaks(),
        day_stats: report.day_stats(breakdown.len()),
        daily_breakdown: breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn oversized_window_is_invalid_input() {
        let config = StatsConfig {
            default_window_days: Some(200_000_000),
            ..StatsConfig::default()
        };
        let err = config.window_start(ymd(2025, 3, 12)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidInput);

        let before_1970 = StatsConfig {
            default_window_days: Some(30_000),
            ..StatsConfig::default()
        };
        assert!(before_1970.window_start(ymd(2025, 3, 12)).is_err());
    }

    #[test]
    fn window_counts_today() {
        let config = StatsConfig {
            default_window_days: Some(7),
            ..StatsConfig::default()
        };
        assert_eq!(config.window_start(ymd(2025, 3, 12)).unwrap(), ymd(2025, 3, 6));
        assert_eq!(
            StatsConfig::default().window_start(ymd(2025, 3, 12)).unwrap(),
            ymd(2025, 11, 30)
        );
    }

    #[test]
    fn classification_boundaries() {
        assert_eq!(classify(7, 10), DayStatus::Good);
        assert_eq!(classify(699, 1000), DayStatus::None);
        assert_eq!(classify(10, 10), DayStatus::Flawless);
        assert_eq!(classify(0, 0), DayStatus::None);
        assert_eq!(classify(3, 4), DayStatus::Good);
        assert_eq!(classify(2, 3), DayStatus::None);
    }

    #[test]
    fn not_started_is_the_complement() {
        let totals = tally(
            4,
            &[TaskState::Completed, TaskState::Skipped, TaskState::NotStarted],
        );
        assert_eq!(
            totals,
            DayTotals {
                completed: 1,
                skipped: 1,
                not_started: 2,
                total: 4
            }
        );
    }

    #[test]
    fn entries_are_capped_at_the_population() {
        let totals = tally(2, &[TaskState::Completed; 5]);
        assert_eq!(totals.completed, 2);
        assert_eq!(totals.not_started, 0);

        let empty = tally(0, &[TaskState::Completed]);
        assert_eq!(empty, DayTotals::default());
    }

    #[test]
    fn one_time_tasks_only_count_on_their_day() {
        let range = DateRange {
            start: ymd(2025, 3, 1),
            end: ymd(2025, 3, 3),
        };
        let one_time = HashMap::from([(ymd(2025, 3, 2), 2)]);
        let states = HashMap::from([(ymd(2025, 3, 2), vec![TaskState::Completed; 3])]);

        let days = fold_days(range, 1, &one_time, &states);

        assert_eq!(days.len(), 3);
        assert_eq!(days[0].totals.total, 1);
        assert_eq!(days[1].totals.total, 3);
        assert_eq!(days[1].status, DayStatus::Flawless);
        assert_eq!(days[2].status, DayStatus::None);
    }

    #[test]
    fn summary_sums_days_and_tracks_streaks() {
        let range = DateRange {
            start: ymd(2025, 3, 1),
            end: ymd(2025, 3, 2),
        };
        let states = HashMap::from([
            (ymd(2025, 3, 1), vec![TaskState::Completed; 2]),
            (ymd(2025, 3, 2), vec![TaskState::Completed, TaskState::Skipped]),
        ]);

        let stats = summarize(range, fold_days(range, 2, &HashMap::new(), &states));

        assert_eq!(stats.aggregates.total, 4);
        assert_eq!(stats.aggregates.completed, 3);
        assert_eq!(stats.aggregates.skipped, 1);
        assert_eq!(stats.aggregates.not_started, 0);
        assert_eq!(stats.streaks.current, 0);
        assert_eq!(stats.streaks.best, 1);
        assert_eq!(stats.day_stats.flawless, 1);
        assert_eq!(stats.day_stats.total, 2);
    }
}
