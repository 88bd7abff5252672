//! Streaks over a run of classified days.
//!
//! Input is ordered oldest to newest. `current` is anchored at the newest day
//! and freezes at the first non-qualifying day walking backwards; `best` is
//! the longest qualifying run anywhere in the window.

use crate::models::{DayStats, DayStatus, StreakSummary};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakReport {
    pub current: u32,
    pub best: u32,
    pub good_days: u32,
    pub flawless_days: u32,
}

impl StreakReport {
    pub fn streaks(&self) -> StreakSummary {
        StreakSummary {
            current: self.current,
            best: self.best,
        }
    }

    pub fn day_stats(&self, total_days: usize) -> DayStats {
        DayStats {
            good: self.good_days,
            flawless: self.flawless_days,
            total: total_days as u32,
        }
    }
}

pub fn analyze(days: &[DayStatus]) -> StreakReport {
    let mut report = StreakReport::default();

    let mut run = 0;
    for status in days {
        match status {
            DayStatus::Good => report.good_days += 1,
            DayStatus::Flawless => report.flawless_days += 1,
            DayStatus::None => {}
        }

        if status.qualifies() {
            run += 1;
            report.best = report.best.max(run);
        } else {
            run = 0;
        }
    }

    report.current = days
        .iter()
        .rev()
        .take_while(|status| status.qualifies())
        .count() as u32;

    report
}
