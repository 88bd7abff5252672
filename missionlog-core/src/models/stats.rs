use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Quality of a single day.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayStatus {
    #[default]
    None,
    /// At least 70% of the day's units completed.
    Good,
    /// Every unit completed.
    Flawless,
}

impl DayStatus {
    /// Good-or-better days extend a streak.
    pub fn qualifies(&self) -> bool {
        matches!(self, Self::Good | Self::Flawless)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayTotals {
    pub completed: u32,
    pub skipped: u32,
    pub not_started: u32,
    pub total: u32,
}

impl DayTotals {
    pub fn add(&mut self, other: &DayTotals) {
        self.completed += other.completed;
        self.skipped += other.skipped;
        self.not_started += other.not_started;
        self.total += other.total;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayBreakdown {
    pub date: NaiveDate,
    pub totals: DayTotals,
    pub status: DayStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreakSummary {
    pub current: u32,
    pub best: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayStats {
    pub good: u32,
    pub flawless: u32,
    pub total: u32,
}

/// Totals, per-day breakdown and streaks for one date window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeStats {
    pub range: DateRange,
    pub aggregates: DayTotals,
    pub daily_breakdown: Vec<DayBreakdown>,
    pub streaks: StreakSummary,
    pub day_stats: DayStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names() {
        let names: Vec<String> = [DayStatus::None, DayStatus::Good, DayStatus::Flawless]
            .iter()
            .map(|status| serde_json::to_string(status).unwrap())
            .collect();
        assert_eq!(names, ["\"NONE\"", "\"GOOD\"", "\"FLAWLESS\""]);
        assert!(!DayStatus::None.qualifies());
        assert!(DayStatus::Good.qualifies());
    }
}
