//! Injected "now" provider.
//!
//! Anything that needs the current day (default `set_state` day, default
//! stats window end, focus list lookups) asks a [`Clock`] instead of reading
//! wall time, so date-boundary behavior can be pinned in tests.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

pub trait Clock: Send + Sync {
    /// Current instant in the deployment's reference timezone.
    fn now(&self) -> DateTime<FixedOffset>;

    fn offset(&self) -> FixedOffset {
        *self.now().offset()
    }

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock in a fixed reference offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now }
    }

    /// Noon of `day` in the given offset.
    pub fn at_day(day: NaiveDate, offset: FixedOffset) -> Self {
        let noon = day
            .and_hms_opt(12, 0, 0)
            .expect("noon exists on every day")
            .and_local_timezone(offset)
            .single()
            .expect("fixed offsets are unambiguous");
        Self::new(noon)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.now
    }
}

/// Parse a `+HH:MM`, `-HH:MM`, `+HHMM` or `Z` offset.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Some(Utc.fix());
    }

    raw.parse::<FixedOffset>().ok()
}
