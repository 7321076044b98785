//! Wall-clock access behind a trait so relative dates are testable.

use chrono::{Days, Local, NaiveDate, NaiveDateTime};

/// Source of the current local date and time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Today plus one calendar day.
    fn tomorrow(&self) -> NaiveDate {
        let today = self.today();
        today.checked_add_days(Days::new(1)).unwrap_or(today)
    }
}

/// The process's local clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Frozen at `date` 10:30:00.
    pub fn on(date: NaiveDate) -> Self {
        Self(date.and_hms_opt(10, 30, 0).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Format a date the way tools and prompts expect it (`YYYY-MM-DD`).
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tomorrow_crosses_month_boundary() {
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(format_date(clock.today()), "2024-02-29");
        assert_eq!(format_date(clock.tomorrow()), "2024-03-01");
    }

    #[test]
    fn system_clock_tomorrow_follows_today() {
        let clock = SystemClock;
        assert!(clock.tomorrow() > clock.today());
    }
}
