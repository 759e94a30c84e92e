//! Recurrence patterns for repeating events.

use neo_types::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{error::CalendarError, Result};

/// How often a recurring event repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Yearly => write!(f, "yearly"),
        }
    }
}

/// The repetition rule of a recurring event.
///
/// Days of the week are numbered `0..=6` starting on Sunday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrencePattern {
    /// Base repetition unit.
    pub frequency: Frequency,
    /// Number of units between occurrences.
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Last moment an occurrence may start.
    #[serde(default)]
    pub end_date: Option<Timestamp>,
    /// Weekdays for weekly recurrence.
    #[serde(default)]
    pub days_of_week: Option<Vec<u8>>,
    /// Day of the month for monthly recurrence.
    #[serde(default)]
    pub day_of_month: Option<u8>,
    /// Month for yearly recurrence.
    #[serde(default)]
    pub month_of_year: Option<u8>,
}

fn default_interval() -> u32 {
    1
}

impl RecurrencePattern {
    /// A pattern with the given frequency and every optional field unset.
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: default_interval(),
            end_date: None,
            days_of_week: None,
            day_of_month: None,
            month_of_year: None,
        }
    }

    /// Validate the pattern for an event starting at `start`.
    pub fn validate(&self, start: Timestamp) -> Result<()> {
        if self.interval == 0 {
            return invalid("Recurrence interval must be at least 1");
        }

        if let Some(days) = &self.days_of_week {
            if let Some(day) = days.iter().find(|d| **d > 6) {
                return invalid(&format!(
                    "Invalid day of week: {} (expected 0-6, Sunday = 0)",
                    day
                ));
            }
        }

        if let Some(day) = self.day_of_month {
            if !(1..=31).contains(&day) {
                return invalid(&format!("Invalid day of month: {} (expected 1-31)", day));
            }
        }

        if let Some(month) = self.month_of_year {
            if !(1..=12).contains(&month) {
                return invalid(&format!("Invalid month of year: {} (expected 1-12)", month));
            }
        }

        match self.frequency {
            Frequency::Weekly if self.days_of_week.as_ref().is_none_or(Vec::is_empty) => {
                return invalid("Days of week are required for weekly recurrence");
            }
            Frequency::Monthly if self.day_of_month.is_none() => {
                return invalid("Day of month is required for monthly recurrence");
            }
            Frequency::Yearly if self.month_of_year.is_none() => {
                return invalid("Month of year is required for yearly recurrence");
            }
            _ => {}
        }

        if self.end_date.is_some_and(|end| end < start) {
            return invalid("Recurrence end date must not precede start time");
        }

        Ok(())
    }
}

/// Check that `is_recurring` and the pattern agree, then validate the pattern.
pub fn validate_recurrence(
    is_recurring: bool,
    pattern: Option<&RecurrencePattern>,
    start: Timestamp,
) -> Result<()> {
    match (is_recurring, pattern) {
        (true, None) => invalid("Recurrence pattern is required when is_recurring is true"),
        (false, Some(_)) => {
            invalid("Recurrence pattern should not be provided when is_recurring is false")
        }
        (true, Some(pattern)) => pattern.validate(start),
        (false, None) => Ok(()),
    }
}

fn invalid(message: &str) -> Result<()> {
    Err(CalendarError::Validation(message.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn start() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
    }

    fn message(result: Result<()>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn test_recurring_flag_must_match_pattern() {
        let daily = RecurrencePattern::new(Frequency::Daily);

        assert!(validate_recurrence(false, None, start()).is_ok());
        assert!(validate_recurrence(true, Some(&daily), start()).is_ok());

        assert_eq!(
            message(validate_recurrence(true, None, start())),
            "Recurrence pattern is required when is_recurring is true"
        );
        assert_eq!(
            message(validate_recurrence(false, Some(&daily), start())),
            "Recurrence pattern should not be provided when is_recurring is false"
        );
    }

    #[test]
    fn test_frequency_requirements() {
        let mut weekly = RecurrencePattern::new(Frequency::Weekly);
        assert_eq!(
            message(weekly.validate(start())),
            "Days of week are required for weekly recurrence"
        );
        weekly.days_of_week = Some(vec![]);
        assert!(weekly.validate(start()).is_err());
        weekly.days_of_week = Some(vec![1, 3, 5]);
        assert!(weekly.validate(start()).is_ok());

        let mut monthly = RecurrencePattern::new(Frequency::Monthly);
        assert_eq!(
            message(monthly.validate(start())),
            "Day of month is required for monthly recurrence"
        );
        monthly.day_of_month = Some(15);
        assert!(monthly.validate(start()).is_ok());

        let mut yearly = RecurrencePattern::new(Frequency::Yearly);
        assert_eq!(
            message(yearly.validate(start())),
            "Month of year is required for yearly recurrence"
        );
        yearly.month_of_year = Some(12);
        assert!(yearly.validate(start()).is_ok());
    }

    #[test]
    fn test_ranges() {
        let mut pattern = RecurrencePattern::new(Frequency::Daily);
        pattern.interval = 0;
        assert!(pattern.validate(start()).is_err());

        let mut pattern = RecurrencePattern::new(Frequency::Weekly);
        pattern.days_of_week = Some(vec![0, 7]);
        assert!(message(pattern.validate(start())).contains("day of week"));

        let mut pattern = RecurrencePattern::new(Frequency::Monthly);
        pattern.day_of_month = Some(32);
        assert!(pattern.validate(start()).is_err());
        pattern.day_of_month = Some(0);
        assert!(pattern.validate(start()).is_err());

        let mut pattern = RecurrencePattern::new(Frequency::Yearly);
        pattern.month_of_year = Some(13);
        assert!(pattern.validate(start()).is_err());
    }

    #[test]
    fn test_end_date() {
        let mut pattern = RecurrencePattern::new(Frequency::Daily);
        pattern.end_date = Some(start() - Duration::days(1));
        assert_eq!(
            message(pattern.validate(start())),
            "Recurrence end date must not precede start time"
        );

        pattern.end_date = Some(start() + Duration::days(30));
        assert!(pattern.validate(start()).is_ok());
    }

    #[test]
    fn test_deserialize_defaults() {
        let pattern: RecurrencePattern =
            serde_json::from_str(r#"{"frequency": "weekly", "days_of_week": [1, 2]}"#).unwrap();
        assert_eq!(pattern.frequency, Frequency::Weekly);
        assert_eq!(pattern.interval, 1);
        assert_eq!(pattern.days_of_week, Some(vec![1, 2]));
        assert!(pattern.end_date.is_none());

        assert!(serde_json::from_str::<RecurrencePattern>(r#"{"frequency": "hourly"}"#).is_err());
    }
}
