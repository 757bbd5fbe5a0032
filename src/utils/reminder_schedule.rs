use chrono::{Datelike, NaiveDate, NaiveTime};

use crate::error::FieldErrors;
use crate::models::reminder::Frequency;

/// The date-related part of a reminder, borrowed from a row or a request.
#[derive(Debug, Clone, Copy)]
pub struct Schedule<'a> {
    pub frequency: Frequency,
    pub weekdays: &'a [i16],
    pub month_days: &'a [i16],
    pub custom_interval: Option<i32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl Schedule<'_> {
    /// Whether a dose is due on `date`. Weekdays are ISO numbered, Monday = 1.
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        if date < self.start_date {
            return false;
        }
        if self.end_date.is_some_and(|end| date > end) {
            return false;
        }

        match self.frequency {
            Frequency::Daily => true,
            Frequency::Weekly => {
                let weekday = date.weekday().number_from_monday() as i16;
                self.weekdays.contains(&weekday)
            }
            Frequency::Monthly => self.month_days.contains(&(date.day() as i16)),
            Frequency::Custom => match self.custom_interval {
                Some(interval) if interval > 0 => {
                    (date - self.start_date).num_days() % i64::from(interval) == 0
                }
                _ => false,
            },
        }
    }

    /// Field errors for a schedule that cannot fire as described.
    pub fn validate(&self, times: &[String]) -> FieldErrors {
        let mut errors = FieldErrors::new();
        let mut add = |field: &str, message: &str| {
            errors
                .entry(field.to_string())
                .or_default()
                .push(message.to_string());
        };

        match self.frequency {
            Frequency::Weekly if self.weekdays.is_empty() => {
                add("weekdays", "Weekly reminders need at least one weekday.")
            }
            Frequency::Monthly if self.month_days.is_empty() => {
                add("month_days", "Monthly reminders need at least one day of the month.")
            }
            Frequency::Custom if self.custom_interval.is_none() => {
                add("custom_interval", "Custom reminders need an interval in days.")
            }
            _ => {}
        }

        if self.weekdays.iter().any(|day| !(1..=7).contains(day)) {
            add("weekdays", "Weekdays must be between 1 (Monday) and 7 (Sunday).");
        }
        if self.month_days.iter().any(|day| !(1..=31).contains(day)) {
            add("month_days", "Days of the month must be between 1 and 31.");
        }
        if self.custom_interval.is_some_and(|interval| interval < 1) {
            add("custom_interval", "Ensure this value is greater than or equal to 1.");
        }

        if times.is_empty() {
            add("times", "At least one reminder time is required.");
        } else if let Some(bad) = times.iter().find(|time| !is_valid_time(time)) {
            add("times", &format!("'{}' is not a valid time, expected HH:MM.", bad));
        }

        if self.end_date.is_some_and(|end| end < self.start_date) {
            add("end_date", "End date cannot be before the start date.");
        }

        errors
    }
}

pub fn is_valid_time(value: &str) -> bool {
    value.len() == 5 && NaiveTime::parse_from_str(value, "%H:%M").is_ok()
}
