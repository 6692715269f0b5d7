//! Event settings singleton and the teacher's settings form.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub is_booking_enabled: bool,
    #[serde(default)]
    pub booking_start_time: Option<DateTime<Utc>>,
    /// Anchor for estimates before the first interview starts.
    #[serde(default)]
    pub interview_start_time: Option<DateTime<Utc>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            is_booking_enabled: true,
            booking_start_time: None,
            interview_start_time: None,
        }
    }
}

impl Settings {
    /// Booking is open when enabled, or once the scheduled start has passed.
    pub fn is_booking_open(&self, now: DateTime<Utc>) -> bool {
        if self.is_booking_enabled {
            return true;
        }
        match self.booking_start_time {
            Some(start) => now >= start,
            None => false,
        }
    }
}

/// Raw values from the settings form. Each timestamp is a date + time pair;
/// if either half is missing the timestamp is cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsForm {
    pub booking_enabled: bool,
    pub booking_date: Option<String>,
    pub booking_time: Option<String>,
    pub interview_date: Option<String>,
    pub interview_time: Option<String>,
}

impl SettingsForm {
    /// The form as it opens: stored values shown as local date and time.
    pub fn prefilled<Tz: TimeZone>(settings: &Settings, tz: &Tz) -> Self {
        let (booking_date, booking_time) = split(settings.booking_start_time, tz);
        let (interview_date, interview_time) = split(settings.interview_start_time, tz);
        Self {
            booking_enabled: settings.is_booking_enabled,
            booking_date,
            booking_time,
            interview_date,
            interview_time,
        }
    }

    /// Resolve the form into a full settings record, reading dates and times
    /// as wall-clock values in `tz`.
    pub fn into_settings<Tz: TimeZone>(self, tz: &Tz) -> Result<Settings, ValidationError> {
        Ok(Settings {
            is_booking_enabled: self.booking_enabled,
            booking_start_time: combine(
                "booking_start_time",
                self.booking_date.as_deref(),
                self.booking_time.as_deref(),
                tz,
            )?,
            interview_start_time: combine(
                "interview_start_time",
                self.interview_date.as_deref(),
                self.interview_time.as_deref(),
                tz,
            )?,
        })
    }
}

fn split<Tz: TimeZone>(
    at: Option<DateTime<Utc>>,
    tz: &Tz,
) -> (Option<String>, Option<String>) {
    match at {
        Some(at) => {
            let local = at.with_timezone(tz).naive_local();
            (
                Some(local.date().format("%Y-%m-%d").to_string()),
                Some(local.time().format("%H:%M").to_string()),
            )
        }
        None => (None, None),
    }
}

fn combine<Tz: TimeZone>(
    field: &'static str,
    date: Option<&str>,
    time: Option<&str>,
    tz: &Tz,
) -> Result<Option<DateTime<Utc>>, ValidationError> {
    let (date, time) = match (date.map(str::trim), time.map(str::trim)) {
        (Some(d), Some(t)) if !d.is_empty() && !t.is_empty() => (d, t),
        _ => return Ok(None),
    };

    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
        ValidationError::InvalidValue {
            field,
            message: format!("date '{date}': {e}"),
        }
    })?;
    let time = NaiveTime::parse_from_str(time, "%H:%M").map_err(|e| {
        ValidationError::InvalidValue {
            field,
            message: format!("time '{time}': {e}"),
        }
    })?;

    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .ok_or(ValidationError::InvalidValue {
            field,
            message: "local time does not exist".into(),
        })
}
