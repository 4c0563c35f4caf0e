//! `HH:MM` parsing and formatting helpers
//!
//! Times cross the tool-call boundary as `HH:MM` strings, and service
//! durations are stored the same way.

use crate::{AtendeError, AtendeResult, ValidationError};
use chrono::{Duration, NaiveTime, Timelike};

/// Parse an `HH:MM` clock time.
pub fn parse_hm(field: &str, value: &str) -> AtendeResult<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| {
        AtendeError::Validation(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected HH:MM, got \"{value}\""),
        })
    })
}

/// Format a clock time as `HH:MM`.
pub fn format_hm(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Parse an `HH:MM` duration (hours:minutes) into a positive [`Duration`].
pub fn parse_duration_hm(value: &str) -> AtendeResult<Duration> {
    let invalid = |reason: String| {
        AtendeError::Validation(ValidationError::InvalidValue {
            field: "duration".to_string(),
            reason,
        })
    };

    let (hours, minutes) = value
        .split_once(':')
        .ok_or_else(|| invalid(format!("expected HH:MM, got \"{value}\"")))?;
    let hours: i64 = hours
        .parse()
        .map_err(|_| invalid(format!("non-numeric hours in \"{value}\"")))?;
    let minutes: i64 = minutes
        .parse()
        .map_err(|_| invalid(format!("non-numeric minutes in \"{value}\"")))?;
    if hours < 0 || !(0..60).contains(&minutes) {
        return Err(invalid(format!("out-of-range duration \"{value}\"")));
    }
    let total = hours * 60 + minutes;
    if total == 0 {
        return Err(invalid("zero-length duration".to_string()));
    }
    Ok(Duration::minutes(total))
}
