//! Parsing of user-supplied schedule times
//!
//! Accepts, in order of preference: a raw Unix timestamp, a relative
//! duration ("2h", "45 min"), an RFC 3339 instant, a local
//! "YYYY-MM-DD HH:MM" stamp, or natural language ("tomorrow 3pm").

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use crate::error::{GramcastError, Result};

/// Parse a schedule string into an instant
pub fn parse_schedule(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(GramcastError::InvalidInput(
            "schedule string cannot be empty".to_string(),
        ));
    }

    // Raw Unix timestamp, as older tooling passed around
    if input.chars().all(|c| c.is_ascii_digit()) {
        let ts: i64 = input.parse().map_err(|_| {
            GramcastError::InvalidInput(format!("timestamp out of range: {}", input))
        })?;
        return DateTime::from_timestamp(ts, 0).ok_or_else(|| {
            GramcastError::InvalidInput(format!("timestamp out of range: {}", input))
        });
    }

    // Relative durations: "2h", "30m", "1 day"
    if let Ok(duration) = humantime::parse_duration(input) {
        let seconds = duration.as_secs() as i64;
        let delta = chrono::Duration::try_seconds(seconds).ok_or_else(|| {
            GramcastError::InvalidInput(format!("duration out of range: {}", input))
        })?;
        return Ok(Utc::now() + delta);
    }

    // Absolute instants
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M") {
        return Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| {
                GramcastError::InvalidInput(format!("ambiguous local time: {}", input))
            });
    }

    // Natural language, last
    chrono_english::parse_date_string(input, Local::now(), chrono_english::Dialect::Us)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            GramcastError::InvalidInput(format!("could not parse schedule time: {}", input))
        })
}

/// Reject instants that are not strictly in the future
pub fn ensure_future(scheduled: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
    if scheduled <= now {
        return Err(GramcastError::InvalidInput(format!(
            "scheduled time must be in the future (got {})",
            scheduled.to_rfc3339()
        )));
    }
    Ok(())
}
