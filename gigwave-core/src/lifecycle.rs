use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use thiserror::Error;

use crate::{Config, GigStatus};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

/// When a gig is scheduled to start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    start: DateTime<FixedOffset>,
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Invalid gig date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Invalid gig time {0:?}, expected HH:MM")]
    InvalidTime(String),
    #[error("Gig start {date} {time} does not exist in the venue's timezone")]
    Nonexistent { date: String, time: String },
}

impl Schedule {
    /// Parses a gig's date and time, as written in the venue's offset
    pub fn parse(date: &str, time: &str, offset: FixedOffset) -> Result<Self, ScheduleError> {
        let parsed_date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
            .map_err(|_| ScheduleError::InvalidDate(date.to_string()))?;

        let parsed_time = TIME_FORMATS
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(time.trim(), format).ok())
            .ok_or_else(|| ScheduleError::InvalidTime(time.to_string()))?;

        let start = offset
            .from_local_datetime(&parsed_date.and_time(parsed_time))
            .single()
            .ok_or_else(|| ScheduleError::Nonexistent {
                date: date.to_string(),
                time: time.to_string(),
            })?;

        Ok(Self { start })
    }

    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    /// Time passed since the scheduled start, negative if the gig is in the future
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.start)
    }
}

/// A status change that happens purely because time has passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutomaticTransition {
    pub from: GigStatus,
    pub to: GigStatus,
}

impl AutomaticTransition {
    /// A gig that ends also stops playing
    pub fn clears_now_playing(&self) -> bool {
        self.to == GigStatus::Ended
    }
}

/// Decides whether a gig should move on, given how long ago it was supposed to start.
///
/// - Upcoming gigs are flagged to check with the venue once they are late.
/// - Gigs that never went live are cancelled after the auto close threshold.
/// - Live gigs the artist forgot to end are ended after the same threshold.
pub fn automatic_transition(
    status: GigStatus,
    elapsed: Duration,
    config: &Config,
) -> Option<AutomaticTransition> {
    let check_after = config.check_with_venue_after();
    let close_after = config.auto_close_after();

    let to = match status {
        GigStatus::Upcoming if elapsed >= check_after && elapsed < close_after => {
            GigStatus::CheckWithVenue
        }
        GigStatus::Upcoming | GigStatus::CheckWithVenue if elapsed >= close_after => {
            GigStatus::Cancelled
        }
        GigStatus::Live if elapsed >= close_after => GigStatus::Ended,
        _ => return None,
    };

    Some(AutomaticTransition { from: status, to })
}
