use chrono::{Duration, FixedOffset, Offset, Utc};

/// Policy constants that govern gig lifecycles and audience interaction
#[derive(Debug, Clone)]
pub struct Config {
    /// How long after the scheduled start an upcoming gig is flagged to check with the venue
    pub check_with_venue_after_in_minutes: i64,
    /// How long after the scheduled start a gig is closed automatically
    pub auto_close_after_in_minutes: i64,
    /// How often the lifecycle sweep runs
    pub sweep_interval_in_seconds: u64,
    /// The UTC offset gig dates and times are written in
    pub venue_utc_offset_in_seconds: i32,
    /// How close to the venue an audience member must be to vote or submit requests
    pub interaction_radius_in_km: f64,
    /// How close to the venue an audience member must be to join a gig
    pub join_radius_in_km: f64,
}

impl Config {
    pub fn check_with_venue_after(&self) -> Duration {
        Duration::minutes(self.check_with_venue_after_in_minutes)
    }

    pub fn auto_close_after(&self) -> Duration {
        Duration::minutes(self.auto_close_after_in_minutes)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_in_seconds)
    }

    /// Returns the venue offset.
    /// Offsets of a day or more are not representable and read as UTC, settings reject them up front.
    pub fn venue_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.venue_utc_offset_in_seconds).unwrap_or_else(|| Utc.fix())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Tolerates normal start-time slippage
            check_with_venue_after_in_minutes: 30,
            // 5 hours
            auto_close_after_in_minutes: 60 * 5,
            sweep_interval_in_seconds: 60 * 10,
            // UTC+05:30
            venue_utc_offset_in_seconds: (5 * 60 + 30) * 60,
            interaction_radius_in_km: 5.0,
            join_radius_in_km: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_offset_is_india_standard_time() {
        let config = Config::default();

        assert_eq!(
            config.venue_offset(),
            FixedOffset::east_opt(19800).unwrap()
        );
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        let config = Config {
            venue_utc_offset_in_seconds: 90_000,
            ..Default::default()
        };

        assert_eq!(config.venue_offset(), Utc.fix());
    }
}
