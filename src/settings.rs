use std::env;

use chrono::FixedOffset;
use gigwave_core::Config;
use gigwave_server::DEFAULT_PORT;

use crate::GigwaveError;

/// Everything gigwave needs to start, read from the environment
#[derive(Debug)]
pub struct Settings {
    pub port: u16,
    pub database_url: String,
    pub config: Config,
}

impl Settings {
    pub fn from_env() -> Result<Self, GigwaveError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, GigwaveError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("GIGWAVE_SERVER_PORT") {
            Some(port) => port.parse::<u16>().map_err(|_| {
                GigwaveError::Settings(format!("GIGWAVE_SERVER_PORT must be a port, got {}", port))
            })?,
            None => DEFAULT_PORT,
        };

        let database_url = lookup("GIGWAVE_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .ok_or_else(|| GigwaveError::Settings("GIGWAVE_DATABASE_URL is not set".into()))?;

        let mut config = Config::default();

        if let Some(interval) = lookup("GIGWAVE_SWEEP_INTERVAL_SECS") {
            config.sweep_interval_in_seconds = interval
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    GigwaveError::Settings(format!(
                        "GIGWAVE_SWEEP_INTERVAL_SECS must be a positive number, got {}",
                        interval
                    ))
                })?;
        }

        if let Some(offset) = lookup("GIGWAVE_VENUE_UTC_OFFSET_SECS") {
            config.venue_utc_offset_in_seconds = offset
                .parse::<i32>()
                .ok()
                .filter(|secs| FixedOffset::east_opt(*secs).is_some())
                .ok_or_else(|| {
                    GigwaveError::Settings(format!(
                        "GIGWAVE_VENUE_UTC_OFFSET_SECS must be within a day of UTC, got {}",
                        offset
                    ))
                })?;
        }

        Ok(Self {
            port,
            database_url,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, GigwaveError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let settings = settings(&[("DATABASE_URL", "postgres://localhost/gigwave")]).unwrap();

        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.database_url, "postgres://localhost/gigwave");
        assert_eq!(settings.config.sweep_interval_in_seconds, 600);
        assert_eq!(settings.config.venue_utc_offset_in_seconds, 19800);
    }

    #[test]
    fn venue_offset_is_read_in_seconds() {
        let settings = settings(&[
            ("DATABASE_URL", "x"),
            ("GIGWAVE_VENUE_UTC_OFFSET_SECS", "-18000"),
        ])
        .unwrap();

        assert_eq!(
            settings.config.venue_offset(),
            FixedOffset::west_opt(18000).unwrap()
        );
    }

    #[test]
    fn out_of_range_venue_offsets_are_rejected() {
        for offset in ["90000", "-86400", "ist"] {
            let result = settings(&[
                ("DATABASE_URL", "x"),
                ("GIGWAVE_VENUE_UTC_OFFSET_SECS", offset),
            ]);

            assert!(
                matches!(result, Err(GigwaveError::Settings(_))),
                "{} should be rejected",
                offset
            );
        }
    }

    #[test]
    fn gigwave_database_url_wins() {
        let settings = settings(&[
            ("DATABASE_URL", "postgres://localhost/other"),
            ("GIGWAVE_DATABASE_URL", "postgres://localhost/gigwave"),
            ("GIGWAVE_SWEEP_INTERVAL_SECS", "30"),
        ])
        .unwrap();

        assert_eq!(settings.database_url, "postgres://localhost/gigwave");
        assert_eq!(settings.config.sweep_interval_in_seconds, 30);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(settings(&[]).is_err());
        assert!(settings(&[("DATABASE_URL", "x"), ("GIGWAVE_SERVER_PORT", "http")]).is_err());
        assert!(settings(&[("DATABASE_URL", "x"), ("GIGWAVE_SWEEP_INTERVAL_SECS", "0")]).is_err());
    }
}
