use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Shortest pause between cycles in seconds
pub const MIN_INTERVAL_SECS: u64 = 1;

/// Longest pause between cycles in seconds (one week)
pub const MAX_INTERVAL_SECS: u64 = 7 * 86400;

/// How the pause between cycles is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Schedule {
    /// Interval counted from the end of the previous batch
    #[default]
    FixedDelay,
    /// Interval counted from the start of the previous batch
    FixedRate,
}

/// Scraper worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Maximum tasks pulled per cycle (default: 10)
    pub batch_size: usize,

    /// Pause between cycles in seconds (default: 5)
    pub interval_secs: u64,

    /// Whether the pause runs from batch end or batch start
    pub schedule: Schedule,

    /// Hosts processed at once within a batch; 1 keeps the batch sequential
    pub concurrency: usize,

    /// Atomically claim tasks before processing, for multi-instance setups
    pub claim: bool,

    /// Age after which another worker may take over a claim (default: 300)
    pub claim_lease_secs: u64,

    /// Name recorded on claims; generated from the process id when unset
    pub worker_id: Option<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            interval_secs: 5,
            schedule: Schedule::FixedDelay,
            concurrency: 1,
            claim: false,
            claim_lease_secs: 300,
            worker_id: None,
        }
    }
}

impl WorkerConfig {
    /// Pause between cycles, clamped to `MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS`.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(
            self.interval_secs
                .clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS),
        )
    }

    pub fn claim_lease(&self) -> Duration {
        Duration::from_secs(self.claim_lease_secs)
    }

    pub fn worker_id(&self) -> String {
        self.worker_id
            .clone()
            .unwrap_or_else(|| format!("pagemeta-{}", std::process::id()))
    }

    /// Parse interval string like "5s", "30m", "1h", "1d"
    pub fn parse_interval(s: &str) -> Result<u64, String> {
        let s = s.trim().to_lowercase();

        let (value, unit, scale) = if let Some(hours) = s.strip_suffix('h') {
            (hours, "hours", 3600)
        } else if let Some(minutes) = s.strip_suffix('m') {
            (minutes, "minutes", 60)
        } else if let Some(days) = s.strip_suffix('d') {
            (days, "days", 86400)
        } else if let Some(secs) = s.strip_suffix('s') {
            (secs, "seconds", 1)
        } else {
            return s
                .parse::<u64>()
                .map_err(|_| format!("Invalid interval: {}. Use format like '5s', '2m', '1h'", s));
        };

        value
            .parse::<u64>()
            .map_err(|_| format!("Invalid {}: {}", unit, value))?
            .checked_mul(scale)
            .ok_or_else(|| format!("Interval too large: {}", s))
    }

    /// Reject settings the poll loop cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("Batch size must be at least 1".into());
        }
        if self.concurrency == 0 {
            return Err("Concurrency must be at least 1".into());
        }
        if !(MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&self.interval_secs) {
            return Err(format!(
                "Interval must be between {} and {}, got {}",
                Self::format_interval(MIN_INTERVAL_SECS),
                Self::format_interval(MAX_INTERVAL_SECS),
                Self::format_interval(self.interval_secs)
            ));
        }
        Ok(())
    }

    /// Format interval for display
    pub fn format_interval(secs: u64) -> String {
        if secs >= 86400 && secs.is_multiple_of(86400) {
            format!("{}d", secs / 86400)
        } else if secs >= 3600 && secs.is_multiple_of(3600) {
            format!("{}h", secs / 3600)
        } else if secs >= 60 && secs.is_multiple_of(60) {
            format!("{}m", secs / 60)
        } else {
            format!("{}s", secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = WorkerConfig::default();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.interval(), Duration::from_secs(5));
        assert_eq!(config.schedule, Schedule::FixedDelay);
        assert_eq!(config.concurrency, 1);
        assert!(!config.claim);
        assert_eq!(config.claim_lease(), Duration::from_secs(300));
    }

    #[test]
    fn test_worker_id_defaults_to_pid() {
        let config = WorkerConfig::default();
        assert_eq!(
            config.worker_id(),
            format!("pagemeta-{}", std::process::id())
        );

        let named = WorkerConfig {
            worker_id: Some("scraper-a".into()),
            ..Default::default()
        };
        assert_eq!(named.worker_id(), "scraper-a");
    }

    #[test]
    fn test_schedule_deserializes_kebab_case() {
        let config: WorkerConfig = toml::from_str("schedule = \"fixed-rate\"").unwrap();
        assert_eq!(config.schedule, Schedule::FixedRate);
        assert_eq!(config.batch_size, 10);
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(WorkerConfig::parse_interval("5s").unwrap(), 5);
        assert_eq!(WorkerConfig::parse_interval("2m").unwrap(), 120);
        assert_eq!(WorkerConfig::parse_interval("1h").unwrap(), 3600);
        assert_eq!(WorkerConfig::parse_interval("1d").unwrap(), 86400);
        assert_eq!(WorkerConfig::parse_interval(" 30 ").unwrap(), 30);
        assert!(WorkerConfig::parse_interval("soon").is_err());
    }

    #[test]
    fn test_parse_interval_overflow_is_an_error() {
        assert!(WorkerConfig::parse_interval("6000000000000000h").is_err());
        assert!(WorkerConfig::parse_interval("999999999999999999d").is_err());
        assert!(WorkerConfig::parse_interval("18446744073709551615m").is_err());
    }

    #[test]
    fn test_interval_is_clamped() {
        let huge = WorkerConfig {
            interval_secs: u64::MAX,
            ..Default::default()
        };
        assert_eq!(huge.interval(), Duration::from_secs(MAX_INTERVAL_SECS));

        let zero = WorkerConfig {
            interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(zero.interval(), Duration::from_secs(MIN_INTERVAL_SECS));
    }

    #[test]
    fn test_validate_bounds() {
        assert!(WorkerConfig::default().validate().is_ok());

        for interval_secs in [0, MAX_INTERVAL_SECS + 1, u64::MAX] {
            let config = WorkerConfig {
                interval_secs,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "interval {}", interval_secs);
        }

        let zero_batch = WorkerConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(zero_batch.validate().is_err());
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(WorkerConfig::format_interval(5), "5s");
        assert_eq!(WorkerConfig::format_interval(120), "2m");
        assert_eq!(WorkerConfig::format_interval(3600), "1h");
        assert_eq!(WorkerConfig::format_interval(86400), "1d");
        assert_eq!(WorkerConfig::format_interval(90), "90s");
    }
}
