use std::time::Duration;

use tracing::warn;

pub const DEFAULT_URL: &str = "http://localhost:55824/config";

#[derive(Clone, Debug)]
pub struct DiscoveryConfig {
    /// Base URL of the discovery service. The main document is served here,
    /// the dependent documents under fixed suffixes.
    pub url: String,

    // =========================
    // Refresh loop
    // =========================
    /// Fixed period between refresh cycles while the service is healthy.
    pub refresh_interval: Duration,

    /// Upper bound for a single HTTP fetch. Kept below `refresh_interval`
    /// so a hung request cannot overlap the next tick.
    pub fetch_timeout: Duration,

    /// Ceiling for the delay between attempts after repeated failures.
    /// The delay doubles per consecutive failure, starting at
    /// `refresh_interval`.
    pub max_backoff: Duration,

    // =========================
    // Update feed
    // =========================
    /// Buffered notifications per subscriber. A subscriber that falls further
    /// behind loses the oldest ones.
    pub updates_capacity: usize,
}

impl DiscoveryConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            refresh_interval: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(4),
            max_backoff: Duration::from_secs(60),
            updates_capacity: 16,
        }
    }

    pub fn from_env() -> Self {
        let url = std::env::var("CONFIG_DISCOVERY_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        let defaults = Self::new(url);

        Self {
            refresh_interval: env_millis("CONFIG_REFRESH_INTERVAL_MS", defaults.refresh_interval),
            fetch_timeout: env_millis("CONFIG_FETCH_TIMEOUT_MS", defaults.fetch_timeout),
            max_backoff: env_millis("CONFIG_MAX_BACKOFF_MS", defaults.max_backoff),
            updates_capacity: env_parse("CONFIG_UPDATES_CAPACITY", defaults.updates_capacity),
            ..defaults
        }
    }

    /// Delay before the next attempt after `failures` consecutive failures.
    pub fn backoff(&self, failures: u32) -> Duration {
        if failures == 0 {
            return self.refresh_interval;
        }

        let factor = 1u32.checked_shl(failures - 1).unwrap_or(u32::MAX);
        self.refresh_interval
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
            .max(self.refresh_interval)
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

fn env_millis(key: &str, default: Duration) -> Duration {
    Duration::from_millis(env_parse(key, default.as_millis() as u64))
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Debug,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, ?default, "invalid value in environment; using default");
            default
        }),
        Err(_) => default,
    }
}
