// Runtime configuration read from the environment (after `.env` is loaded)

use std::time::Duration;

use tracing::warn;

/// Development endpoint assumed to have no server behind it
pub const DEFAULT_OFFLINE_ENDPOINT: &str = "localhost:8080";

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env_string(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value ({}), using default", key, raw);
            default
        }),
        None => default,
    }
}

fn env_millis(key: &str, default_ms: u64) -> Duration {
    non_zero_millis(key, env_parse(key, default_ms), default_ms)
}

fn non_zero_millis(key: &str, ms: u64, default_ms: u64) -> Duration {
    if ms == 0 {
        warn!("{} must be greater than zero, using default", key);
        return Duration::from_millis(default_ms);
    }
    Duration::from_millis(ms)
}

/// Broadcast server and collaborator endpoint settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Cadence of the per-agent progress script
    pub step_interval: Duration,
    /// Simulated transcription latency
    pub voice_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            step_interval: Duration::from_secs(2),
            voice_delay: Duration::from_millis(1_500),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse("WS_PORT", defaults.port),
            step_interval: env_millis("OMNIDASH_STEP_INTERVAL_MS", 2_000),
            voice_delay: Duration::from_millis(env_parse("OMNIDASH_VOICE_DELAY_MS", 1_500)),
        }
    }
}

/// Reconnection policy for the duplex channel
///
/// The n-th retry waits `base_delay * n`; after `max_attempts` failed
/// retries the channel stays offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt` (1-based), or `None` once the
    /// budget is spent
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        Some(self.base_delay.saturating_mul(attempt))
    }
}

/// Dashboard client settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Address of the broadcast server; `None` means offline mode
    pub ws_url: Option<String>,
    /// Endpoints known to have no server in development
    pub offline_endpoints: Vec<String>,
    /// Base URL of the collaborator HTTP endpoints
    pub api_url: String,
    pub reconnect: ReconnectPolicy,
    pub simulation_tick: Duration,
    pub metrics_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ws_url: None,
            offline_endpoints: vec![DEFAULT_OFFLINE_ENDPOINT.to_string()],
            api_url: "http://localhost:8080".to_string(),
            reconnect: ReconnectPolicy::default(),
            simulation_tick: Duration::from_millis(1_500),
            metrics_interval: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let offline_endpoints = match env_string("OMNIDASH_OFFLINE_ENDPOINTS") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.offline_endpoints,
        };

        Self {
            ws_url: env_string("OMNIDASH_WS_URL").or_else(|| env_string("NEXT_PUBLIC_WS_URL")),
            offline_endpoints,
            api_url: env_string("OMNIDASH_API_URL").unwrap_or(defaults.api_url),
            reconnect: ReconnectPolicy {
                max_attempts: env_parse("OMNIDASH_MAX_RECONNECT_ATTEMPTS", 3),
                base_delay: env_millis("OMNIDASH_RECONNECT_DELAY_MS", 2_000),
            },
            simulation_tick: env_millis("OMNIDASH_SIMULATION_TICK_MS", 1_500),
            metrics_interval: env_millis("OMNIDASH_METRICS_INTERVAL_MS", 5_000),
        }
    }

    /// Whether the channel should be skipped entirely
    pub fn is_offline_address(&self, address: Option<&str>) -> bool {
        match address {
            None => true,
            Some(url) if url.trim().is_empty() => true,
            Some(url) => self.offline_endpoints.iter().any(|e| url.contains(e.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_grow_linearly_then_stop() {
        let policy = ReconnectPolicy::default();

        assert_eq!(policy.delay_for(1), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_for(2), Some(Duration::from_secs(4)));
        assert_eq!(policy.delay_for(3), Some(Duration::from_secs(6)));
        assert_eq!(policy.delay_for(4), None);
        assert_eq!(policy.delay_for(0), None);
    }

    #[test]
    fn huge_base_delay_saturates_instead_of_overflowing() {
        let policy = ReconnectPolicy {
            max_attempts: 3,
            base_delay: Duration::MAX,
        };

        assert_eq!(policy.delay_for(1), Some(Duration::MAX));
        assert_eq!(policy.delay_for(3), Some(Duration::MAX));
    }

    #[test]
    fn zero_millis_falls_back_to_default() {
        assert_eq!(
            non_zero_millis("OMNIDASH_STEP_INTERVAL_MS", 0, 2_000),
            Duration::from_secs(2)
        );
        assert_eq!(
            non_zero_millis("OMNIDASH_STEP_INTERVAL_MS", 250, 2_000),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn zero_interval_from_env_uses_default() {
        std::env::set_var("OMNIDASH_TEST_ZERO_TICK_MS", "0");
        std::env::set_var("OMNIDASH_TEST_BAD_TICK_MS", "soon");
        std::env::set_var("OMNIDASH_TEST_GOOD_TICK_MS", "750");

        assert_eq!(env_millis("OMNIDASH_TEST_ZERO_TICK_MS", 1_500), Duration::from_millis(1_500));
        assert_eq!(env_millis("OMNIDASH_TEST_BAD_TICK_MS", 1_500), Duration::from_millis(1_500));
        assert_eq!(env_millis("OMNIDASH_TEST_GOOD_TICK_MS", 1_500), Duration::from_millis(750));
        assert_eq!(env_millis("OMNIDASH_TEST_UNSET_TICK_MS", 1_500), Duration::from_millis(1_500));
    }

    #[test]
    fn missing_or_known_dev_address_is_offline() {
        let config = ClientConfig::default();

        assert!(config.is_offline_address(None));
        assert!(config.is_offline_address(Some("")));
        assert!(config.is_offline_address(Some("ws://localhost:8080")));
        assert!(!config.is_offline_address(Some("ws://agents.example.com/ws")));
    }

    #[test]
    fn empty_offline_list_allows_localhost() {
        let config = ClientConfig {
            offline_endpoints: vec![],
            ..ClientConfig::default()
        };
        assert!(!config.is_offline_address(Some("ws://localhost:8080")));
    }
}
