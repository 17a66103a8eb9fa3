use farefinder_core::Secret;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub resiliency: ResiliencyConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProvidersConfig {
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
    pub amadeus: AmadeusConfig,
    pub aviationstack: AviationStackConfig,
}

impl ProvidersConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AmadeusConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: Secret,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// ISO 4217 code to request prices in; provider default when unset.
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AviationStackConfig {
    pub base_url: String,
    pub access_key: Secret,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResiliencyConfig {
    pub failure_threshold: usize,
    pub reset_timeout_seconds: u64,
}

impl Default for ResiliencyConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub idle_ttl_seconds: u64,
    pub sweep_interval_seconds: u64,
}

impl SessionConfig {
    /// `None` when the configured TTL does not fit a `chrono::Duration`.
    pub fn idle_ttl(&self) -> Option<chrono::Duration> {
        i64::try_from(self.idle_ttl_seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_seconds: 1800,
            sweep_interval_seconds: 60,
        }
    }
}

fn default_timeout_ms() -> u64 { 10_000 }

fn default_max_results() -> u32 { 50 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `FAREFINDER__PROVIDERS__AMADEUS__CLIENT_SECRET=...`
            .add_source(config::Environment::with_prefix("FAREFINDER").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Parse a TOML document on its own, without files or environment.
    pub fn from_toml(source: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        port = 8080

        [providers]
        request_timeout_ms = 2500

        [providers.amadeus]
        base_url = "https://test.api.amadeus.com"
        client_id = "client"
        client_secret = "shh"

        [providers.aviationstack]
        base_url = "http://api.aviationstack.com"
        access_key = "key"

        [sessions]
        idle_ttl_seconds = 600
        sweep_interval_seconds = 30
    "#;

    #[test]
    fn test_config_from_toml() {
        let config = Config::from_toml(SAMPLE).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.providers.request_timeout(), Duration::from_millis(2500));
        assert_eq!(config.providers.amadeus.max_results, 50);
        assert_eq!(config.providers.amadeus.client_secret.expose(), "shh");
        assert!(config.providers.amadeus.currency.is_none());
        assert_eq!(config.sessions.idle_ttl_seconds, 600);
        assert_eq!(config.resiliency.failure_threshold, 5);
    }

    #[test]
    fn test_config_debug_masks_credentials() {
        let config = Config::from_toml(SAMPLE).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("shh"));
        assert!(printed.contains("********"));
    }

    #[test]
    fn test_idle_ttl_rejects_out_of_range() {
        let mut sessions = SessionConfig::default();
        assert_eq!(sessions.idle_ttl(), Some(chrono::Duration::minutes(30)));

        sessions.idle_ttl_seconds = u64::MAX;
        assert_eq!(sessions.idle_ttl(), None);
        sessions.idle_ttl_seconds = i64::MAX as u64;
        assert_eq!(sessions.idle_ttl(), None);
    }
}
