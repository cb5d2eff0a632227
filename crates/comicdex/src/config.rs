use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

fn default_dsn() -> String {
    "comicdex.sqlite3".to_string()
}

fn default_source_url() -> String {
    "https://xkcd.com".to_string()
}

fn default_req_timeout_sec() -> u64 {
    5
}

fn default_fetch_limit() -> i64 {
    0
}

fn default_parallel() -> usize {
    4
}

fn default_scan_timeout_sec() -> u64 {
    60
}

fn default_scan_limit() -> usize {
    10
}

fn default_port() -> u16 {
    8080
}

fn default_scheduler_hour() -> u32 {
    3
}

fn default_scheduler_minute() -> u32 {
    0
}

fn default_token_secret() -> String {
    "change-me".to_string()
}

fn default_token_ttl_sec() -> i64 {
    3600
}

fn default_rate_limit() -> u32 {
    2
}

fn default_concurrency_limit() -> usize {
    64
}

/// Layered configuration: a YAML file supplies every key with a built-in
/// default, and a narrow set of CLI flags (currently just `--port`) can
/// override the loaded value afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_dsn")]
    pub dsn: String,

    #[serde(default = "default_source_url")]
    pub source_url: String,

    #[serde(default = "default_req_timeout_sec")]
    pub req_timeout_sec: u64,

    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: i64,

    #[serde(default = "default_parallel")]
    pub parallel: usize,

    #[serde(default = "default_scan_timeout_sec")]
    pub scan_timeout_sec: u64,

    #[serde(default = "default_scan_limit")]
    pub scan_limit: usize,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_scheduler_hour")]
    pub scheduler_hour: u32,

    #[serde(default = "default_scheduler_minute")]
    pub scheduler_minute: u32,

    #[serde(default = "default_token_secret")]
    pub token_secret: String,

    #[serde(default = "default_token_ttl_sec")]
    pub token_ttl_sec: i64,

    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,

    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dsn: default_dsn(),
            source_url: default_source_url(),
            req_timeout_sec: default_req_timeout_sec(),
            fetch_limit: default_fetch_limit(),
            parallel: default_parallel(),
            scan_timeout_sec: default_scan_timeout_sec(),
            scan_limit: default_scan_limit(),
            port: default_port(),
            scheduler_hour: default_scheduler_hour(),
            scheduler_minute: default_scheduler_minute(),
            token_secret: default_token_secret(),
            token_ttl_sec: default_token_ttl_sec(),
            rate_limit: default_rate_limit(),
            concurrency_limit: default_concurrency_limit(),
        }
    }
}

impl Config {
    /// Reads a YAML document from `path`, falling back to every default
    /// for a key it omits. A missing file yields the all-default config;
    /// a malformed one, or one with an out-of-range value, is a fatal
    /// error (the caller exits 1).
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            log::debug!("[ config.load ] no config file at {}, using defaults", path.display());
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects scheduler hour/minute values that don't name a real
    /// wall-clock time, so a bad config fails at startup instead of
    /// silently disabling the scheduler once it's running.
    fn validate(&self) -> anyhow::Result<()> {
        if self.scheduler_hour > 23 {
            anyhow::bail!("scheduler_hour must be between 0 and 23, got {}", self.scheduler_hour);
        }
        if self.scheduler_minute > 59 {
            anyhow::bail!("scheduler_minute must be between 0 and 59, got {}", self.scheduler_minute);
        }
        Ok(())
    }

    pub fn req_timeout(&self) -> Duration {
        Duration::from_secs(self.req_timeout_sec)
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_sec)
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.token_ttl_sec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_fully_populated_by_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.port, default_port());
        assert_eq!(config.source_url, default_source_url());
        assert_eq!(config.parallel, default_parallel());
    }

    #[test]
    fn partial_document_keeps_the_rest_at_default() {
        let config: Config = serde_yaml::from_str("port: 9000\nfetch_limit: 50\n").unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.fetch_limit, 50);
        assert_eq!(config.rate_limit, default_rate_limit());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load(Path::new("/nonexistent/comicdex.yaml")).unwrap();
        assert_eq!(config.port, default_port());
    }

    #[test]
    fn rejects_an_out_of_range_scheduler_hour() {
        let config: Config = serde_yaml::from_str("scheduler_hour: 24\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_an_out_of_range_scheduler_minute() {
        let config: Config = serde_yaml::from_str("scheduler_minute: 60\n").unwrap();
        assert!(config.validate().is_err());
    }
}
