use serde::Deserialize;

use crate::correlator::{ClassificationPolicy, CorrelatorConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub prometheus: PrometheusConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    9846
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrometheusConfig {
    /// Base URL of the Prometheus server, e.g. http://prometheus-server:9090
    pub server: String,
    /// Rate window of the jobstats queries: a number of up to three digits plus s, m, h or d.
    #[serde(default = "default_time_range")]
    pub time_range: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_time_range() -> String {
    "1m".into()
}

fn default_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandsConfig {
    #[serde(default = "default_squeue")]
    pub squeue: String,
    #[serde(default = "default_getent")]
    pub getent: String,
    /// Upper bound for each squeue / getent invocation.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_squeue() -> String {
    "squeue".into()
}

fn default_getent() -> String {
    "getent".into()
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            squeue: default_squeue(),
            getent: default_getent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeConfig {
    /// When set, a background worker scrapes on this interval and /metrics
    /// serves the last result. Otherwise every /metrics request scrapes.
    #[serde(default)]
    pub interval_secs: Option<u64>,
    #[serde(default = "default_metadata_policy")]
    pub metadata_unparseable: ClassificationPolicy,
    #[serde(default = "default_throughput_policy")]
    pub throughput_unparseable: ClassificationPolicy,
}

fn default_metadata_policy() -> ClassificationPolicy {
    ClassificationPolicy::Skip
}

fn default_throughput_policy() -> ClassificationPolicy {
    ClassificationPolicy::Fail
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            interval_secs: None,
            metadata_unparseable: default_metadata_policy(),
            throughput_unparseable: default_throughput_policy(),
        }
    }
}

impl ScrapeConfig {
    pub fn correlator_config(&self) -> CorrelatorConfig {
        CorrelatorConfig {
            metadata_policy: self.metadata_unparseable,
            throughput_policy: self.throughput_unparseable,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// `<1-3 digits><s|m|h|d>`, e.g. `1m`, `30s`, `120m`.
pub fn validate_time_range(time_range: &str) -> anyhow::Result<()> {
    anyhow::ensure!(
        time_range.is_ascii(),
        "prometheus.time_range must be ASCII: {:?}",
        time_range
    );
    anyhow::ensure!(
        (2..=4).contains(&time_range.len()),
        "prometheus.time_range length is not supported: {:?}",
        time_range
    );
    let (number, unit) = time_range.split_at(time_range.len() - 1);
    anyhow::ensure!(
        matches!(unit, "s" | "m" | "h" | "d"),
        "prometheus.time_range unit is not supported: {:?}",
        unit
    );
    anyhow::ensure!(
        number.bytes().all(|b| b.is_ascii_digit()),
        "prometheus.time_range number is not an integer: {:?}",
        number
    );
    Ok(())
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.prometheus.server.is_empty(),
            "prometheus.server must be non-empty"
        );
        crate::prom_repo::query_endpoint(&self.prometheus.server)
            .map_err(|e| anyhow::anyhow!("prometheus.server is not a usable URL: {}", e))?;
        validate_time_range(&self.prometheus.time_range)?;
        anyhow::ensure!(
            self.prometheus.request_timeout_secs > 0,
            "prometheus.request_timeout_secs must be > 0, got {}",
            self.prometheus.request_timeout_secs
        );
        anyhow::ensure!(
            !self.commands.squeue.is_empty(),
            "commands.squeue must be non-empty"
        );
        anyhow::ensure!(
            !self.commands.getent.is_empty(),
            "commands.getent must be non-empty"
        );
        anyhow::ensure!(
            self.commands.timeout_secs > 0,
            "commands.timeout_secs must be > 0, got {}",
            self.commands.timeout_secs
        );
        if let Some(interval) = self.scrape.interval_secs {
            anyhow::ensure!(
                interval > 0,
                "scrape.interval_secs must be > 0 when set, got {}",
                interval
            );
        }
        Ok(())
    }
}
