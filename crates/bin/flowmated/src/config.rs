//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `flowmate.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use flowmate_adapter_virtual::SoftphoneScript;
use flowmate_domain::next_call::DEFAULT_DISPOSITION_ID;
use flowmate_domain::trigger::TriggerPolicy;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Where the controller believes it is running.
    pub console: ConsoleConfig,
    /// Call-loop tuning.
    pub automation: AutomationSection,
    /// Timings of the simulated console.
    pub simulation: SimulationConfig,
    /// Environment overrides that could not be applied.
    #[serde(skip)]
    ignored: Vec<IgnoredOverride>,
}

/// An environment override whose value was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredOverride {
    pub key: &'static str,
    pub value: String,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Page identity used for surface detection.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub host: String,
    /// Name of the frame the controller runs in, empty for a top-level page.
    pub frame_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AutomationSection {
    /// Call-status poll period in milliseconds.
    pub poll_interval_ms: u64,
    pub trigger_policy: TriggerPolicy,
    /// Disposition option selected by the next-call sequence.
    pub disposition_id: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seconds a simulated call rings before it is answered; omit to never
    /// answer.
    pub answer_after_secs: Option<u64>,
    pub next_call_after_secs: u64,
    pub call_type: String,
    /// Seconds between simulated record tabs; `0` disables.
    pub tab_every_secs: u64,
    /// Seconds between simulated toasts; `0` disables.
    pub toast_every_secs: u64,
}

impl Config {
    /// Load configuration from `flowmate.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("flowmate.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// Overrides rejected while loading. Logging is not set up yet at that
    /// point, so the caller reports them once it is.
    #[must_use]
    pub fn ignored_overrides(&self) -> &[IgnoredOverride] {
        &self.ignored
    }

    /// Apply `FLOWMATE_*` overrides read through `var`. Unparsable numbers
    /// and policy names are skipped and recorded in `ignored`.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("FLOWMATE_HOST") {
            self.server.host = val;
        }
        if let Some(port) = self.parsed(&var, "FLOWMATE_PORT") {
            self.server.port = port;
        }
        if let Some(val) = var("FLOWMATE_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => self.ignore("FLOWMATE_BIND", val.clone()),
            }
        }
        if let Some(val) = var("FLOWMATE_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("FLOWMATE_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("FLOWMATE_CONSOLE_HOST") {
            self.console.host = val;
        }
        if let Some(val) = var("FLOWMATE_FRAME_NAME") {
            self.console.frame_name = val;
        }
        if let Some(ms) = self.parsed(&var, "FLOWMATE_POLL_INTERVAL_MS") {
            self.automation.poll_interval_ms = ms;
        }
        if let Some(id) = self.parsed(&var, "FLOWMATE_DISPOSITION_ID") {
            self.automation.disposition_id = id;
        }
        if let Some(val) = var("FLOWMATE_TRIGGER_POLICY") {
            match val.as_str() {
                "standard" => self.automation.trigger_policy = TriggerPolicy::Standard,
                "wrap_up_aware" => self.automation.trigger_policy = TriggerPolicy::WrapUpAware,
                other => self.ignore("FLOWMATE_TRIGGER_POLICY", other.to_string()),
            }
        }
    }

    fn parsed<T: std::str::FromStr>(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
        key: &'static str,
    ) -> Option<T> {
        let raw = var(key)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.ignore(key, raw);
                None
            }
        }
    }

    fn ignore(&mut self, key: &'static str, value: String) {
        self.ignored.push(IgnoredOverride { key, value });
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.automation.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "poll interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

impl AutomationSection {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl SimulationConfig {
    /// The softphone script these timings describe.
    #[must_use]
    pub fn script(&self, disposition_id: u32) -> SoftphoneScript {
        SoftphoneScript {
            answer_after: self.answer_after_secs.map(Duration::from_secs),
            next_call_after: Duration::from_secs(self.next_call_after_secs),
            call_type: self.call_type.clone(),
            disposition_id,
        }
    }

    #[must_use]
    pub fn tab_every(&self) -> Option<Duration> {
        period(self.tab_every_secs)
    }

    #[must_use]
    pub fn toast_every(&self) -> Option<Duration> {
        period(self.toast_every_secs)
    }
}

fn period(secs: u64) -> Option<Duration> {
    (secs > 0).then_some(Duration::from_secs(secs))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:flowmate.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "flowmated=info,flowmate=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            host: "app.five9.com".to_string(),
            frame_name: String::new(),
        }
    }
}

impl Default for AutomationSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            trigger_policy: TriggerPolicy::default(),
            disposition_id: DEFAULT_DISPOSITION_ID,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            answer_after_secs: Some(8),
            next_call_after_secs: 5,
            call_type: "Outbound Call".to_string(),
            tab_every_secs: 20,
            toast_every_secs: 15,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
