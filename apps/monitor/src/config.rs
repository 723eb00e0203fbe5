//! Monitor configuration.
//!
//! Configuration is stored as TOML:
//! - `$THERMOWATCH_CONFIG` when set
//! - Linux: `~/.config/thermowatch/monitor.toml`
//! - Windows: `%APPDATA%/thermowatch/monitor.toml`
//!
//! The `PORT` environment variable overrides `port`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use thermowatch_protocol::constants::{
    DEFAULT_HISTORY_CAPACITY, DEFAULT_POLL_INTERVAL, DEFAULT_PORT, DEFAULT_SINK_TIMEOUT,
};

/// Monitor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server port (0 = auto-assign).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Sensor poll period in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Number of readings kept for late viewers.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Directory served for paths no API route matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,

    #[serde(default)]
    pub sensor: SensorConfig,

    /// Upstream endpoint that receives every accepted reading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink: Option<SinkConfig>,
}

/// Which sensor source to poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SensorConfig {
    /// MAX6675 on a Linux spidev device.
    Spidev {
        #[serde(default = "default_device")]
        device: PathBuf,
    },
    /// Synthetic waveform, no hardware needed.
    Simulated,
}

impl SensorConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Spidev { .. } => "spidev",
            Self::Simulated => "simulated",
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self::Spidev {
            device: default_device(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkConfig {
    pub endpoint: String,

    #[serde(default = "default_sink_timeout_ms")]
    pub timeout_ms: u64,

    /// Extra request headers, e.g. a deployment bypass token.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl SinkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_device() -> PathBuf {
    PathBuf::from("/dev/spidev0.0")
}

fn default_sink_timeout_ms() -> u64 {
    DEFAULT_SINK_TIMEOUT.as_millis() as u64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            poll_interval_ms: default_poll_interval_ms(),
            history_capacity: default_history_capacity(),
            static_dir: None,
            sensor: SensorConfig::default(),
            sink: None,
        }
    }
}

impl Config {
    /// Loads configuration from disk (creating a default file if missing),
    /// applies the `PORT` override and validates the result.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path();
        let mut config = Self::load_from(&path)?;
        config.apply_port_override(std::env::var("PORT").ok().as_deref())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path`, or writes and returns the defaults if it does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: Config =
                toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
            tracing::debug!(path = %path.display(), "configuration read");
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            tracing::info!(path = %path.display(), "wrote default configuration");
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Sink headers may carry tokens.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Replaces `port` with the value of a `PORT` variable, if given.
    pub fn apply_port_override(&mut self, port: Option<&str>) -> anyhow::Result<()> {
        if let Some(raw) = port {
            self.port = raw
                .trim()
                .parse()
                .with_context(|| format!("invalid PORT value {raw:?}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be at least 1");
        }
        if self.history_capacity == 0 {
            bail!("history_capacity must be at least 1");
        }
        if let Some(sink) = &self.sink {
            thermowatch_sink::parse_endpoint(&sink.endpoint)
                .context("sink endpoint must be an http(s) URL")?;
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Returns the configuration file path.
fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("THERMOWATCH_CONFIG") {
        return PathBuf::from(path);
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("thermowatch").join("monitor.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("thermowatch")
            .join("monitor.toml")
    }
}
