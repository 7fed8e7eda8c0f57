//! Node configuration: TOML file plus environment overrides.

use anyhow::{bail, Context, Result};
use irrigation_forecast::SiteConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Config file structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub node_id: String,
    /// Where the retained state record lives between wakes.
    pub state_path: PathBuf,
    pub time_source: TimeSource,
    pub mqtt: MqttConfig,
    pub site: SiteConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    /// How long to wait for the broker to acknowledge the report.
    pub publish_timeout_s: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSource {
    /// Calendar month from the system clock.
    System,
    /// No time source; rely on the cached month.
    #[serde(rename = "none")]
    Disabled,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: "node-a".to_string(),
            state_path: PathBuf::from("retained.json"),
            time_source: TimeSource::System,
            mqtt: MqttConfig::default(),
            site: SiteConfig::default(),
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1883,
            publish_timeout_s: 10,
        }
    }
}

impl TimeSource {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Some(Self::System),
            "none" | "off" => Some(Self::Disabled),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Environment overrides
// ---------------------------------------------------------------------------

impl NodeConfig {
    /// Apply `NODE_ID`, `MQTT_HOST`, `MQTT_PORT`, `STATE_PATH` and
    /// `TIME_SOURCE` from `lookup` (normally `std::env::var`).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("NODE_ID") {
            self.node_id = v;
        }
        if let Some(v) = lookup("MQTT_HOST") {
            self.mqtt.host = v;
        }
        if let Some(v) = lookup("MQTT_PORT") {
            self.mqtt.port = v
                .trim()
                .parse()
                .with_context(|| format!("invalid MQTT_PORT: {v:?}"))?;
        }
        if let Some(v) = lookup("STATE_PATH") {
            self.state_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("TIME_SOURCE") {
            self.time_source = TimeSource::parse(&v)
                .with_context(|| format!("invalid TIME_SOURCE: {v:?} (use system or none)"))?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Validate all entries.  Returns an error describing every violation.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.node_id.trim().is_empty() {
            errors.push("node_id is empty".to_string());
        } else if self.node_id.contains(['/', '+', '#']) {
            errors.push(format!(
                "node_id '{}' must not contain MQTT topic characters (/ + #)",
                self.node_id
            ));
        }

        if self.state_path.as_os_str().is_empty() {
            errors.push("state_path is empty".to_string());
        }

        if self.mqtt.host.trim().is_empty() {
            errors.push("mqtt.host is empty".to_string());
        }
        if self.mqtt.port == 0 {
            errors.push("mqtt.port must be non-zero".to_string());
        }
        if self.mqtt.publish_timeout_s == 0 {
            errors.push("mqtt.publish_timeout_s must be positive, got 0".to_string());
        }

        if let Err(e) = self.site.validate() {
            errors.push(format!("site: {e}"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "config validation failed ({} error{}):\n  - {}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" },
                errors.join("\n  - ")
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Read and parse the TOML config at `path` (defaults if the file does not
/// exist), apply environment overrides, then validate.
pub fn load(path: &str) -> Result<NodeConfig> {
    let mut config = if Path::new(path).exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;
        toml::from_str(&contents).with_context(|| format!("failed to parse config: {path}"))?
    } else {
        tracing::info!(path, "no config file, using defaults");
        NodeConfig::default()
    };

    config.apply_env(|k| std::env::var(k).ok())?;
    config
        .validate()
        .with_context(|| format!("invalid config: {path}"))?;

    tracing::info!(
        node_id = %config.node_id,
        altitude_m = config.site.altitude_m,
        window_min = config.site.window_minutes(),
        state_path = %config.state_path.display(),
        "config loaded"
    );
    Ok(config)
}

// ===========================================================================
// Tests
// ===========================================================================
