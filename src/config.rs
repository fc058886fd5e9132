use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::artnet::ARTNET_PORT;
use crate::message::RAMP_CHANNEL;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub controller: ControllerConfig,
    pub monitor: MonitorConfig,
}

/// Where the ramp is sent and how fast
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub host: String,
    pub port: u16,
    pub channel: u8,
    /// Delay after each ramp message, in milliseconds
    pub step_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub host: String,
    pub port: u16,
    /// UDP port for Art-Net ingest
    pub artnet_port: u16,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            host: "192.168.50.229".into(),
            port: 7777,
            channel: RAMP_CHANNEL,
            step_ms: 20,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            host: "0.0.0.0".into(),
            port: 7777,
            artnet_port: ARTNET_PORT,
        }
    }
}

impl ControllerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }
}

impl MonitorConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn artnet_addr(&self) -> String {
        format!("{}:{}", self.host, self.artnet_port)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.controller.addr(), "192.168.50.229:7777");
        assert_eq!(config.controller.channel, 101);
        assert_eq!(config.controller.step_delay(), Duration::from_millis(20));
        assert_eq!(config.monitor.addr(), "0.0.0.0:7777");
        assert_eq!(config.monitor.artnet_addr(), "0.0.0.0:6454");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"controller": {"host": "10.0.0.7", "step_ms": 5}}"#).unwrap();
        assert_eq!(config.controller.addr(), "10.0.0.7:7777");
        assert_eq!(config.controller.step_ms, 5);
        assert_eq!(config.controller.channel, 101);
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let err = Config::load(Path::new("/nonexistent/dmx_ramp.json")).unwrap_err();
        assert!(format!("{}", err).contains("/nonexistent/dmx_ramp.json"));
    }
}
