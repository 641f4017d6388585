use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::throttle::DEFAULT_COOLDOWN;

pub const CONFIG_PATH_ENV: &str = "FRIGATE_NOTIFIER_CONFIG";

const DEFAULT_MQTT_HOST: &str = "localhost";
const DEFAULT_MQTT_PORT: u16 = 1883;
const DEFAULT_TOPIC: &str = "frigate/events";
const DEFAULT_CLIENT_ID: &str = "frigate_notifier";
const DEFAULT_SNAPSHOT_BASE: &str = "http://frigate:5000";
const DEFAULT_COMPREFACE_HOST: &str = "http://compreface:8000";
const DEFAULT_PLATES_PATH: &str = "known_plates.json";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize, Default)]
struct NotifierConfigFile {
    mqtt: Option<MqttConfigFile>,
    frigate: Option<FrigateConfigFile>,
    compreface: Option<CompreFaceConfigFile>,
    known_plates_path: Option<PathBuf>,
    cooldown_secs: Option<u64>,
    http_timeout_secs: Option<u64>,
    notify_topic: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct MqttConfigFile {
    host: Option<String>,
    port: Option<u16>,
    topic: Option<String>,
    client_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct FrigateConfigFile {
    snapshot_base: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct CompreFaceConfigFile {
    host: Option<String>,
    api_key: Option<String>,
    min_similarity: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub mqtt: MqttSettings,
    pub snapshot_base: String,
    pub compreface: CompreFaceSettings,
    pub known_plates_path: PathBuf,
    pub cooldown: Duration,
    pub http_timeout: Duration,
    /// When set, notifications are also published to this MQTT topic.
    pub notify_topic: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub topic: String,
    pub client_id: String,
}

#[derive(Debug, Clone)]
pub struct CompreFaceSettings {
    pub host: String,
    pub api_key: Option<String>,
    pub min_similarity: f64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self::from_file(NotifierConfigFile::default())
    }
}

impl NotifierConfig {
    /// Defaults, then the JSON file named by `FRIGATE_NOTIFIER_CONFIG`, then
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var(CONFIG_PATH_ENV).ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: NotifierConfigFile) -> Self {
        let mqtt_file = file.mqtt.unwrap_or_default();
        let compreface_file = file.compreface.unwrap_or_default();
        Self {
            mqtt: MqttSettings {
                host: mqtt_file
                    .host
                    .unwrap_or_else(|| DEFAULT_MQTT_HOST.to_string()),
                port: mqtt_file.port.unwrap_or(DEFAULT_MQTT_PORT),
                topic: mqtt_file.topic.unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
                client_id: mqtt_file
                    .client_id
                    .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
            },
            snapshot_base: file
                .frigate
                .and_then(|frigate| frigate.snapshot_base)
                .unwrap_or_else(|| DEFAULT_SNAPSHOT_BASE.to_string()),
            compreface: CompreFaceSettings {
                host: compreface_file
                    .host
                    .unwrap_or_else(|| DEFAULT_COMPREFACE_HOST.to_string()),
                api_key: compreface_file.api_key,
                min_similarity: compreface_file.min_similarity.unwrap_or(0.0),
            },
            known_plates_path: file
                .known_plates_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PLATES_PATH)),
            cooldown: file
                .cooldown_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_COOLDOWN),
            http_timeout: Duration::from_secs(
                file.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
            notify_topic: file.notify_topic,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(host) = env_nonempty("MQTT_HOST") {
            self.mqtt.host = host;
        }
        if let Some(port) = env_nonempty("MQTT_PORT") {
            self.mqtt.port = port
                .parse()
                .map_err(|_| anyhow!("MQTT_PORT must be a port number, got '{}'", port))?;
        }
        if let Some(topic) = env_nonempty("FRIGATE_MQTT_TOPIC") {
            self.mqtt.topic = topic;
        }
        if let Some(client_id) = env_nonempty("MQTT_CLIENT_ID") {
            self.mqtt.client_id = client_id;
        }
        if let Some(base) = env_nonempty("FRIGATE_SNAPSHOT_BASE") {
            self.snapshot_base = base;
        }
        if let Some(host) = env_nonempty("COMPRE_FACE_HOST") {
            self.compreface.host = host;
        }
        if let Some(key) = env_nonempty("COMPRE_FACE_API_KEY") {
            self.compreface.api_key = Some(key);
        }
        if let Some(similarity) = env_nonempty("COMPRE_FACE_MIN_SIMILARITY") {
            self.compreface.min_similarity = similarity.parse().map_err(|_| {
                anyhow!("COMPRE_FACE_MIN_SIMILARITY must be a number between 0 and 1")
            })?;
        }
        if let Some(path) = env_nonempty("KNOWN_PLATES_PATH") {
            self.known_plates_path = PathBuf::from(path);
        }
        if let Some(cooldown) = env_nonempty("NOTIFY_COOLDOWN_SECS") {
            let seconds: u64 = cooldown.parse().map_err(|_| {
                anyhow!("NOTIFY_COOLDOWN_SECS must be an integer number of seconds")
            })?;
            self.cooldown = Duration::from_secs(seconds);
        }
        if let Some(timeout) = env_nonempty("HTTP_TIMEOUT_SECS") {
            let seconds: u64 = timeout.parse().map_err(|_| {
                anyhow!("HTTP_TIMEOUT_SECS must be an integer number of seconds")
            })?;
            self.http_timeout = Duration::from_secs(seconds);
        }
        if let Some(topic) = env_nonempty("NOTIFY_MQTT_TOPIC") {
            self.notify_topic = Some(topic);
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.mqtt.topic.trim().is_empty() {
            return Err(anyhow!("MQTT topic must not be empty"));
        }
        if self.cooldown.is_zero() {
            return Err(anyhow!("notification cooldown must be greater than zero"));
        }
        if self.http_timeout.is_zero() {
            return Err(anyhow!("HTTP timeout must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.compreface.min_similarity) {
            return Err(anyhow!(
                "CompreFace min similarity must be within 0..=1, got {}",
                self.compreface.min_similarity
            ));
        }
        if self
            .compreface
            .api_key
            .as_deref()
            .is_some_and(|key| key.trim().is_empty())
        {
            self.compreface.api_key = None;
        }
        if self
            .notify_topic
            .as_deref()
            .is_some_and(|topic| topic.trim().is_empty())
        {
            self.notify_topic = None;
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<NotifierConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_deployment() {
        let cfg = NotifierConfig::default();
        assert_eq!(cfg.mqtt.host, "localhost");
        assert_eq!(cfg.mqtt.port, 1883);
        assert_eq!(cfg.mqtt.topic, "frigate/events");
        assert_eq!(cfg.snapshot_base, "http://frigate:5000");
        assert_eq!(cfg.compreface.host, "http://compreface:8000");
        assert!(cfg.compreface.api_key.is_none());
        assert_eq!(cfg.cooldown, Duration::from_secs(3600));
        assert_eq!(cfg.http_timeout, Duration::from_secs(10));
        assert!(cfg.notify_topic.is_none());
    }

    #[test]
    fn validate_rejects_out_of_range_similarity() {
        let mut cfg = NotifierConfig::default();
        cfg.compreface.min_similarity = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_clears_blank_api_key() {
        let mut cfg = NotifierConfig::default();
        cfg.compreface.api_key = Some("  ".to_string());
        cfg.validate().unwrap();
        assert!(cfg.compreface.api_key.is_none());
    }
}
