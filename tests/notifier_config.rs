use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use frigate_notifier::config::{NotifierConfig, CONFIG_PATH_ENV};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        CONFIG_PATH_ENV,
        "MQTT_HOST",
        "MQTT_PORT",
        "FRIGATE_MQTT_TOPIC",
        "MQTT_CLIENT_ID",
        "FRIGATE_SNAPSHOT_BASE",
        "COMPRE_FACE_HOST",
        "COMPRE_FACE_API_KEY",
        "COMPRE_FACE_MIN_SIMILARITY",
        "KNOWN_PLATES_PATH",
        "NOTIFY_COOLDOWN_SECS",
        "HTTP_TIMEOUT_SECS",
        "NOTIFY_MQTT_TOPIC",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = NotifierConfig::load().expect("load config");
    assert_eq!(cfg.mqtt.host, "localhost");
    assert_eq!(cfg.mqtt.port, 1883);
    assert_eq!(cfg.compreface.host, "http://compreface:8000");
    assert!(cfg.compreface.api_key.is_none());
    assert_eq!(cfg.cooldown, Duration::from_secs(3600));

    clear_env();
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "mqtt": {
            "host": "mosquitto",
            "port": 1884,
            "topic": "nvr/events"
        },
        "frigate": {"snapshot_base": "http://nvr.lan:5000"},
        "compreface": {
            "host": "http://faces.lan:8000",
            "api_key": "from-file",
            "min_similarity": 0.8
        },
        "known_plates_path": "/etc/frigate/known_plates.json",
        "cooldown_secs": 1800,
        "notify_topic": "home/alerts"
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var(CONFIG_PATH_ENV, file.path());
    std::env::set_var("MQTT_PORT", "8883");
    std::env::set_var("COMPRE_FACE_API_KEY", "from-env");
    std::env::set_var("HTTP_TIMEOUT_SECS", "3");

    let cfg = NotifierConfig::load().expect("load config");

    assert_eq!(cfg.mqtt.host, "mosquitto");
    assert_eq!(cfg.mqtt.port, 8883);
    assert_eq!(cfg.mqtt.topic, "nvr/events");
    assert_eq!(cfg.mqtt.client_id, "frigate_notifier");
    assert_eq!(cfg.snapshot_base, "http://nvr.lan:5000");
    assert_eq!(cfg.compreface.host, "http://faces.lan:8000");
    assert_eq!(cfg.compreface.api_key.as_deref(), Some("from-env"));
    assert!((cfg.compreface.min_similarity - 0.8).abs() < f64::EPSILON);
    assert_eq!(
        cfg.known_plates_path,
        std::path::PathBuf::from("/etc/frigate/known_plates.json")
    );
    assert_eq!(cfg.cooldown, Duration::from_secs(1800));
    assert_eq!(cfg.http_timeout, Duration::from_secs(3));
    assert_eq!(cfg.notify_topic.as_deref(), Some("home/alerts"));

    clear_env();
}

#[test]
fn rejects_invalid_env_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("MQTT_PORT", "not-a-port");
    assert!(NotifierConfig::load().is_err());
    clear_env();

    std::env::set_var("NOTIFY_COOLDOWN_SECS", "0");
    let err = NotifierConfig::load().unwrap_err();
    assert!(err.to_string().contains("cooldown"));
    clear_env();
}

#[test]
fn rejects_missing_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var(CONFIG_PATH_ENV, "/nonexistent/frigate_notifier.json");
    let err = NotifierConfig::load().unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));

    clear_env();
}
