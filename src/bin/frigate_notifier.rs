//! frigate_notifier - Notify on recognised people and known cars seen by Frigate.
//!
//! 1. Subscribes to Frigate's MQTT event topic (default `frigate/events`)
//! 2. Looks up faces in CompreFace for `person` events
//! 3. Matches `car` events against the known-plate registry
//! 4. Emits at most one notification per identity per cooldown window
//!
//! Core settings come from `FRIGATE_NOTIFIER_CONFIG` and the environment
//! (see `NotifierConfig`); broker credentials and TLS are command-line options.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use frigate_notifier::transport::{MqttEndpoint, StreamOptions, TlsMaterials};
use frigate_notifier::{
    CompreFaceRecognizer, Dispatcher, KnownPlateRecognizer, KnownPlates, MqttNotifier, MqttStream,
    NotificationThrottle, Notifier, NotifierConfig, StdoutNotifier,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Notify on recognised faces and known plates from Frigate events"
)]
struct Args {
    /// MQTT username for authentication.
    #[arg(long, env = "MQTT_USERNAME")]
    mqtt_username: Option<String>,

    /// MQTT password for authentication.
    #[arg(long, env = "MQTT_PASSWORD")]
    mqtt_password: Option<String>,

    /// Enable TLS for MQTT (implied by an mqtts:// host).
    #[arg(long, env = "MQTT_USE_TLS")]
    mqtt_use_tls: bool,

    /// Path to a PEM-encoded CA certificate to trust for MQTT TLS.
    #[arg(long, env = "MQTT_TLS_CA_PATH")]
    mqtt_tls_ca_path: Option<PathBuf>,

    /// Path to a PEM-encoded client certificate for MQTT TLS.
    #[arg(long, env = "MQTT_TLS_CLIENT_CERT_PATH")]
    mqtt_tls_client_cert_path: Option<PathBuf>,

    /// Path to a PEM-encoded client private key for MQTT TLS.
    #[arg(long, env = "MQTT_TLS_CLIENT_KEY_PATH")]
    mqtt_tls_client_key_path: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let cfg = NotifierConfig::load()?;

    let endpoint = MqttEndpoint::from_host_port(&cfg.mqtt.host, cfg.mqtt.port, args.mqtt_use_tls)?;
    let tls = TlsMaterials::load(
        args.mqtt_tls_ca_path.as_ref(),
        args.mqtt_tls_client_cert_path.as_ref(),
        args.mqtt_tls_client_key_path.as_ref(),
    )?;

    log::info!("Frigate notifier starting");
    log::info!("  MQTT broker: {}", endpoint);
    log::info!("  Frigate topic: {}", cfg.mqtt.topic);
    log::info!("  Snapshot base: {}", cfg.snapshot_base);
    log::info!("  CompreFace: {}", cfg.compreface.host);
    log::info!("  Cooldown: {}s", cfg.cooldown.as_secs());
    log::info!(
        "  Notify topic: {}",
        cfg.notify_topic.as_deref().unwrap_or("none (stdout only)")
    );

    let plates = KnownPlates::load(&cfg.known_plates_path)?;
    let faces = CompreFaceRecognizer::new(
        cfg.compreface.host.clone(),
        cfg.compreface.api_key.clone(),
        cfg.http_timeout,
    )?
    .with_min_similarity(cfg.compreface.min_similarity);
    if !faces.has_api_key() {
        log::warn!("COMPRE_FACE_API_KEY not set: every person will be reported as unknown");
    }

    let mut opts = StreamOptions::new(endpoint, cfg.mqtt.client_id.clone());
    opts.tls = tls;
    opts.username = args.mqtt_username;
    opts.password = args.mqtt_password;
    let stream = MqttStream::connect(&opts)?;
    let client = stream.client();

    let notifier: Box<dyn Notifier> = match cfg.notify_topic.as_deref() {
        Some(topic) => Box::new(MqttNotifier::new(client.clone(), topic)),
        None => Box::new(StdoutNotifier),
    };
    let mut dispatcher = Dispatcher::new(
        cfg.mqtt.topic.clone(),
        cfg.snapshot_base.clone(),
        faces,
        KnownPlateRecognizer::new(plates),
        notifier,
    )
    .with_throttle(NotificationThrottle::new(cfg.cooldown));

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        let client = client.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::SeqCst);
            let _ = client.try_disconnect();
        })
        .context("install Ctrl-C handler")?;
    }

    stream.run(&mut dispatcher, &shutdown)?;
    log::info!("Frigate notifier stopped");
    Ok(())
}
