//! Blocking MQTT stream client.
//!
//! `MqttStream` owns the rumqttc connection and drives an `EventHandler`
//! synchronously: `on_connect` after every CONNACK (subscriptions do not
//! survive a clean-start reconnect), `on_message` once per inbound publish.
//! Messages are handled strictly one at a time on the calling thread.

use anyhow::{anyhow, Result};
use rumqttc::v5::{mqttbytes::QoS, Client, Connection, Event, Incoming, MqttOptions};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::tls::{MqttEndpoint, TlsMaterials};

const REQUEST_CHANNEL_CAPACITY: usize = 10;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Subscription surface handed to `EventHandler::on_connect`.
pub trait StreamSession {
    fn subscribe(&mut self, topic: &str) -> Result<()>;
}

/// Callbacks invoked by the stream client.
pub trait EventHandler {
    /// Called after each successful (re)connection.
    fn on_connect(&mut self, session: &mut dyn StreamSession) -> Result<()>;

    /// Called once per inbound message. Must not fail the stream.
    fn on_message(&mut self, topic: &str, payload: &[u8]);
}

/// Connection parameters for `MqttStream::connect`.
#[derive(Clone, Debug)]
pub struct StreamOptions {
    pub endpoint: MqttEndpoint,
    pub tls: TlsMaterials,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive: Duration,
}

impl StreamOptions {
    pub fn new(endpoint: MqttEndpoint, client_id: impl Into<String>) -> Self {
        Self {
            endpoint,
            tls: TlsMaterials::default(),
            client_id: client_id.into(),
            username: None,
            password: None,
            keep_alive: Duration::from_secs(60),
        }
    }
}

pub struct MqttStream {
    client: Client,
    connection: Connection,
}

struct ClientSession<'a> {
    client: &'a Client,
}

impl StreamSession for ClientSession<'_> {
    fn subscribe(&mut self, topic: &str) -> Result<()> {
        self.client
            .try_subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| anyhow!("subscribe to {}: {}", topic, e))?;
        log::info!("Subscribed to {}", topic);
        Ok(())
    }
}

impl MqttStream {
    /// Configure the MQTT client. The network connection is established
    /// lazily by `run`.
    pub fn connect(opts: &StreamOptions) -> Result<Self> {
        let mut options = MqttOptions::new(&opts.client_id, &opts.endpoint.host, opts.endpoint.port);
        options.set_keep_alive(opts.keep_alive);
        options.set_clean_start(true);
        if let Some(user) = opts.username.as_deref() {
            options.set_credentials(user, opts.password.as_deref().unwrap_or_default());
        }
        options.set_transport(opts.endpoint.transport(&opts.tls)?);

        let (client, connection) = Client::new(options, REQUEST_CHANNEL_CAPACITY);
        log::info!(
            "MQTT client configured for {} (auth: {})",
            opts.endpoint,
            opts.username.is_some()
        );
        Ok(Self { client, connection })
    }

    /// Handle to the underlying client, for publishing and disconnecting.
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    /// Drive `handler` until `shutdown` is set.
    ///
    /// Connection errors are logged and retried after a fixed delay; rumqttc
    /// reconnects on the next poll of the event loop.
    pub fn run<H: EventHandler>(mut self, handler: &mut H, shutdown: &AtomicBool) -> Result<()> {
        for event in self.connection.iter() {
            if shutdown.load(Ordering::SeqCst) {
                log::info!("Shutdown requested, leaving MQTT loop");
                break;
            }
            match event {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    log::info!("Connected to MQTT broker");
                    let mut session = ClientSession {
                        client: &self.client,
                    };
                    if let Err(e) = handler.on_connect(&mut session) {
                        log::error!("on_connect failed: {}", e);
                    }
                }
                Ok(Event::Incoming(Incoming::Publish(publish))) => {
                    let topic = match std::str::from_utf8(&publish.topic) {
                        Ok(topic) => topic,
                        Err(e) => {
                            log::warn!("Skipping publish with invalid topic: {}", e);
                            continue;
                        }
                    };
                    handler.on_message(topic, &publish.payload);
                }
                Ok(_) => {}
                Err(e) => {
                    if shutdown.load(Ordering::SeqCst) {
                        break;
                    }
                    log::error!(
                        "MQTT connection error: {}. Reconnecting in {}s...",
                        e,
                        RECONNECT_DELAY.as_secs()
                    );
                    std::thread::sleep(RECONNECT_DELAY);
                }
            }
        }
        Ok(())
    }
}
