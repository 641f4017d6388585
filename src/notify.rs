//! Notification sinks.
//!
//! `StdoutNotifier` prints one human-readable line per alert. `MqttNotifier`
//! additionally publishes the alert as JSON so home-automation consumers can
//! pick it up.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local};
use rumqttc::v5::{mqttbytes::QoS, Client};
use serde::Serialize;
use std::io::Write;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Person,
    Plate,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Person => write!(f, "person"),
            Self::Plate => write!(f, "plate"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub camera: String,
    pub category: Category,
    pub identifier: String,
    pub time: DateTime<Local>,
}

impl Notification {
    /// One-line human-readable rendering.
    pub fn line(&self) -> String {
        format!(
            "[NOTIFY] {}: {} detected on camera '{}': {}",
            self.time.format("%Y-%m-%dT%H:%M:%S"),
            self.category,
            self.camera,
            self.identifier
        )
    }
}

pub trait Notifier {
    fn notify(&mut self, notification: &Notification) -> Result<()>;
}

/// Writes `Notification::line` to stdout.
#[derive(Debug, Default)]
pub struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn notify(&mut self, notification: &Notification) -> Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", notification.line())?;
        out.flush()?;
        Ok(())
    }
}

/// Prints to stdout and publishes the notification as JSON (QoS 1).
pub struct MqttNotifier {
    client: Client,
    topic: String,
}

impl MqttNotifier {
    pub fn new(client: Client, topic: impl Into<String>) -> Self {
        Self {
            client,
            topic: topic.into(),
        }
    }
}

impl Notifier for MqttNotifier {
    fn notify(&mut self, notification: &Notification) -> Result<()> {
        StdoutNotifier.notify(notification)?;
        let payload = serde_json::to_vec(notification)?;
        // Runs on the connection thread: a blocking publish could wait on itself.
        self.client
            .try_publish(self.topic.as_str(), QoS::AtLeastOnce, false, payload)
            .map_err(|e| anyhow!("publish notification to {}: {}", self.topic, e))?;
        Ok(())
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&mut self, notification: &Notification) -> Result<()> {
        (**self).notify(notification)
    }
}
