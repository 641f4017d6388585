//! Per-message decision flow.
//!
//! For each Frigate event:
//! 1. decode the payload (malformed: warn and drop)
//! 2. keep only `type == "new"` events that have a snapshot
//! 3. `person`: face lookup, falling back to a per-event placeholder id
//!    `car`: plate lookup, dropped when no known plate matches
//!    anything else: dropped
//! 4. notify when the throttle allows it

use anyhow::Result;
use chrono::{DateTime, Local};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::notify::{Category, Notification, Notifier};
use crate::recognize::Recognizer;
use crate::throttle::NotificationThrottle;
use crate::transport::{parse_detection_event, DetectionEvent, EventHandler, StreamSession};

const LABEL_PERSON: &str = "person";
const LABEL_CAR: &str = "car";
const UNKNOWN_PERSON_PREFIX: &str = "unknown_";
const UNKNOWN_CAMERA: &str = "unknown";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// `type` was not "new"
    NotNew,
    NoSnapshot,
    UnhandledLabel(Option<String>),
    /// Car with no recognised known plate
    UnknownPlate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Notified(Notification),
    /// Identifier still inside its cooldown window
    Throttled(String),
    Dropped(DropReason),
}

pub struct Dispatcher<F, P, N> {
    topic: String,
    snapshot_base: String,
    faces: F,
    plates: P,
    notifier: N,
    throttle: NotificationThrottle,
}

impl<F, P, N> Dispatcher<F, P, N>
where
    F: Recognizer,
    P: Recognizer,
    N: Notifier,
{
    pub fn new(
        topic: impl Into<String>,
        snapshot_base: impl Into<String>,
        faces: F,
        plates: P,
        notifier: N,
    ) -> Self {
        Self {
            topic: topic.into(),
            snapshot_base: snapshot_base.into(),
            faces,
            plates,
            notifier,
            throttle: NotificationThrottle::default(),
        }
    }

    pub fn with_throttle(mut self, throttle: NotificationThrottle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn throttle(&self) -> &NotificationThrottle {
        &self.throttle
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Run one payload through the decision flow at time `now`.
    ///
    /// Only an undecodable payload is an error; every other way an event can
    /// end is reported through `Outcome`.
    pub fn handle_payload(&mut self, payload: &[u8], now: SystemTime) -> Result<Outcome> {
        let event = parse_detection_event(payload)?;
        Ok(self.handle_event(&event, now))
    }

    pub fn handle_event(&mut self, event: &DetectionEvent, now: SystemTime) -> Outcome {
        if !event.is_new() {
            return Outcome::Dropped(DropReason::NotNew);
        }
        if !event.has_snapshot {
            return Outcome::Dropped(DropReason::NoSnapshot);
        }

        let snapshot_url = event.snapshot_url(&self.snapshot_base);
        let (category, identifier) = match event.label.as_deref() {
            Some(LABEL_PERSON) => {
                let name = snapshot_url
                    .as_deref()
                    .and_then(|url| resolve(&self.faces, url, "face"));
                let identifier = name.unwrap_or_else(|| unknown_person_id(event, now));
                (Category::Person, identifier)
            }
            Some(LABEL_CAR) => {
                let plate = snapshot_url
                    .as_deref()
                    .and_then(|url| resolve(&self.plates, url, "plate"));
                match plate {
                    Some(plate) => (Category::Plate, plate),
                    None => return Outcome::Dropped(DropReason::UnknownPlate),
                }
            }
            other => {
                return Outcome::Dropped(DropReason::UnhandledLabel(other.map(str::to_string)))
            }
        };

        if !self.throttle.should_notify(&identifier, now) {
            return Outcome::Throttled(identifier);
        }

        let notification = Notification {
            camera: event
                .camera
                .clone()
                .unwrap_or_else(|| UNKNOWN_CAMERA.to_string()),
            category,
            identifier,
            time: DateTime::<Local>::from(now),
        };
        if let Err(e) = self.notifier.notify(&notification) {
            log::warn!("Failed to deliver notification: {}", e);
        }
        Outcome::Notified(notification)
    }
}

impl<F, P, N> EventHandler for Dispatcher<F, P, N>
where
    F: Recognizer,
    P: Recognizer,
    N: Notifier,
{
    fn on_connect(&mut self, session: &mut dyn StreamSession) -> Result<()> {
        session.subscribe(&self.topic)
    }

    fn on_message(&mut self, topic: &str, payload: &[u8]) {
        match self.handle_payload(payload, SystemTime::now()) {
            Ok(Outcome::Notified(n)) => log::info!(
                "Notified {} '{}' on camera {}",
                n.category,
                n.identifier,
                n.camera
            ),
            Ok(Outcome::Throttled(identifier)) => {
                log::debug!("'{}' still in cooldown, not notifying", identifier)
            }
            Ok(Outcome::Dropped(reason)) => log::debug!("Dropped event: {:?}", reason),
            Err(e) => log::warn!("Could not decode message on {}: {}", topic, e),
        }
    }
}

/// Run a recognizer, degrading any failure to "no match".
fn resolve<R: Recognizer>(recognizer: &R, url: &str, kind: &str) -> Option<String> {
    match recognizer.recognize(url) {
        Ok(found) => found,
        Err(e) => {
            log::warn!("{} recognition failed for {}: {:#}", kind, url, e);
            None
        }
    }
}

fn unknown_person_id(event: &DetectionEvent, now: SystemTime) -> String {
    match event.event_id.as_deref() {
        Some(id) if !id.is_empty() => format!("{}{}", UNKNOWN_PERSON_PREFIX, id),
        _ => {
            let millis = now
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0);
            format!(
                "{}{}_{}",
                UNKNOWN_PERSON_PREFIX,
                event.camera.as_deref().unwrap_or(UNKNOWN_CAMERA),
                millis
            )
        }
    }
}
