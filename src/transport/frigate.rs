//! Frigate MQTT event parsing.
//!
//! Frigate publishes tracked-object lifecycle messages on `frigate/events`:
//! `{ "before": {...}, "after": {...}, "type": "new"|"update"|"end" }`.
//! Only the fields the notifier acts on are decoded; everything else is ignored.

use anyhow::{anyhow, Result};
use serde::Deserialize;

/// Event type Frigate emits the first time an object is tracked.
pub const EVENT_TYPE_NEW: &str = "new";

/// Top-level Frigate event message.
#[derive(Debug, Deserialize)]
pub struct FrigateEventWrapper {
    /// Event type: "new", "update", or "end"
    #[serde(rename = "type")]
    pub event_type: Option<String>,

    /// Current state of the tracked object. Absent or null is treated as empty.
    #[serde(default)]
    pub after: Option<FrigateEventData>,
}

/// The "after" section of a Frigate event.
#[derive(Debug, Default, Deserialize)]
pub struct FrigateEventData {
    /// Frigate event id, e.g. "1700000000.123456-abc123"
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub camera: Option<String>,

    /// Object label (person, car, dog, ...)
    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub has_snapshot: bool,

    #[serde(default)]
    pub snapshot: Option<FrigateSnapshot>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FrigateSnapshot {
    /// Server-relative path, e.g. "/media/frigate/clips/front-123.jpg"
    #[serde(default)]
    pub path: Option<String>,
}

/// A decoded detection event, flattened from the wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionEvent {
    pub event_type: Option<String>,
    pub event_id: Option<String>,
    pub camera: Option<String>,
    pub label: Option<String>,
    pub has_snapshot: bool,
    pub snapshot_path: Option<String>,
}

impl DetectionEvent {
    /// True for the first message Frigate sends about an object.
    pub fn is_new(&self) -> bool {
        self.event_type.as_deref() == Some(EVENT_TYPE_NEW)
    }

    /// Build the fetchable snapshot URL by prefixing `base` to the relative path.
    pub fn snapshot_url(&self, base: &str) -> Option<String> {
        self.snapshot_path
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(|path| join_snapshot_url(base, path))
    }
}

/// Parse a Frigate event JSON payload.
///
/// Only malformed JSON is an error; filtering on type, snapshot and label is
/// left to the caller so that each drop can be classified.
pub fn parse_detection_event(payload: &[u8]) -> Result<DetectionEvent> {
    let wrapper: FrigateEventWrapper =
        serde_json::from_slice(payload).map_err(|e| anyhow!("parse error: {}", e))?;
    let after = wrapper.after.unwrap_or_default();

    Ok(DetectionEvent {
        event_type: wrapper.event_type,
        event_id: after.id,
        camera: after.camera,
        label: after.label,
        has_snapshot: after.has_snapshot,
        snapshot_path: after.snapshot.and_then(|s| s.path),
    })
}

fn join_snapshot_url(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}
