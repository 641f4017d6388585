//! Transport layer for the MQTT side of the notifier.
//!
//! Endpoint/TLS selection, the blocking stream client that drives an
//! `EventHandler`, and Frigate event payload parsing.

pub mod frigate;
pub mod stream;
mod tls;

pub use frigate::{parse_detection_event, DetectionEvent};
pub use stream::{EventHandler, MqttStream, StreamOptions, StreamSession};
pub use tls::{MqttEndpoint, TlsMaterials};
