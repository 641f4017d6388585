//! Frigate event notifier
//!
//! Subscribes to Frigate NVR detection events over MQTT and turns the
//! interesting ones into user notifications:
//!
//! - `person` detections are matched against a CompreFace face-recognition
//!   service; unrecognised people still produce one alert per event.
//! - `car` detections are matched against a registry of known plates;
//!   unknown cars are ignored.
//! - Each identity is notified at most once per cooldown window.
//!
//! # Module Structure
//!
//! - `transport`: MQTT endpoint/TLS setup, the stream client and Frigate payload parsing
//! - `recognize`: face and plate recognition adapters
//! - `plates`: known-plate registry
//! - `throttle`: per-identity notification cooldown
//! - `notify`: notification sinks (stdout, MQTT)
//! - `dispatch`: per-message decision flow tying the above together
//! - `config`: runtime configuration (file + environment)
//! - `config_merge`: Frigate `config.yml` generation from per-camera fragments

pub mod config;
pub mod config_merge;
pub mod dispatch;
pub mod notify;
pub mod plates;
pub mod recognize;
pub mod throttle;
pub mod transport;

pub use config::NotifierConfig;
pub use dispatch::{Dispatcher, DropReason, Outcome};
pub use notify::{Category, MqttNotifier, Notification, Notifier, StdoutNotifier};
pub use plates::KnownPlates;
pub use recognize::{CompreFaceRecognizer, KnownPlateRecognizer, Recognizer};
pub use throttle::{NotificationThrottle, DEFAULT_COOLDOWN};
pub use transport::{EventHandler, MqttStream, StreamSession};
