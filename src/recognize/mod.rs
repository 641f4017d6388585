//! Identity recognition adapters.
//!
//! A `Recognizer` maps a snapshot URL to an optional identity string:
//! - `Ok(Some(id))`: a known face or plate was found
//! - `Ok(None)`: the service answered but nothing matched
//! - `Err(_)`: the service was unreachable, misconfigured or answered garbage
//!
//! Callers decide how to degrade; the dispatcher logs errors and treats them
//! as "no match".

use anyhow::Result;

pub mod compreface;
pub mod plate;

pub use compreface::{CompreFaceRecognizer, RecognizeResponse};
pub use plate::KnownPlateRecognizer;

pub trait Recognizer {
    fn recognize(&self, snapshot_url: &str) -> Result<Option<String>>;
}

impl<R: Recognizer + ?Sized> Recognizer for Box<R> {
    fn recognize(&self, snapshot_url: &str) -> Result<Option<String>> {
        (**self).recognize(snapshot_url)
    }
}
