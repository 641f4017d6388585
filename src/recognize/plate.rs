//! Placeholder plate recognizer.
//!
//! No plate-reading service is wired in yet: the candidate plate is taken
//! from the snapshot file name (everything before the first `.` of the last
//! path segment) and accepted only if it is in the known-plate registry.

use anyhow::Result;

use super::Recognizer;
use crate::plates::KnownPlates;

pub struct KnownPlateRecognizer {
    plates: KnownPlates,
}

impl KnownPlateRecognizer {
    pub fn new(plates: KnownPlates) -> Self {
        Self { plates }
    }
}

/// Derive the candidate plate text from a snapshot URL.
pub fn candidate_from_url(snapshot_url: &str) -> Option<&str> {
    let path = snapshot_url
        .split(['?', '#'])
        .next()
        .unwrap_or(snapshot_url);
    let file_name = path.rsplit('/').next()?;
    let candidate = file_name.split('.').next()?;
    if candidate.is_empty() {
        None
    } else {
        Some(candidate)
    }
}

impl Recognizer for KnownPlateRecognizer {
    fn recognize(&self, snapshot_url: &str) -> Result<Option<String>> {
        let Some(candidate) = candidate_from_url(snapshot_url) else {
            return Ok(None);
        };
        if self.plates.contains(candidate) {
            Ok(Some(candidate.to_string()))
        } else {
            log::debug!("Plate candidate '{}' is not a known plate", candidate);
            Ok(None)
        }
    }
}
