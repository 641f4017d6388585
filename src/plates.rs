//! Known-plate registry.
//!
//! Loaded once at startup from a flat JSON object whose keys are plate
//! strings; values are free-form metadata (owner, vehicle, notes) and are
//! not interpreted. Read-only after load.

use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct KnownPlates {
    plates: HashSet<String>,
}

impl KnownPlates {
    pub fn new<I, S>(plates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            plates: plates.into_iter().map(Into::into).collect(),
        }
    }

    /// Load the registry from `path`. A missing file yields an empty registry.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!(
                    "Known-plate file {} not found, no plates will match",
                    path.display()
                );
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read known plates {}", path.display()))
            }
        };
        let registry = Self::from_json(&raw)
            .with_context(|| format!("invalid known plates file {}", path.display()))?;
        log::info!("Loaded {} known plates from {}", registry.len(), path.display());
        Ok(registry)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let map = value
            .as_object()
            .ok_or_else(|| anyhow!("expected a JSON object keyed by plate"))?;
        Ok(Self::new(map.keys().cloned()))
    }

    pub fn contains(&self, plate: &str) -> bool {
        self.plates.contains(plate)
    }

    pub fn len(&self) -> usize {
        self.plates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plates.is_empty()
    }
}
