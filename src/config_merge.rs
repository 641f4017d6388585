//! Frigate `config.yml` generation.
//!
//! The NVR reads a single YAML file, but it is easier to maintain one base
//! document (`general.yml`) plus one fragment per camera (`cameras/*.yml`).
//! Fragments are spliced in as text under a top-level `cameras:` key rather
//! than parsed individually, so anchors defined in the base document can be
//! referenced from camera fragments.

use anyhow::{anyhow, Context, Result};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

pub const GENERAL_FILE: &str = "general.yml";
pub const CAMERAS_DIR: &str = "cameras";
pub const OUTPUT_FILE: &str = "config.yml";
pub const CAMERAS_KEY: &str = "cameras";

const FRAGMENT_INDENT: &str = "  ";

/// Concatenate `base` and the camera `fragments` into one YAML document.
///
/// Each fragment is trimmed of trailing whitespace and every non-blank line
/// is indented two spaces under `cameras:`.
pub fn merge_documents<S: AsRef<str>>(base: &str, fragments: &[S]) -> String {
    let mut combined = String::with_capacity(base.len() + 16);
    combined.push_str(base.trim_end());
    combined.push_str("\n\n");
    combined.push_str(CAMERAS_KEY);
    combined.push_str(":\n");

    for fragment in fragments {
        let indented: Vec<String> = fragment
            .as_ref()
            .trim_end()
            .lines()
            .map(|line| {
                if line.trim().is_empty() {
                    line.to_string()
                } else {
                    format!("{}{}", FRAGMENT_INDENT, line)
                }
            })
            .collect();
        combined.push_str(&indented.join("\n"));
        combined.push('\n');
    }
    combined
}

/// Parse a merged document, resolving `<<` merge keys.
///
/// An empty document becomes an empty mapping.
pub fn render_config(combined: &str) -> Result<Value> {
    if combined.trim().is_empty() {
        return Ok(Value::Mapping(Mapping::new()));
    }
    let mut value: Value = serde_yaml::from_str(combined).context("parse merged YAML")?;
    if value.is_null() {
        return Ok(Value::Mapping(Mapping::new()));
    }
    value.apply_merge().context("apply YAML merge keys")?;
    Ok(value)
}

/// Camera fragment files under `cameras_dir`, sorted by path.
pub fn camera_fragment_paths(cameras_dir: &Path) -> Result<Vec<PathBuf>> {
    if !cameras_dir.is_dir() {
        log::warn!("No camera directory at {}", cameras_dir.display());
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(cameras_dir)
        .with_context(|| format!("list camera fragments in {}", cameras_dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "yml") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Build `output` from `config_dir/general.yml` and `config_dir/cameras/*.yml`.
///
/// Returns the number of camera fragments merged.
pub fn generate(config_dir: &Path, output: &Path) -> Result<usize> {
    let general_path = config_dir.join(GENERAL_FILE);
    if !general_path.is_file() {
        return Err(anyhow!("base config not found: {}", general_path.display()));
    }
    let base = std::fs::read_to_string(&general_path)
        .with_context(|| format!("read {}", general_path.display()))?;

    let fragment_paths = camera_fragment_paths(&config_dir.join(CAMERAS_DIR))?;
    let fragments = fragment_paths
        .iter()
        .map(|path| {
            log::debug!("Merging camera fragment {}", path.display());
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let config = render_config(&merge_documents(&base, &fragments))?;
    let rendered = serde_yaml::to_string(&config).context("serialize merged config")?;
    std::fs::write(output, rendered).with_context(|| format!("write {}", output.display()))?;
    Ok(fragments.len())
}
