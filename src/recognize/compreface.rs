//! CompreFace face-recognition adapter.
//!
//! Fetches the Frigate snapshot, uploads it to
//! `{base}/api/v1/recognition/recognize` as multipart form data and picks the
//! top-ranked subject of the first face that has any candidates.

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::io::Read;
use std::time::Duration;

use super::Recognizer;

const RECOGNIZE_PATH: &str = "/api/v1/recognition/recognize";
const API_KEY_HEADER: &str = "x-api-key";
const SNAPSHOT_FIELD: &str = "file";
const SNAPSHOT_FILENAME: &str = "snapshot.jpg";
const MAX_SNAPSHOT_BYTES: u64 = 16 * 1024 * 1024;

/// Response body of the recognize endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct RecognizeResponse {
    #[serde(default)]
    pub result: Vec<FaceResult>,
}

/// One detected face.
#[derive(Debug, Default, Deserialize)]
pub struct FaceResult {
    /// Candidates ranked by similarity, best first.
    #[serde(default)]
    pub subjects: Vec<SubjectCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct SubjectCandidate {
    pub subject: String,
    #[serde(default)]
    pub similarity: f64,
}

impl RecognizeResponse {
    /// Top candidate of the first face with any candidates, if it clears
    /// `min_similarity`.
    pub fn top_subject(&self, min_similarity: f64) -> Option<&str> {
        let best = self
            .result
            .iter()
            .find_map(|face| face.subjects.first())?;
        if best.similarity < min_similarity {
            log::debug!(
                "Best face candidate '{}' below similarity floor ({:.2} < {:.2})",
                best.subject,
                best.similarity,
                min_similarity
            );
            return None;
        }
        Some(best.subject.as_str())
    }
}

pub struct CompreFaceRecognizer {
    base_url: String,
    api_key: Option<String>,
    min_similarity: f64,
    max_snapshot_bytes: u64,
    client: Client,
}

impl CompreFaceRecognizer {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build CompreFace HTTP client")?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            min_similarity: 0.0,
            max_snapshot_bytes: MAX_SNAPSHOT_BYTES,
            client,
        })
    }

    pub fn with_min_similarity(mut self, min_similarity: f64) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    /// Snapshots larger than this are rejected rather than uploaded.
    pub fn with_max_snapshot_bytes(mut self, max_snapshot_bytes: u64) -> Self {
        self.max_snapshot_bytes = max_snapshot_bytes;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn recognize_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), RECOGNIZE_PATH)
    }

    fn fetch_snapshot(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .with_context(|| format!("fetch snapshot from {}", url))?;
        let mut bytes = Vec::new();
        // One byte past the limit tells a full-size snapshot from an oversized one.
        response
            .take(self.max_snapshot_bytes + 1)
            .read_to_end(&mut bytes)
            .context("read snapshot body")?;
        if bytes.is_empty() {
            return Err(anyhow!("empty snapshot from {}", url));
        }
        if bytes.len() as u64 > self.max_snapshot_bytes {
            return Err(anyhow!(
                "snapshot from {} exceeds {} bytes",
                url,
                self.max_snapshot_bytes
            ));
        }
        Ok(bytes)
    }
}

impl Recognizer for CompreFaceRecognizer {
    fn recognize(&self, snapshot_url: &str) -> Result<Option<String>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("CompreFace API key not configured"))?;

        let image = self.fetch_snapshot(snapshot_url)?;
        let form = Form::new().part(
            SNAPSHOT_FIELD,
            Part::bytes(image)
                .file_name(SNAPSHOT_FILENAME)
                .mime_str("image/jpeg")?,
        );

        let endpoint = self.recognize_url();
        let response = self
            .client
            .post(&endpoint)
            .header(API_KEY_HEADER, api_key)
            .multipart(form)
            .send()
            .and_then(|resp| resp.error_for_status())
            .with_context(|| format!("CompreFace recognize request to {}", endpoint))?;

        let parsed: RecognizeResponse = response
            .json()
            .context("decode CompreFace recognize response")?;
        Ok(parsed
            .top_subject(self.min_similarity)
            .map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE_TWO_FACES: &str = r#"{
        "result": [
            {"box": {"probability": 0.99}, "subjects": []},
            {"box": {"probability": 0.98}, "subjects": [
                {"subject": "ana", "similarity": 0.97},
                {"subject": "brais", "similarity": 0.41}
            ]}
        ]
    }"#;

    #[test]
    fn top_subject_skips_faces_without_candidates() {
        let parsed: RecognizeResponse = serde_json::from_str(RESPONSE_TWO_FACES).unwrap();
        assert_eq!(parsed.top_subject(0.0), Some("ana"));
    }

    #[test]
    fn top_subject_respects_similarity_floor() {
        let parsed: RecognizeResponse = serde_json::from_str(RESPONSE_TWO_FACES).unwrap();
        assert_eq!(parsed.top_subject(0.98), None);
    }

    #[test]
    fn empty_result_has_no_subject() {
        let parsed: RecognizeResponse = serde_json::from_str(r#"{"result": []}"#).unwrap();
        assert_eq!(parsed.top_subject(0.0), None);
        let parsed: RecognizeResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.top_subject(0.0), None);
    }

    #[test]
    fn missing_api_key_fails_without_network() {
        let recognizer = CompreFaceRecognizer::new(
            "http://127.0.0.1:9",
            Some("   ".to_string()),
            Duration::from_millis(50),
        )
        .unwrap();
        assert!(!recognizer.has_api_key());
        let err = recognizer
            .recognize("http://127.0.0.1:9/snap.jpg")
            .unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn recognize_url_joins_base() {
        let recognizer =
            CompreFaceRecognizer::new("http://compreface:8000/", None, Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            recognizer.recognize_url(),
            "http://compreface:8000/api/v1/recognition/recognize"
        );
    }
}
