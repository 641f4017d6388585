//! MQTT endpoint and TLS transport selection.
//!
//! Follows the Home Assistant MQTT integration conventions:
//! - CA verification: custom CA path or webpki roots
//! - Client certificates: mutual TLS support
//! - Insecure mode: not supported

use anyhow::{anyhow, Context, Result};
use rumqttc::Transport;
use std::path::PathBuf;

/// TLS certificate materials for MQTT connections.
#[derive(Clone, Debug, Default)]
pub struct TlsMaterials {
    /// PEM-encoded CA certificate bytes.
    /// When None, uses webpki root certificates.
    pub ca: Option<Vec<u8>>,

    /// Client certificate and key for mutual TLS, provided together.
    pub client_auth: Option<(Vec<u8>, Vec<u8>)>,
}

impl TlsMaterials {
    /// Load TLS materials from file paths.
    ///
    /// The CA is optional; client cert and key must be provided together.
    pub fn load(
        ca_path: Option<&PathBuf>,
        client_cert_path: Option<&PathBuf>,
        client_key_path: Option<&PathBuf>,
    ) -> Result<Self> {
        let ca = match ca_path {
            Some(path) => Some(
                std::fs::read(path)
                    .with_context(|| format!("failed to read MQTT TLS CA '{}'", path.display()))?,
            ),
            None => None,
        };

        let client_auth = match (client_cert_path, client_key_path) {
            (Some(cert_path), Some(key_path)) => {
                let cert = std::fs::read(cert_path).with_context(|| {
                    format!(
                        "failed to read MQTT TLS client cert '{}'",
                        cert_path.display()
                    )
                })?;
                let key = std::fs::read(key_path).with_context(|| {
                    format!("failed to read MQTT TLS client key '{}'", key_path.display())
                })?;
                Some((cert, key))
            }
            (None, None) => None,
            (Some(_), None) => {
                return Err(anyhow!("MQTT TLS client certificate provided without key"))
            }
            (None, Some(_)) => {
                return Err(anyhow!("MQTT TLS client key provided without certificate"))
            }
        };

        Ok(Self { ca, client_auth })
    }

    pub fn is_configured(&self) -> bool {
        self.ca.is_some() || self.client_auth.is_some()
    }
}

/// Broker address plus whether to speak TLS.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MqttEndpoint {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
}

impl MqttEndpoint {
    /// Build an endpoint from a configured host and port.
    ///
    /// The host may carry a scheme (`mqtt://`, `tcp://`, `mqtts://`, `ssl://`);
    /// a TLS scheme enables TLS regardless of `tls_override`.
    pub fn from_host_port(host: &str, port: u16, tls_override: bool) -> Result<Self> {
        let mut use_tls = tls_override;
        let mut host = host.trim();

        if let Some((scheme, rest)) = host.split_once("://") {
            match scheme {
                "mqtt" | "tcp" => {}
                "mqtts" | "ssl" => use_tls = true,
                other => return Err(anyhow!("unsupported MQTT scheme: {}", other)),
            }
            host = rest;
        }

        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if host.is_empty() {
            return Err(anyhow!("MQTT host must not be empty"));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            use_tls,
        })
    }

    /// Build a rumqttc transport for this endpoint.
    ///
    /// Errors if TLS materials are provided while TLS is disabled, or if a
    /// client certificate is given without a CA to pin.
    pub fn transport(&self, materials: &TlsMaterials) -> Result<Transport> {
        if !self.use_tls {
            if materials.is_configured() {
                return Err(anyhow!(
                    "MQTT TLS materials provided but TLS is disabled.\n\
                     Use --mqtt-use-tls or an mqtts:// host to enable TLS."
                ));
            }
            return Ok(Transport::tcp());
        }

        if !materials.is_configured() {
            return Ok(Transport::tls_with_default_config());
        }

        let ca = materials.ca.clone().ok_or_else(|| {
            anyhow!(
                "MQTT TLS CA certificate is required when providing client certificates.\n\
                 Specify --mqtt-tls-ca-path or remove client cert configuration."
            )
        })?;
        Ok(Transport::tls(ca, materials.client_auth.clone(), None))
    }
}

impl std::fmt::Display for MqttEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scheme = if self.use_tls { "mqtts" } else { "mqtt" };
        if self.host.contains(':') {
            write!(f, "{}://[{}]:{}", scheme, self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", scheme, self.host, self.port)
        }
    }
}
