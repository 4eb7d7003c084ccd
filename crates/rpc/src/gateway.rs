//! Decryption gateway client
//!
//! Resolves a ciphertext handle to its cleartext through the relayer's public
//! decryption endpoint. A handle whose decryption has not been produced yet is
//! reported as [`GatewayError::NotReady`], distinct from real failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use signalpool_core::{CiphertextHandle, U256};
use thiserror::Error;
use tracing::debug;

use crate::wire::parse_quantity;

pub const PUBLIC_DECRYPT_PATH: &str = "/v1/public-decrypt";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Decryption not ready")]
    NotReady,
    #[error("Gateway HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Gateway transport error: {0}")]
    Transport(String),
    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait DecryptionGateway: Send + Sync {
    async fn public_decrypt(&self, handle: &CiphertextHandle) -> Result<U256, GatewayError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PublicDecryptRequest {
    ciphertext_handles: Vec<String>,
    extra_data: String,
}

#[derive(Debug, Deserialize)]
struct PublicDecryptResponse {
    response: Vec<DecryptedEntry>,
}

#[derive(Debug, Deserialize)]
struct DecryptedEntry {
    decrypted_value: String,
}

/// HTTP client for the relayer gateway.
pub struct HttpGateway {
    http: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl DecryptionGateway for HttpGateway {
    async fn public_decrypt(&self, handle: &CiphertextHandle) -> Result<U256, GatewayError> {
        let url = format!("{}{}", self.base_url, PUBLIC_DECRYPT_PATH);
        let request = PublicDecryptRequest {
            ciphertext_handles: vec![handle.to_string()],
            extra_data: "0x00".to_string(),
        };

        debug!(handle = %handle, "public decrypt");

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if status == StatusCode::NOT_FOUND || body.to_ascii_lowercase().contains("not found") {
            return Err(GatewayError::NotReady);
        }
        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PublicDecryptResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        let entry = parsed
            .response
            .first()
            .ok_or_else(|| GatewayError::InvalidResponse("empty response".to_string()))?;
        parse_quantity(&entry.decrypted_value)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn handle() -> CiphertextHandle {
        CiphertextHandle::repeat_byte(0x42)
    }

    async fn gateway(server: &MockServer) -> HttpGateway {
        HttpGateway::new(&format!("{}/", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_decrypt_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PUBLIC_DECRYPT_PATH))
            .and(body_json(json!({
                "ciphertextHandles": [handle().to_string()],
                "extraData": "0x00"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": [{ "decrypted_value": "0x1068" }]
            })))
            .mount(&server)
            .await;

        let value = gateway(&server).await.public_decrypt(&handle()).await.unwrap();
        assert_eq!(value, U256::from(4200u32));
    }

    #[tokio::test]
    async fn test_not_found_is_not_ready() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = gateway(&server).await.public_decrypt(&handle()).await.unwrap_err();
        assert_eq!(err, GatewayError::NotReady);
    }

    #[tokio::test]
    async fn test_not_found_message_is_not_ready() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("handle Not Found"))
            .mount(&server)
            .await;

        let err = gateway(&server).await.public_decrypt(&handle()).await.unwrap_err();
        assert_eq!(err, GatewayError::NotReady);
    }

    #[tokio::test]
    async fn test_server_error_is_distinct() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = gateway(&server).await.public_decrypt(&handle()).await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Http {
                status: 503,
                body: "overloaded".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_response_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": [] })))
            .mount(&server)
            .await;

        let err = gateway(&server).await.public_decrypt(&handle()).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }
}
