//! Verification key retrieval and decoding
//!
//! The auth service publishes its Ed25519 public key as
//! `{"publicKey": "<standard base64 of the 32 raw key bytes>"}`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use ed25519_dalek::{PUBLIC_KEY_LENGTH, VerifyingKey};
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};

use super::error::KeyTrustError;

/// Wire format of `GET /jwt-public-key`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyResponse {
    pub public_key: String,
}

/// A decoded, validated Ed25519 public key ready for token verification
#[derive(Clone)]
pub struct VerificationKey {
    raw: [u8; PUBLIC_KEY_LENGTH],
    decoding: DecodingKey,
}

impl VerificationKey {
    /// Rejects byte strings that are not a valid curve point.
    pub fn from_bytes(raw: [u8; PUBLIC_KEY_LENGTH]) -> Result<Self, KeyTrustError> {
        VerifyingKey::from_bytes(&raw)
            .map_err(|e| KeyTrustError::Malformed(format!("not an Ed25519 public key: {e}")))?;
        Ok(Self {
            raw,
            decoding: DecodingKey::from_ed_der(&raw),
        })
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.raw
    }

    /// Short hex prefix for logs
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.raw[..8])
    }
}

impl PartialEq for VerificationKey {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationKey")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Decode a fetched key blob. Any deviation from the wire format is `Malformed`.
pub fn decode_key_blob(blob: &[u8]) -> Result<VerificationKey, KeyTrustError> {
    let response: PublicKeyResponse = serde_json::from_slice(blob)
        .map_err(|e| KeyTrustError::Malformed(format!("invalid JSON: {e}")))?;

    let bytes = STANDARD
        .decode(response.public_key.trim())
        .map_err(|e| KeyTrustError::Malformed(format!("invalid base64: {e}")))?;

    let raw: [u8; PUBLIC_KEY_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
        KeyTrustError::Malformed(format!(
            "expected {PUBLIC_KEY_LENGTH} key bytes, got {}",
            bytes.len()
        ))
    })?;

    VerificationKey::from_bytes(raw)
}

/// Where the payments process gets the auth service's public key from
#[async_trait]
pub trait KeySource: Send + Sync {
    /// Human-readable origin for logs
    fn describe(&self) -> String;

    /// Fetch the raw key blob (undecoded)
    async fn fetch(&self) -> Result<Vec<u8>, KeyTrustError>;
}

/// Fetches the key blob over HTTP from the auth service's internal listener
pub struct HttpKeySource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpKeySource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, KeyTrustError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| KeyTrustError::Fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl KeySource for HttpKeySource {
    fn describe(&self) -> String {
        self.endpoint.clone()
    }

    async fn fetch(&self) -> Result<Vec<u8>, KeyTrustError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| KeyTrustError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeyTrustError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| KeyTrustError::Fetch(e.to_string()))?;
        Ok(body.to_vec())
    }
}
