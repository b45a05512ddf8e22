//! Token signing keys and the token issuer

use std::fmt;

use anyhow::{Context, Result, anyhow, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;
use ed25519_dalek::pkcs8::EncodePrivateKey;
use ed25519_dalek::{KEYPAIR_LENGTH, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH, SigningKey};
use jsonwebtoken::{EncodingKey, Header, encode};
use rand::rngs::OsRng;

use crate::auth::verifier::{Claims, EXPECTED_ALGORITHM};

/// Ed25519 signing key plus its JWS encoding form
pub struct IssuerKeys {
    signing: SigningKey,
    encoding: EncodingKey,
}

impl IssuerKeys {
    /// Accepts standard base64 of either a 64-byte keypair (seed || public key)
    /// or a 32-byte seed. A keypair whose public half does not match its seed
    /// is rejected.
    pub fn from_base64_secret(secret: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(secret.trim())
            .context("JWT secret is not valid base64")?;

        let signing = match bytes.len() {
            KEYPAIR_LENGTH => {
                let mut keypair = [0u8; KEYPAIR_LENGTH];
                keypair.copy_from_slice(&bytes);
                SigningKey::from_keypair_bytes(&keypair)
                    .map_err(|e| anyhow!("JWT secret keypair is inconsistent: {e}"))?
            }
            SECRET_KEY_LENGTH => {
                let mut seed = [0u8; SECRET_KEY_LENGTH];
                seed.copy_from_slice(&bytes);
                SigningKey::from_bytes(&seed)
            }
            n => bail!(
                "JWT secret must decode to {KEYPAIR_LENGTH} or {SECRET_KEY_LENGTH} bytes, got {n}"
            ),
        };

        Self::from_signing_key(signing)
    }

    pub fn from_signing_key(signing: SigningKey) -> Result<Self> {
        let der = signing
            .to_pkcs8_der()
            .map_err(|e| anyhow!("failed to encode signing key: {e}"))?;
        let encoding = EncodingKey::from_ed_der(der.as_bytes());
        Ok(Self { signing, encoding })
    }

    /// Fresh random keypair from the OS RNG
    pub fn generate() -> Result<Self> {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Base64 keypair (seed || public key), the format `JWT_SECRET` expects
    pub fn secret_base64(&self) -> String {
        STANDARD.encode(self.signing.to_keypair_bytes())
    }

    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.signing.verifying_key().to_bytes()
    }

    /// Value served by `GET /jwt-public-key`
    pub fn public_key_base64(&self) -> String {
        STANDARD.encode(self.public_key_bytes())
    }

    pub fn fingerprint(&self) -> String {
        hex::encode(&self.public_key_bytes()[..8])
    }
}

impl fmt::Debug for IssuerKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuerKeys")
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

/// Mints EdDSA bearer tokens
#[derive(Debug)]
pub struct TokenIssuer {
    keys: IssuerKeys,
    ttl_secs: u64,
}

impl TokenIssuer {
    pub fn new(keys: IssuerKeys, ttl_secs: u64) -> Self {
        Self { keys, ttl_secs }
    }

    pub fn keys(&self) -> &IssuerKeys {
        &self.keys
    }

    pub fn issue(&self, user_id: i64) -> Result<String> {
        let now = Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            sub: Some(user_id.to_string()),
            exp: Some(now + self.ttl_secs),
            iat: Some(now),
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(EXPECTED_ALGORITHM), claims, &self.keys.encoding)
            .context("failed to sign token")
    }
}
