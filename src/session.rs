// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Encrypted session tokens.
//!
//! The whole session lives in the browser cookie, sealed with AES-256-GCM.
//! The AEAD key is derived from the configured secret with HKDF-SHA256, so a
//! token sealed under one secret never opens under another.
//!
//! Token layout: `base64url(nonce || ciphertext || tag)`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hkdf::Hkdf;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::models::Profile;

const HKDF_SALT: &[u8] = b"weight-tracker";
const SESSION_KEY_INFO: &[u8] = b"session-cookie-v1";
const SESSION_AAD: &[u8] = b"weight-tracker-session-v1";

/// Session codec errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Token is malformed, tampered with, expired, or sealed under another key.
    #[error("invalid session")]
    InvalidSession,

    #[error("session crypto failure: {0}")]
    Crypto(&'static str),

    #[error("session serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What actually gets sealed into the cookie.
#[derive(Debug, Serialize, Deserialize)]
struct SessionPayload {
    profile: Profile,
    /// Issued at (Unix timestamp)
    iat: i64,
    /// Expiration time (Unix timestamp)
    exp: i64,
}

/// Derive a 32-byte key for `info` from the server secret.
pub fn derive_key(secret: &[u8], info: &[u8]) -> Result<[u8; 32], SessionError> {
    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), secret);
    let mut okm = [0u8; 32];
    hk.expand(info, &mut okm)
        .map_err(|_| SessionError::Crypto("hkdf expand"))?;
    Ok(okm)
}

/// Seals and opens session tokens.
pub struct SessionCodec {
    key: LessSafeKey,
    rng: SystemRandom,
    ttl: Duration,
}

impl SessionCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, SessionError> {
        let key_bytes = derive_key(secret, SESSION_KEY_INFO)?;
        let unbound = UnboundKey::new(&AES_256_GCM, &key_bytes)
            .map_err(|_| SessionError::Crypto("aead key"))?;

        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
            ttl,
        })
    }

    /// Lifetime of a freshly issued token.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Seal a profile into a new token valid for the configured TTL.
    pub fn encode(&self, profile: &Profile) -> Result<String, SessionError> {
        self.encode_at(profile, Utc::now())
    }

    /// Seal a profile as if issued at `issued_at`.
    pub fn encode_at(
        &self,
        profile: &Profile,
        issued_at: DateTime<Utc>,
    ) -> Result<String, SessionError> {
        let payload = SessionPayload {
            profile: profile.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        let mut in_out = serde_json::to_vec(&payload)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| SessionError::Crypto("nonce generation"))?;

        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::from(SESSION_AAD),
                &mut in_out,
            )
            .map_err(|_| SessionError::Crypto("seal"))?;

        let mut token = Vec::with_capacity(NONCE_LEN + in_out.len());
        token.extend_from_slice(&nonce_bytes);
        token.extend_from_slice(&in_out);
        Ok(URL_SAFE_NO_PAD.encode(token))
    }

    /// Open a token and return its profile if it is authentic and unexpired.
    pub fn decode(&self, token: &str) -> Result<Profile, SessionError> {
        self.decode_at(token, Utc::now())
    }

    /// Open a token, checking expiry against `now`.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Profile, SessionError> {
        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| SessionError::InvalidSession)?;

        if raw.len() < NONCE_LEN + AES_256_GCM.tag_len() {
            return Err(SessionError::InvalidSession);
        }

        let (nonce_bytes, sealed) = raw.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| SessionError::InvalidSession)?;

        let mut buf = sealed.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::from(SESSION_AAD), &mut buf)
            .map_err(|_| SessionError::InvalidSession)?;

        let payload: SessionPayload =
            serde_json::from_slice(plaintext).map_err(|_| SessionError::InvalidSession)?;

        if payload.exp <= now.timestamp() {
            return Err(SessionError::InvalidSession);
        }

        Ok(payload.profile)
    }
}
