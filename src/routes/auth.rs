// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Okta OAuth login routes.
//!
//! `/login` sends the browser to the provider with a signed anti-forgery
//! state whose nonce is also pinned in a short-lived cookie. The callback
//! only mints a session when both agree and the provider verifies the code.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::middleware::auth::{clear, establish};
use crate::models::Identity;
use crate::services::ProviderError;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Cookie pinning the OAuth state nonce to this browser.
pub const STATE_COOKIE: &str = "okta-oauth-state";
pub const CALLBACK_PATH: &str = "/authorization-code/callback";

/// How long a login attempt may take at the provider.
const STATE_MAX_AGE_SECS: u64 = 10 * 60;
const NONCE_LEN: usize = 16;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login))
        .route(CALLBACK_PATH, get(auth_callback))
        .route("/logout", get(logout))
}

fn now_secs() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_secs())
}

/// Build the signed state: base64("nonce|timestamp_hex|signature_hex").
fn sign_state(nonce: &str, issued_at: u64, secret: &[u8]) -> Result<String> {
    let payload = format!("{}|{:x}", nonce, issued_at);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed_state = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed_state.as_bytes()))
}

/// Verify the HMAC signature and age of a state parameter; returns its nonce.
fn verify_and_decode_state(state: &str, secret: &[u8], now: u64) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Format is "nonce|timestamp_hex|signature_hex"
    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    if parts.len() != 3 {
        return None;
    }

    let (nonce, timestamp_hex, signature_hex) = (parts[0], parts[1], parts[2]);
    let signature = hex::decode(signature_hex).ok()?;

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(format!("{}|{}", nonce, timestamp_hex).as_bytes());
    if mac.verify_slice(&signature).is_err() {
        tracing::warn!("OAuth state signature mismatch");
        return None;
    }

    let issued_at = u64::from_str_radix(timestamp_hex, 16).ok()?;
    if now.saturating_sub(issued_at) > STATE_MAX_AGE_SECS {
        tracing::warn!(issued_at, "OAuth state expired");
        return None;
    }

    Some(nonce.to_string())
}

fn state_cookie(state: &AppState, nonce: String, max_age_secs: u64) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, nonce))
        .path(CALLBACK_PATH)
        .http_only(true)
        .secure(state.config.secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_secs as i64))
        .build()
}

/// Start the login: redirect to the provider unless already logged in.
async fn login(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    if let Identity::Authenticated(profile) = identity {
        tracing::debug!(subject = %profile.subject, "Already logged in");
        return Ok((jar, Redirect::temporary("/")));
    }

    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Nonce generation failed")))?;
    let nonce = hex::encode(nonce_bytes);

    let oauth_state = sign_state(&nonce, now_secs()?, &state.oauth_state_key)?;
    let auth_url = state
        .identity_provider
        .authorize_url(&oauth_state, &state.config.callback_url());

    tracing::info!("Starting OAuth flow, redirecting to identity provider");

    let jar = jar.add(state_cookie(&state, nonce, STATE_MAX_AGE_SECS));
    Ok((jar, Redirect::temporary(&auth_url)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// OAuth callback - verify state, exchange the code, create the session.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    // Check for OAuth errors reported by the provider
    if let Some(error) = params.error {
        let message = params.error_description.unwrap_or(error);
        tracing::warn!(error = %message, "OAuth error from identity provider");
        return Err(AppError::AuthenticationFailed(message));
    }

    let oauth_state = params
        .state
        .ok_or_else(|| AppError::AuthenticationFailed("Missing state parameter".to_string()))?;

    let nonce = verify_and_decode_state(&oauth_state, &state.oauth_state_key, now_secs()?)
        .ok_or_else(|| {
            AppError::AuthenticationFailed("Invalid or expired state parameter".to_string())
        })?;

    let pinned = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let matches = pinned
        .map(|p| bool::from(p.as_bytes().ct_eq(nonce.as_bytes())))
        .unwrap_or(false);
    if !matches {
        tracing::warn!("OAuth state does not match this browser's login attempt");
        return Err(AppError::AuthenticationFailed(
            "Login attempt does not match this browser".to_string(),
        ));
    }

    let code = params.code.ok_or_else(|| {
        AppError::AuthenticationFailed("Missing authorization code".to_string())
    })?;

    tracing::info!("Exchanging authorization code for profile");

    let profile = state
        .identity_provider
        .exchange_code(&code, &state.config.callback_url())
        .await
        .map_err(|e| match e {
            ProviderError::Rejected(msg) => AppError::AuthenticationFailed(msg),
            ProviderError::Unavailable(msg) => {
                tracing::error!(error = %msg, "Identity provider unavailable");
                AppError::AuthenticationFailed("Identity provider unavailable".to_string())
            }
        })?;

    let session = establish(&state, &profile)?;

    tracing::info!(
        subject = %profile.subject,
        "OAuth successful, session established"
    );

    let jar = jar
        .add(session)
        .add(state_cookie(&state, String::new(), 0));
    Ok((jar, Redirect::temporary("/")))
}

/// Logout - expire the session cookie and go home.
async fn logout(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    if let Some(profile) = identity.profile() {
        tracing::info!(subject = %profile.subject, "Logging out");
    }

    (jar.add(clear(&state)), Redirect::temporary("/"))
}
