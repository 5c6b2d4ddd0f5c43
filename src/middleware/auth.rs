// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie authentication.
//!
//! Two policies are offered to routes:
//! - `require_auth` middleware rejects anonymous requests with 401 before the
//!   handler runs and inserts the `Profile` as a request extension.
//! - The `Identity` extractor never rejects; the handler decides.

use crate::error::{AppError, Result};
use crate::models::{Identity, Profile};
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::convert::Infallible;
use std::sync::Arc;

/// Name of the encrypted session cookie.
pub const SESSION_COOKIE: &str = "okta-oauth";

/// Resolve the identity carried by a request's cookies.
///
/// A missing, tampered or expired session is simply anonymous.
pub fn resolve(state: &AppState, jar: &CookieJar) -> Identity {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Identity::Anonymous;
    };

    match state.sessions.decode(cookie.value()) {
        Ok(profile) => Identity::Authenticated(profile),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unusable session cookie");
            Identity::Anonymous
        }
    }
}

/// Mint the session cookie for a freshly verified profile.
pub fn establish(state: &AppState, profile: &Profile) -> Result<Cookie<'static>> {
    let token = state
        .sessions
        .encode(profile)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Session creation failed: {}", e)))?;

    let max_age = time::Duration::seconds(state.sessions.ttl().num_seconds());

    Ok(Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.config.secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build())
}

/// Cookie that expires the session in the browser.
pub fn clear(state: &AppState) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(state.config.secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(time::Duration::ZERO)
        .build()
}

impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(resolve(state, &jar))
    }
}

/// Middleware that requires a valid session cookie.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let profile = resolve(&state, &jar).require()?;
    request.extensions_mut().insert(profile);

    Ok(next.run(request).await)
}
