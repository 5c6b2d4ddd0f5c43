// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider boundary.
//!
//! The OAuth2 mechanics (code exchange, token verification) belong to the
//! provider. The login routes only need an authorization URL and, after the
//! callback, a verified profile.

use async_trait::async_trait;

use crate::models::Profile;

/// Provider failures during the callback leg.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider refused the request (bad code, revoked client, ...).
    #[error("{0}")]
    Rejected(String),

    /// The provider could not be reached or answered with garbage.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the browser is sent to in order to log in.
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> String;

    /// Trade an authorization code for the user's verified profile.
    async fn exchange_code(&self, code: &str, redirect_uri: &str)
        -> Result<Profile, ProviderError>;
}
