// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Weight Tracker: personal body-weight log behind an Okta login
//!
//! This crate provides the backend API for recording, listing, editing and
//! deleting weight measurements. Each measurement belongs to exactly one
//! user, identified by an encrypted session cookie minted after login.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod views;

use std::sync::Arc;

use config::Config;
use db::MeasurementStore;
use services::IdentityProvider;
use session::{SessionCodec, SessionError};

const OAUTH_STATE_KEY_INFO: &[u8] = b"oauth-state-v1";

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub sessions: SessionCodec,
    /// HMAC key for the OAuth anti-forgery state parameter
    pub oauth_state_key: [u8; 32],
    pub store: Arc<dyn MeasurementStore>,
    pub identity_provider: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Build state, deriving the session and OAuth state keys from the config secret.
    pub fn new(
        config: Config,
        store: Arc<dyn MeasurementStore>,
        identity_provider: Arc<dyn IdentityProvider>,
    ) -> Result<Self, SessionError> {
        let sessions = SessionCodec::new(&config.session_secret, config.session_ttl)?;
        let oauth_state_key = session::derive_key(&config.session_secret, OAUTH_STATE_KEY_INFO)?;

        Ok(Self {
            config,
            sessions,
            oauth_state_key,
            store,
            identity_provider,
        })
    }
}
