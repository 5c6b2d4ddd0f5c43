// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Who a request belongs to.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Verified profile handed back by the identity provider.
///
/// This is all that is sealed into the session cookie; nothing about the user
/// is stored server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Provider subject id, used as the owner id of measurements
    pub subject: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Result of resolving a request's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Authenticated(Profile),
    Anonymous,
}

impl Identity {
    /// Turn the identity into a profile, rejecting anonymous callers.
    pub fn require(self) -> Result<Profile, AppError> {
        match self {
            Identity::Authenticated(profile) => Ok(profile),
            Identity::Anonymous => Err(AppError::Unauthorized),
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            Identity::Authenticated(profile) => Some(profile),
            Identity::Anonymous => None,
        }
    }
}
