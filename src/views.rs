// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! View context handed to the page renderer.
//!
//! Pages show who is logged in. Rather than patching every outgoing view,
//! whoever builds a `ViewContext` calls `decorate` with the request's identity.

use serde::Serialize;

use crate::models::Identity;

/// Login state as seen by templates. Anonymous users get empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewAuth {
    pub is_authenticated: bool,
    pub is_anonymous: bool,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&Identity> for ViewAuth {
    fn from(identity: &Identity) -> Self {
        match identity {
            Identity::Authenticated(profile) => ViewAuth {
                is_authenticated: true,
                is_anonymous: false,
                email: profile.email.clone(),
                first_name: profile.first_name.clone(),
                last_name: profile.last_name.clone(),
            },
            Identity::Anonymous => ViewAuth {
                is_authenticated: false,
                is_anonymous: true,
                email: String::new(),
                first_name: String::new(),
                last_name: String::new(),
            },
        }
    }
}

/// Data for one rendered page.
#[derive(Debug, Clone, Serialize)]
pub struct ViewContext {
    pub title: String,
    pub auth: ViewAuth,
}

impl ViewContext {
    /// A context that shows the anonymous state until decorated.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            auth: ViewAuth::from(&Identity::Anonymous),
        }
    }

    /// Attach the request's login state.
    pub fn decorate(mut self, identity: &Identity) -> Self {
        self.auth = ViewAuth::from(identity);
        self
    }
}
