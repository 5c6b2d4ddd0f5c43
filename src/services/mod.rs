// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - external collaborators.

pub mod okta;
pub mod provider;

pub use okta::OktaProvider;
pub use provider::{IdentityProvider, ProviderError};
