// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Okta OpenID Connect client.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::provider::{IdentityProvider, ProviderError};
use crate::config::Config;
use crate::models::Profile;

const AUTH_SERVER_PATH: &str = "oauth2/default/v1";
const SCOPES: &str = "openid email profile";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Okta token endpoint response (only what we use).
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Okta OAuth error body.
#[derive(Debug, Deserialize)]
struct OktaErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Okta `/userinfo` claims.
#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
}

impl From<UserInfo> for Profile {
    fn from(info: UserInfo) -> Self {
        Profile {
            subject: info.sub,
            email: info.email.unwrap_or_default(),
            first_name: info.given_name.unwrap_or_default(),
            last_name: info.family_name.unwrap_or_default(),
        }
    }
}

/// Identity provider backed by an Okta org's default authorization server.
pub struct OktaProvider {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl OktaProvider {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: format!(
                "{}/{}",
                config.okta_org_url.trim_end_matches('/'),
                AUTH_SERVER_PATH
            ),
            client_id: config.okta_client_id.clone(),
            client_secret: config.okta_client_secret.clone(),
        })
    }

    /// Turn a non-success response into a provider error, keeping Okta's message.
    async fn rejection(response: reqwest::Response, what: &str) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, body = %body, "Okta {} failed", what);

        match serde_json::from_str::<OktaErrorResponse>(&body) {
            Ok(err) => ProviderError::Rejected(err.error_description.unwrap_or(err.error)),
            Err(_) if status.is_server_error() => {
                ProviderError::Unavailable(format!("{} returned {}", what, status))
            }
            Err(_) => ProviderError::Rejected(format!("{} failed with status {}", what, status)),
        }
    }

    async fn fetch_userinfo(&self, access_token: &str) -> Result<Profile, ProviderError> {
        let response = self
            .http
            .get(format!("{}/userinfo", self.base_url))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("userinfo request: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response, "userinfo").await);
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("userinfo parse: {}", e)))?;

        Ok(info.into())
    }
}

#[async_trait]
impl IdentityProvider for OktaProvider {
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> String {
        format!(
            "{}/authorize?\
             client_id={}&\
             response_type=code&\
             scope={}&\
             redirect_uri={}&\
             state={}",
            self.base_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(SCOPES),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state)
        )
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Profile, ProviderError> {
        let response = self
            .http
            .post(format!("{}/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("token request: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response, "token exchange").await);
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("token parse: {}", e)))?;

        let profile = self.fetch_userinfo(&tokens.access_token).await?;

        tracing::info!(subject = %profile.subject, "Okta login verified");
        Ok(profile)
    }
}
