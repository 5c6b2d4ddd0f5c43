// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use weight_tracker::config::Config;
use weight_tracker::db::{MeasurementStore, MemoryMeasurementStore, StoreError};
use weight_tracker::middleware::auth::SESSION_COOKIE;
use weight_tracker::models::{Measurement, Profile};
use weight_tracker::routes::create_router;
use weight_tracker::services::{IdentityProvider, ProviderError};
use weight_tracker::AppState;

/// PostgreSQL URL for integration tests, if one is configured.
#[allow(dead_code)]
pub fn test_database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL").ok()
}

/// Evaluate to the test database URL, or skip the test if unset.
#[macro_export]
macro_rules! require_database {
    () => {
        match crate::common::test_database_url() {
            Some(url) => url,
            None => {
                eprintln!("⚠️  Skipping: TEST_DATABASE_URL not set");
                return;
            }
        }
    };
}

/// Authorization code the stub provider accepts.
#[allow(dead_code)]
pub const GOOD_CODE: &str = "good-code";

/// Provider message returned for any other code.
#[allow(dead_code)]
pub const REJECTED_MESSAGE: &str = "The authorization code is invalid or has expired.";

/// Build a provider profile for `subject`.
#[allow(dead_code)]
pub fn profile(subject: &str) -> Profile {
    Profile {
        subject: subject.to_string(),
        email: format!("{subject}@example.com"),
        first_name: "Test".to_string(),
        last_name: subject.to_uppercase(),
    }
}

/// Identity provider double: accepts `GOOD_CODE` for a fixed profile.
pub struct StubProvider {
    pub profile: Profile,
}

#[async_trait]
impl IdentityProvider for StubProvider {
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> String {
        format!(
            "https://idp.test/authorize?state={}&redirect_uri={}",
            urlencoding::encode(state),
            urlencoding::encode(redirect_uri)
        )
    }

    async fn exchange_code(
        &self,
        code: &str,
        _redirect_uri: &str,
    ) -> Result<Profile, ProviderError> {
        if code == GOOD_CODE {
            Ok(self.profile.clone())
        } else {
            Err(ProviderError::Rejected(REJECTED_MESSAGE.to_string()))
        }
    }
}

/// Memory store that counts every call made to it.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryMeasurementStore,
    calls: AtomicUsize,
}

impl CountingStore {
    #[allow(dead_code)]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MeasurementStore for CountingStore {
    async fn create(
        &self,
        owner_id: &str,
        measure_date: NaiveDate,
        weight: Decimal,
    ) -> Result<Measurement, StoreError> {
        self.hit();
        self.inner.create(owner_id, measure_date, weight).await
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Measurement>, StoreError> {
        self.hit();
        self.inner.list_by_owner(owner_id).await
    }

    async fn get_by_id(&self, owner_id: &str, id: i32) -> Result<Option<Measurement>, StoreError> {
        self.hit();
        self.inner.get_by_id(owner_id, id).await
    }

    async fn update_by_id(
        &self,
        owner_id: &str,
        id: i32,
        measure_date: NaiveDate,
        weight: Decimal,
    ) -> Result<Option<Measurement>, StoreError> {
        self.hit();
        self.inner
            .update_by_id(owner_id, id, measure_date, weight)
            .await
    }

    async fn delete_by_id(&self, owner_id: &str, id: i32) -> Result<bool, StoreError> {
        self.hit();
        self.inner.delete_by_id(owner_id, id).await
    }
}

/// Store whose database is always down.
pub struct FailingStore;

#[async_trait]
impl MeasurementStore for FailingStore {
    async fn create(&self, _: &str, _: NaiveDate, _: Decimal) -> Result<Measurement, StoreError> {
        Err(down())
    }

    async fn list_by_owner(&self, _: &str) -> Result<Vec<Measurement>, StoreError> {
        Err(down())
    }

    async fn get_by_id(&self, _: &str, _: i32) -> Result<Option<Measurement>, StoreError> {
        Err(down())
    }

    async fn update_by_id(
        &self,
        _: &str,
        _: i32,
        _: NaiveDate,
        _: Decimal,
    ) -> Result<Option<Measurement>, StoreError> {
        Err(down())
    }

    async fn delete_by_id(&self, _: &str, _: i32) -> Result<bool, StoreError> {
        Err(down())
    }
}

fn down() -> StoreError {
    StoreError::Unavailable("connection refused (10.0.0.5:5432)".to_string())
}

/// A router plus handles on its state and store.
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: Arc<CountingStore>,
}

impl TestApp {
    /// Send one request through a clone of the router.
    #[allow(dead_code)]
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// `Cookie` header value carrying a fresh session for `subject`.
    #[allow(dead_code)]
    pub fn cookie_for(&self, subject: &str) -> String {
        let token = self.state.sessions.encode(&profile(subject)).unwrap();
        format!("{SESSION_COOKIE}={token}")
    }
}

/// Create a test app with a counting memory store and default test config.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> TestApp {
    let store = Arc::new(CountingStore::default());
    let (router, state) = create_test_app_with_store(config, store.clone());
    TestApp {
        router,
        state,
        store,
    }
}

/// Create a test app around any store.
#[allow(dead_code)]
pub fn create_test_app_with_store(
    config: Config,
    store: Arc<dyn MeasurementStore>,
) -> (axum::Router, Arc<AppState>) {
    let provider = Arc::new(StubProvider {
        profile: profile("okta-user-1"),
    });
    let state = Arc::new(AppState::new(config, store, provider).unwrap());
    (create_router(state.clone()), state)
}

/// Build a request with an optional session cookie and JSON body.
#[allow(dead_code)]
pub fn request(
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// All `Set-Cookie` header values on a response.
#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// The `Set-Cookie` header for `name`, if any.
#[allow(dead_code)]
pub fn find_cookie(headers: &[String], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
}

/// Value part of a `Set-Cookie` header (`name=value; ...` -> `value`).
#[allow(dead_code)]
pub fn cookie_value(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.split_once('='))
        .map(|(_, value)| value.to_string())
        .unwrap_or_default()
}
