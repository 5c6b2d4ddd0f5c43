// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for measurements and the current user.
//!
//! Measurement handlers take the optional `Identity` and reject anonymous
//! callers themselves, so the 401 carries the API's JSON error body. The
//! identity check always runs before input validation and any store call.

use crate::db::normalize_weight;
use crate::error::{AppError, Result};
use crate::models::{Identity, Measurement, Profile};
use crate::views::ViewAuth;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;

/// Upper bound (exclusive) imposed by the NUMERIC(5,1) column.
const MAX_WEIGHT: Decimal = Decimal::from_parts(10000, 0, 0, false, 0);

/// Same message whether the row is missing or owned by someone else.
const NOT_FOUND_MESSAGE: &str = "Measurement not found";

/// Routes whose handlers check identity themselves.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/measurements",
            get(list_measurements).post(create_measurement),
        )
        .route(
            "/api/measurements/{id}",
            get(get_measurement)
                .put(update_measurement)
                .delete(delete_measurement),
        )
        .route("/api/session", get(get_session))
}

/// Routes that sit behind `require_auth` (applied in routes/mod.rs).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/me", get(get_me))
}

// ─── Input Validation ────────────────────────────────────────

/// Raw request body; fields are checked by hand for field-level messages.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct MeasurementPayload {
    measure_date: Option<Value>,
    weight: Option<Value>,
}

/// A validated create/update body.
#[derive(Debug, PartialEq)]
pub struct MeasurementInput {
    pub measure_date: NaiveDate,
    pub weight: Decimal,
}

impl MeasurementInput {
    /// Parse and validate a JSON request body.
    pub fn parse(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(AppError::BadRequest(
                "Request body must be a JSON object with \"measureDate\" and \"weight\""
                    .to_string(),
            ));
        }

        let payload: MeasurementPayload = serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON payload: {}", e)))?;

        Ok(Self {
            measure_date: parse_measure_date(payload.measure_date.as_ref())?,
            weight: parse_weight(payload.weight.as_ref())?,
        })
    }
}

fn parse_measure_date(value: Option<&Value>) -> Result<NaiveDate> {
    let invalid =
        || AppError::BadRequest("\"measureDate\" must be a valid date (YYYY-MM-DD)".to_string());

    let raw = match value {
        Some(Value::String(s)) => s.trim(),
        Some(_) => return Err(invalid()),
        None => return Err(AppError::BadRequest("\"measureDate\" is required".to_string())),
    };

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| chrono::DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| invalid())
}

fn parse_weight(value: Option<&Value>) -> Result<Decimal> {
    let invalid = || AppError::BadRequest("\"weight\" must be a number".to_string());

    let raw = match value {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => return Err(invalid()),
        None => return Err(AppError::BadRequest("\"weight\" is required".to_string())),
    };

    let weight = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| invalid())?;
    let weight = normalize_weight(weight);

    if weight <= Decimal::ZERO || weight >= MAX_WEIGHT {
        return Err(AppError::BadRequest(
            "\"weight\" must be greater than 0 and less than 10000".to_string(),
        ));
    }

    Ok(weight)
}

/// Path ids are positive 32-bit integers.
fn parse_id(raw: &str) -> Result<i32> {
    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::BadRequest(
            "id parameter must be a positive integer".to_string(),
        )),
    }
}

// ─── Measurements ────────────────────────────────────────────

/// Record a measurement for the current user.
async fn create_measurement(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    body: Bytes,
) -> Result<(StatusCode, Json<Measurement>)> {
    let user = identity.require()?;
    let input = MeasurementInput::parse(&body)?;

    let measurement = state
        .store
        .create(&user.subject, input.measure_date, input.weight)
        .await?;

    tracing::info!(
        owner = %user.subject,
        id = measurement.id,
        "Measurement created"
    );

    Ok((StatusCode::CREATED, Json(measurement)))
}

/// All of the current user's measurements, oldest first.
async fn list_measurements(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<Measurement>>> {
    let user = identity.require()?;

    let measurements = state.store.list_by_owner(&user.subject).await?;

    tracing::debug!(
        owner = %user.subject,
        count = measurements.len(),
        "Listed measurements"
    );

    Ok(Json(measurements))
}

async fn get_measurement(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Measurement>> {
    let user = identity.require()?;
    let id = parse_id(&id)?;

    state
        .store
        .get_by_id(&user.subject, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND_MESSAGE.to_string()))
}

async fn update_measurement(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Measurement>> {
    let user = identity.require()?;
    let id = parse_id(&id)?;
    let input = MeasurementInput::parse(&body)?;

    let updated = state
        .store
        .update_by_id(&user.subject, id, input.measure_date, input.weight)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND_MESSAGE.to_string()))?;

    tracing::info!(owner = %user.subject, id, "Measurement updated");
    Ok(Json(updated))
}

async fn delete_measurement(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let user = identity.require()?;
    let id = parse_id(&id)?;

    if !state.store.delete_by_id(&user.subject, id).await? {
        return Err(AppError::NotFound(NOT_FOUND_MESSAGE.to_string()));
    }

    tracing::info!(owner = %user.subject, id, "Measurement deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ─── Current User ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Get current user profile.
async fn get_me(Extension(user): Extension<Profile>) -> Json<UserResponse> {
    Json(UserResponse {
        id: user.subject,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
    })
}

/// Login state for client-side rendering; never rejects.
async fn get_session(identity: Identity) -> Json<ViewAuth> {
    Json(ViewAuth::from(&identity))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bad_request(result: Result<MeasurementInput>) -> String {
        match result {
            Err(AppError::BadRequest(msg)) => msg,
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_valid_input() {
        let input =
            MeasurementInput::parse(br#"{"measureDate": "2024-01-10", "weight": 70.5}"#).unwrap();
        assert_eq!(input.measure_date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(input.weight.to_string(), "70.5");
    }

    #[test]
    fn test_parse_accepts_timestamp_and_numeric_string() {
        let input = MeasurementInput::parse(
            br#"{"measureDate": "2024-01-10T08:30:00Z", "weight": "81.25"}"#,
        )
        .unwrap();
        assert_eq!(input.measure_date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(input.weight.to_string(), "81.3");
    }

    #[test]
    fn test_parse_rejects_bad_date() {
        let msg = bad_request(MeasurementInput::parse(
            br#"{"measureDate": "2024-13-45", "weight": 70.5}"#,
        ));
        assert!(msg.contains("measureDate"));

        let msg = bad_request(MeasurementInput::parse(
            br#"{"measureDate": 20240110, "weight": 70.5}"#,
        ));
        assert!(msg.contains("measureDate"));
    }

    #[test]
    fn test_parse_rejects_bad_weight() {
        for body in [
            r#"{"measureDate": "2024-01-10", "weight": "heavy"}"#,
            r#"{"measureDate": "2024-01-10", "weight": true}"#,
            r#"{"measureDate": "2024-01-10", "weight": -3}"#,
            r#"{"measureDate": "2024-01-10", "weight": 0.01}"#,
            r#"{"measureDate": "2024-01-10", "weight": 9999.96}"#,
            r#"{"measureDate": "2024-01-10"}"#,
        ] {
            let msg = bad_request(MeasurementInput::parse(body.as_bytes()));
            assert!(msg.contains("weight"), "unexpected message {msg:?} for {body}");
        }
    }

    #[test]
    fn test_parse_rejects_malformed_body() {
        bad_request(MeasurementInput::parse(b""));
        bad_request(MeasurementInput::parse(b"not json"));
        bad_request(MeasurementInput::parse(b"[1, 2]"));
        bad_request(MeasurementInput::parse(
            br#"{"measureDate": "2024-01-10", "weight": 70.5, "userId": "u2"}"#,
        ));
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(matches!(parse_id("0"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_id("-1"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_id("abc"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_id("1.5"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_id("99999999999"), Err(AppError::BadRequest(_))));
    }
}
