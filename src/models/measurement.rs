// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Measurement model for storage and API.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single body-weight reading, stored in the `measurements` table.
///
/// `owner_id` is set once at creation from the authenticated identity and is
/// never sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    /// Server-generated identifier
    pub id: i32,
    #[serde(skip)]
    pub owner_id: String,
    /// Calendar date of the reading, serialized as `YYYY-MM-DD`
    pub measure_date: NaiveDate,
    /// Weight with one fractional digit, serialized as a JSON number
    #[serde(with = "rust_decimal::serde::float")]
    pub weight: Decimal,
}
