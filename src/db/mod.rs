// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer: owner-scoped measurement storage.
//!
//! Every operation takes the owner id of the authenticated caller. A row that
//! exists but belongs to someone else is reported exactly like a missing row
//! (`None` / `false`), so callers cannot probe for other users' data.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::Measurement;

pub use memory::MemoryMeasurementStore;
pub use postgres::PgMeasurementStore;

/// Table names as constants.
pub mod tables {
    pub const MEASUREMENTS: &str = "measurements";
}

/// Store faults. These are never expected outcomes of a valid request.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Owner-scoped CRUD over measurements.
#[async_trait]
pub trait MeasurementStore: Send + Sync {
    /// Insert a measurement and return it with its generated id.
    async fn create(
        &self,
        owner_id: &str,
        measure_date: NaiveDate,
        weight: Decimal,
    ) -> Result<Measurement, StoreError>;

    /// All of the owner's measurements, oldest date first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Measurement>, StoreError>;

    async fn get_by_id(&self, owner_id: &str, id: i32) -> Result<Option<Measurement>, StoreError>;

    async fn update_by_id(
        &self,
        owner_id: &str,
        id: i32,
        measure_date: NaiveDate,
        weight: Decimal,
    ) -> Result<Option<Measurement>, StoreError>;

    /// Returns `true` if a row was deleted.
    async fn delete_by_id(&self, owner_id: &str, id: i32) -> Result<bool, StoreError>;
}

/// Weights are kept with exactly one fractional digit, rounded the way
/// PostgreSQL rounds NUMERIC (half away from zero).
pub fn normalize_weight(weight: Decimal) -> Decimal {
    let mut rounded = weight.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(1);
    rounded
}
