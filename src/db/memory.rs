// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process measurement store.
//!
//! Same ownership and ordering rules as the PostgreSQL store. Used by the
//! test suite and for running locally with `DATABASE_URL=memory:`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use super::{normalize_weight, MeasurementStore, StoreError};
use crate::models::Measurement;

#[derive(Default)]
struct Inner {
    last_id: i32,
    rows: BTreeMap<i32, Measurement>,
}

/// Memory-backed store. Ids start at 1 and are never reused.
#[derive(Default)]
pub struct MemoryMeasurementStore {
    inner: RwLock<Inner>,
}

impl MemoryMeasurementStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MeasurementStore for MemoryMeasurementStore {
    async fn create(
        &self,
        owner_id: &str,
        measure_date: NaiveDate,
        weight: Decimal,
    ) -> Result<Measurement, StoreError> {
        let mut inner = self.inner.write().await;
        inner.last_id = inner
            .last_id
            .checked_add(1)
            .ok_or_else(|| StoreError::Unavailable("id sequence exhausted".to_string()))?;

        let measurement = Measurement {
            id: inner.last_id,
            owner_id: owner_id.to_string(),
            measure_date,
            weight: normalize_weight(weight),
        };
        inner.rows.insert(measurement.id, measurement.clone());
        Ok(measurement)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Measurement>, StoreError> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Measurement> = inner
            .rows
            .values()
            .filter(|m| m.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.measure_date.cmp(&b.measure_date).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn get_by_id(&self, owner_id: &str, id: i32) -> Result<Option<Measurement>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .get(&id)
            .filter(|m| m.owner_id == owner_id)
            .cloned())
    }

    async fn update_by_id(
        &self,
        owner_id: &str,
        id: i32,
        measure_date: NaiveDate,
        weight: Decimal,
    ) -> Result<Option<Measurement>, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.rows.get_mut(&id) {
            Some(m) if m.owner_id == owner_id => {
                m.measure_date = measure_date;
                m.weight = normalize_weight(weight);
                Ok(Some(m.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_by_id(&self, owner_id: &str, id: i32) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let owned = inner
            .rows
            .get(&id)
            .map(|m| m.owner_id == owner_id)
            .unwrap_or(false);
        if owned {
            inner.rows.remove(&id);
        }
        Ok(owned)
    }
}
