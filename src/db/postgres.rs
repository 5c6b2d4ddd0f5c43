// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PostgreSQL measurement store.
//!
//! All statements are fully parameter-bound; the owner id always comes from
//! the resolved session, never from the request body.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::{normalize_weight, MeasurementStore, StoreError};
use crate::models::Measurement;

/// PostgreSQL-backed store. Cloning shares the underlying pool.
#[derive(Clone)]
pub struct PgMeasurementStore {
    pool: PgPool,
}

impl PgMeasurementStore {
    /// Open a connection pool. Fails if the database cannot be reached.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        tracing::info!(max_connections, "Connected to PostgreSQL");

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the measurements table and its lookup index if missing.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS measurements (
                id INT NOT NULL PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
                user_id VARCHAR(50) NOT NULL,
                measure_date DATE NOT NULL,
                weight NUMERIC(5,1) NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS measurements_user_date_idx \
             ON measurements (user_id, measure_date)",
        )
        .execute(&self.pool)
        .await?;

        tracing::info!(table = super::tables::MEASUREMENTS, "Schema ready");
        Ok(())
    }
}

#[async_trait]
impl MeasurementStore for PgMeasurementStore {
    async fn create(
        &self,
        owner_id: &str,
        measure_date: NaiveDate,
        weight: Decimal,
    ) -> Result<Measurement, StoreError> {
        let measurement = sqlx::query_as::<_, Measurement>(
            r#"
            INSERT INTO measurements (user_id, measure_date, weight)
            VALUES ($1, $2, $3)
            RETURNING id, user_id AS owner_id, measure_date, weight
            "#,
        )
        .bind(owner_id)
        .bind(measure_date)
        .bind(normalize_weight(weight))
        .fetch_one(&self.pool)
        .await?;

        Ok(measurement)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Measurement>, StoreError> {
        let rows = sqlx::query_as::<_, Measurement>(
            r#"
            SELECT id, user_id AS owner_id, measure_date, weight
            FROM measurements
            WHERE user_id = $1
            ORDER BY measure_date, id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn get_by_id(&self, owner_id: &str, id: i32) -> Result<Option<Measurement>, StoreError> {
        let row = sqlx::query_as::<_, Measurement>(
            r#"
            SELECT id, user_id AS owner_id, measure_date, weight
            FROM measurements
            WHERE user_id = $1 AND id = $2
            "#,
        )
        .bind(owner_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_by_id(
        &self,
        owner_id: &str,
        id: i32,
        measure_date: NaiveDate,
        weight: Decimal,
    ) -> Result<Option<Measurement>, StoreError> {
        let row = sqlx::query_as::<_, Measurement>(
            r#"
            UPDATE measurements
            SET measure_date = $3, weight = $4
            WHERE user_id = $1 AND id = $2
            RETURNING id, user_id AS owner_id, measure_date, weight
            "#,
        )
        .bind(owner_id)
        .bind(id)
        .bind(measure_date)
        .bind(normalize_weight(weight))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete_by_id(&self, owner_id: &str, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM measurements WHERE user_id = $1 AND id = $2")
            .bind(owner_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
