//! PostgreSQL-backed reading store.
//!
//! Insertion order is the `seq` BIGSERIAL column; queries order by it rather
//! than by timestamp. Each insert runs in a transaction holding a per-device
//! advisory lock, and the server timestamp is taken under that lock, so `seq`
//! order and `server_timestamp` order agree for every device. Schema is
//! created by [`crate::schema::create_schema`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{ReadingStore, ServerClock, StoreError, MAX_LIMIT};
use crate::models::{Mode, Reading, ReadingInput};

// ---

#[derive(Debug, Clone)]
pub struct PgReadingStore {
    pool: PgPool,
    clock: Arc<ServerClock>,
}

/// Row shape of the `readings` table.
#[derive(Debug, sqlx::FromRow)]
struct ReadingRow {
    // ---
    id: Uuid,
    device_id: String,
    device_timestamp: Option<DateTime<Utc>>,
    server_timestamp: DateTime<Utc>,
    weight_grams: f64,
    item_count: i64,
    is_stable: bool,
    is_overload: bool,
    average_item_weight: Option<f64>,
    mode: String,
}

impl TryFrom<ReadingRow> for Reading {
    type Error = StoreError;

    fn try_from(row: ReadingRow) -> Result<Self, Self::Error> {
        // ---
        let mode = row
            .mode
            .parse::<Mode>()
            .map_err(|e| StoreError::CorruptRow(format!("reading {}: {}", row.id, e)))?;

        Ok(Reading {
            id: row.id,
            device_id: row.device_id,
            device_timestamp: row.device_timestamp,
            server_timestamp: row.server_timestamp,
            weight_grams: row.weight_grams,
            item_count: row.item_count,
            is_stable: row.is_stable,
            is_overload: row.is_overload,
            average_item_weight: row.average_item_weight,
            mode,
        })
    }
}

impl PgReadingStore {
    // ---
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            clock: Arc::new(ServerClock::new()),
        }
    }
}

impl ReadingStore for PgReadingStore {
    // ---
    async fn store(&self, reading: ReadingInput) -> Result<Reading, StoreError> {
        // ---
        let mut tx = self.pool.begin().await?;

        // Released on commit or rollback
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&reading.device_id)
            .execute(&mut *tx)
            .await?;

        let reading = reading.into_reading(self.clock.tick()?);

        sqlx::query(
            r#"
            INSERT INTO readings (
                id, device_id, device_timestamp, server_timestamp,
                weight_grams, item_count, is_stable, is_overload,
                average_item_weight, mode
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(reading.id)
        .bind(&reading.device_id)
        .bind(reading.device_timestamp)
        .bind(reading.server_timestamp)
        .bind(reading.weight_grams)
        .bind(reading.item_count)
        .bind(reading.is_stable)
        .bind(reading.is_overload)
        .bind(reading.average_item_weight)
        .bind(reading.mode.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(reading)
    }

    async fn query(&self, device_id: &str, limit: usize) -> Result<Vec<Reading>, StoreError> {
        // ---
        let limit = limit.min(MAX_LIMIT) as i64;

        let rows: Vec<ReadingRow> = sqlx::query_as(
            r#"
            SELECT id, device_id, device_timestamp, server_timestamp,
                   weight_grams, item_count, is_stable, is_overload,
                   average_item_weight, mode
            FROM readings
            WHERE device_id = $1
            ORDER BY seq DESC
            LIMIT $2
            "#,
        )
        .bind(device_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Reading::try_from).collect()
    }
}
