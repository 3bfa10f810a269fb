//! Database schema management for `scale-telemetry`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs`, and only when a database URL is
//! configured; the in-memory store needs no schema.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `readings` table and its per-device index. Safe to call on
/// every startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // `seq` records insertion order; readings are never updated or deleted
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS readings (
            seq                 BIGSERIAL        PRIMARY KEY,
            id                  UUID             NOT NULL UNIQUE,
            device_id           TEXT             NOT NULL,
            device_timestamp    TIMESTAMPTZ,
            server_timestamp    TIMESTAMPTZ      NOT NULL,
            weight_grams        DOUBLE PRECISION NOT NULL,
            item_count          BIGINT           NOT NULL,
            is_stable           BOOLEAN          NOT NULL,
            is_overload         BOOLEAN          NOT NULL,
            average_item_weight DOUBLE PRECISION,
            mode                TEXT             NOT NULL
                CHECK (mode IN ('WEIGHING', 'COUNTING', 'ERROR'))
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Serves `GET /api/v1/readings/{device_id}` newest-first
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_readings_device_seq
            ON readings (device_id, seq DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
