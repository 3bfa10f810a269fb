//! Ingestion and query service for weight-scale telemetry readings.
//!
//! Devices `POST` readings to `/api/v1/reading`; clients fetch the most recent
//! readings per device from `/api/v1/readings/{device_id}`. The binary in
//! `main.rs` wires configuration, logging and the chosen [`ReadingStore`]
//! backend into [`routes::router`].
//!
//! Module boundaries follow the Explicit Module Boundary Pattern (EMBP):
//! sibling modules reach each other through the re-exports below rather than
//! through each other's internals.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod schema;
pub mod store;
pub mod timestamp;
pub mod validate;

pub use config::{Config, Profile};
pub use models::{Mode, Reading, ReadingInput};
pub use store::{MemoryStore, PgReadingStore, ReadingStore};
