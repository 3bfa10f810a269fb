use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::models::Reading;
use crate::store::{self, ReadingStore};

// ---

pub fn router<S: ReadingStore>() -> Router<S> {
    // ---
    Router::new().route("/readings/{device_id}", get(handler::<S>))
}

/// Query parameters for `GET /api/v1/readings/{device_id}`.
///
/// `limit` is kept as raw text so a malformed value falls back to the
/// default instead of rejecting the request.
#[derive(Debug, Deserialize)]
pub struct ReadingsQuery {
    limit: Option<String>,
}

async fn handler<S: ReadingStore>(
    Path(device_id): Path<String>,
    Query(params): Query<ReadingsQuery>,
    State(store): State<S>,
) -> Result<Json<Vec<Reading>>, ApiError> {
    // ---
    info!(%device_id, "Request received for readings");

    let limit = store::resolve_limit(params.limit.as_deref());
    debug!(%device_id, ?params, limit, "Resolved readings limit");

    let readings = store.query(&device_id, limit).await.map_err(|e| {
        ApiError::Internal(
            anyhow::Error::new(e)
                .context(format!("Error retrieving readings for device {device_id}")),
        )
    })?;

    info!(%device_id, count = readings.len(), "Returning readings");
    Ok(Json(readings))
}
