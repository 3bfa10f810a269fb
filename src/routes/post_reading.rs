use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::store::ReadingStore;
use crate::validate;

// ---

pub fn router<S: ReadingStore>() -> Router<S> {
    // ---
    Router::new().route("/reading", post(handler::<S>))
}

/// Body of a `201 Created` response.
#[derive(Debug, Serialize)]
struct ReadingAccepted {
    message: &'static str,
    device_id: String,
    received_timestamp: String,
}

/// Handle `POST /api/v1/reading`.
///
/// Content type, JSON shape, presence of required fields, then field types
/// are checked in that order; the first failing step decides the response.
async fn handler<S: ReadingStore>(
    State(store): State<S>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<ReadingAccepted>), ApiError> {
    // ---
    if !is_json_content_type(&headers) {
        warn!("Received non-JSON request to /reading");
        return Err(ApiError::MalformedRequest);
    }

    let payload = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            warn!("Request body to /reading is not a JSON object");
            return Err(ApiError::MalformedRequest);
        }
    };
    debug!("Received data: {:?}", payload);

    let missing = validate::missing_fields(&payload);
    if !missing.is_empty() {
        warn!("Validation failed: {:?}", missing);
        return Err(ApiError::Validation(missing));
    }

    let input = validate::decode(&payload).map_err(|errors| {
        warn!("Validation failed: {:?}", errors);
        ApiError::Validation(errors)
    })?;

    let stored = store.store(input).await.map_err(|e| {
        ApiError::Internal(anyhow::Error::new(e).context("Failed to store reading"))
    })?;

    info!(
        device_id = %stored.device_id,
        reading_id = %stored.id,
        "Reading processed successfully"
    );

    Ok((
        StatusCode::CREATED,
        Json(ReadingAccepted {
            message: "Reading received successfully",
            received_timestamp: stored
                .server_timestamp
                .to_rfc3339_opts(SecondsFormat::Micros, true),
            device_id: stored.device_id,
        }),
    ))
}

/// `application/json` or any `application/*+json` media type.
fn is_json_content_type(headers: &HeaderMap) -> bool {
    // ---
    let Some(value) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let mime = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use axum::http::HeaderValue;

    fn with_content_type(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_json_content_types() {
        // ---
        assert!(is_json_content_type(&with_content_type("application/json")));
        assert!(is_json_content_type(&with_content_type(
            "application/json; charset=utf-8"
        )));
        assert!(is_json_content_type(&with_content_type(
            "application/vnd.scale+json"
        )));
    }

    #[test]
    fn test_non_json_content_types() {
        // ---
        assert!(!is_json_content_type(&HeaderMap::new()));
        assert!(!is_json_content_type(&with_content_type("text/plain")));
        assert!(!is_json_content_type(&with_content_type(
            "application/x-www-form-urlencoded"
        )));
    }
}
