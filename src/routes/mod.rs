//! Route gateway: merges every endpoint subrouter and injects the store.

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::store::ReadingStore;

mod get_readings;
mod health;
mod post_reading;

// ---

pub fn router<S: ReadingStore>(store: S) -> Router {
    // ---
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(post_reading::router::<S>())
                .merge(get_readings::router::<S>()),
        )
        .merge(health::router::<S>())
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                tracing::info_span!("http", method = %req.method(), uri = %req.uri())
            }),
        )
        .with_state(store)
}
