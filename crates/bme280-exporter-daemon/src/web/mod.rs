//! HTTP endpoints.

use askama::Template;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::metrics;
use crate::state::AppState;

/// Landing page template.
#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate;

/// Creates the web router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Landing page
        .route("/", get(index))
        // Prometheus scrape endpoint
        .route("/metrics", get(metrics_get))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - Landing page
async fn index() -> Response {
    match IndexTemplate.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render page: {}", e),
        )
            .into_response(),
    }
}

/// GET /metrics - Reads the sensor and returns three gauges
async fn metrics_get(State(state): State<Arc<AppState>>) -> Response {
    let reading = match state.sense().await {
        Ok(reading) => reading,
        Err(e) => {
            state.read_failed(&e);
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Failed to read {}: {}", state.sensor_name(), e),
            )
                .into_response();
        }
    };

    match metrics::encode(&reading) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, metrics::content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}
