//! Health check endpoint for liveness probes.

use axum::http::StatusCode;

/// Returns 200 OK with the body "OK" while the server is accepting requests.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
