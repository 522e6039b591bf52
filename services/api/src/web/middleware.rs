//! services/api/src/web/middleware.rs
//!
//! Request logging middleware.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, warn};

/// Logs every request with its status and latency. Client and server errors
/// are logged as warnings.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed = started.elapsed();
    if status.is_client_error() || status.is_server_error() {
        warn!("{} {} -> {} in {:?}", method, path, status.as_u16(), elapsed);
    } else {
        info!("{} {} -> {} in {:?}", method, path, status.as_u16(), elapsed);
    }
    response
}
