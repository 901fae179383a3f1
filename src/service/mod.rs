//! HTTP surface of the scraper and OCR services.

pub mod catalog;
pub mod ocr;

pub use catalog::{CatalogState, catalog_router};
pub use ocr::{OcrState, ocr_router};

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tokio::net::TcpListener;

/// Error returned to HTTP callers as `{"detail": ...}`
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request itself is invalid
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            ::log::error!("Request failed: {}", self);
        } else {
            ::log::debug!("Rejected request: {}", self);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Binds `addr` and serves `app` until the process stops
pub async fn serve(addr: &str, app: Router) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    ::log::info!("HTTP server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await
}
