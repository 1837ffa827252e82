use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::VectorSpace;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Failed to upload product '{product_id}': {cause}")]
    Upload {
        product_id: String,
        #[source]
        cause: Box<CatalogError>,
    },

    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Stored '{space}' vector for product '{product_id}' is missing or empty")]
    InvalidVector {
        product_id: String,
        space: VectorSpace,
    },

    #[error("Search error: {0}")]
    Search(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Timed out waiting for vector store: {0}")]
    Timeout(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    pub fn upload(product_id: impl Into<String>, cause: CatalogError) -> Self {
        CatalogError::Upload {
            product_id: product_id.into(),
            cause: Box::new(cause),
        }
    }

    /// Whether the same request may succeed if simply retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            CatalogError::Timeout(_) => true,
            CatalogError::Upload { cause, .. } => cause.is_retryable(),
            _ => false,
        }
    }

    /// Stable machine-readable identifier, also used as the `error` field of HTTP bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::Encoding(_) => "ENCODING_ERROR",
            CatalogError::Upload { .. } => "UPLOAD_ERROR",
            CatalogError::NotFound(_) => "NOT_FOUND",
            CatalogError::InvalidVector { .. } => "INVALID_VECTOR",
            CatalogError::Search(_) => "SEARCH_ERROR",
            CatalogError::Schema(_) => "SCHEMA_ERROR",
            CatalogError::Store(_) => "STORE_ERROR",
            CatalogError::Timeout(_) => "TIMEOUT",
            CatalogError::Validation(_) => "VALIDATION_ERROR",
            CatalogError::Config(_) => "CONFIG_ERROR",
            CatalogError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn code(&self) -> i32 {
        match self {
            CatalogError::Validation(_) => 2001,
            CatalogError::NotFound(_) => 2002,
            CatalogError::InvalidVector { .. } => 2003,
            CatalogError::Encoding(_) => 2101,
            CatalogError::Upload { .. } => 2102,
            CatalogError::Search(_) => 2103,
            CatalogError::Schema(_) => 2104,
            CatalogError::Store(_) => 2105,
            CatalogError::Timeout(_) => 2106,
            CatalogError::Config(_) => 2901,
            CatalogError::Internal(_) => 2999,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::InvalidVector { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            CatalogError::Encoding(_) => StatusCode::BAD_GATEWAY,
            CatalogError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CatalogError::Upload { cause, .. } => cause.status_code(),
            CatalogError::Search(_)
            | CatalogError::Schema(_)
            | CatalogError::Store(_)
            | CatalogError::Config(_)
            | CatalogError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<qdrant_client::QdrantError> for CatalogError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        CatalogError::Store(err.to_string())
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        CatalogError::Encoding(err.to_string())
    }
}

impl From<image::ImageError> for CatalogError {
    fn from(err: image::ImageError) -> Self {
        CatalogError::Encoding(format!("Image decoding failed: {}", err))
    }
}

impl From<validator::ValidationErrors> for CatalogError {
    fn from(err: validator::ValidationErrors) -> Self {
        CatalogError::Validation(err.to_string())
    }
}

impl From<core_config::ConfigError> for CatalogError {
    fn from(err: core_config::ConfigError) -> Self {
        CatalogError::Config(err.to_string())
    }
}

/// Standard error body returned by every catalog endpoint.
///
/// ```json
/// {
///   "code": 2002,
///   "error": "NOT_FOUND",
///   "message": "Product not found: p1",
///   "retryable": false
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Integer error code for logging and monitoring
    pub code: i32,
    /// Machine-readable error identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Whether retrying the same request may succeed
    pub retryable: bool,
    /// Optional structured details (e.g. validation field errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error_code = self.code(), error = %self, "Catalog request failed");
        } else {
            tracing::info!(error_code = self.code(), error = %self, "Catalog request rejected");
        }

        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

impl From<&CatalogError> for ErrorResponse {
    fn from(err: &CatalogError) -> Self {
        Self {
            code: err.code(),
            error: err.kind().to_string(),
            message: err.to_string(),
            retryable: err.is_retryable(),
            details: None,
        }
    }
}
