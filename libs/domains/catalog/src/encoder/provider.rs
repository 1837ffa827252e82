use async_trait::async_trait;

use crate::error::{CatalogError, CatalogResult};

/// Turns product names into vectors for the `name` space
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextEncoder: Send + Sync {
    /// Embed a single text; the result has exactly `NAME_VECTOR_DIM` entries
    async fn encode_text(&self, text: &str) -> CatalogResult<Vec<f32>>;
}

/// Turns image URIs into vectors for the `image` space
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageEncoder: Send + Sync {
    /// Fetch, decode and embed the image at `source`; the result has exactly
    /// `IMAGE_VECTOR_DIM` entries
    async fn encode_image(&self, source: &str) -> CatalogResult<Vec<f32>>;
}

/// Reject encoder output whose length differs from the collection schema
pub fn ensure_dimension(values: Vec<f32>, expected: u64, what: &str) -> CatalogResult<Vec<f32>> {
    if values.len() as u64 != expected {
        return Err(CatalogError::Encoding(format!(
            "{} encoder returned {} values, expected {}",
            what,
            values.len(),
            expected
        )));
    }
    Ok(values)
}
