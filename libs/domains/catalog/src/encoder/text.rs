use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{EncoderConfig, TextEncoder, ensure_dimension};
use crate::error::{CatalogError, CatalogResult};
use crate::models::NAME_VECTOR_DIM;

/// Text encoder backed by a text-embeddings-inference server
pub struct TeiTextEncoder {
    client: Client,
    base_url: String,
}

impl TeiTextEncoder {
    pub fn new(config: &EncoderConfig) -> CatalogResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.text_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/embed", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: Vec<&'a str>,
    // sentence-transformers returns raw (unnormalized) embeddings by default
    normalize: bool,
    truncate: bool,
}

#[async_trait]
impl TextEncoder for TeiTextEncoder {
    async fn encode_text(&self, text: &str) -> CatalogResult<Vec<f32>> {
        let request = EmbedRequest {
            inputs: vec![text],
            normalize: false,
            truncate: true,
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(CatalogError::Encoding(format!(
                "Text encoder error ({}): {}",
                status, error_text
            )));
        }

        let embeddings: Vec<Vec<f32>> = response.json().await?;
        let values = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::Encoding("No embedding returned".to_string()))?;

        ensure_dimension(values, NAME_VECTOR_DIM, "Text")
    }
}
