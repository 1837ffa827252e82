//! Product Catalog Domain Library
//!
//! Indexes products as points with two named vectors in Qdrant and answers
//! "related products" queries within the seed product's category.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  CatalogService  │  ← upsert pipeline, lookup, related search
//! └────────┬─────────┘
//!          │
//! ┌────────▼──────────────┐   ┌──────────────────────────┐
//! │ ProductPointRepository│   │ TextEncoder / ImageEncoder│
//! │   (trait)             │   │   (traits)                │
//! └────────┬──────────────┘   └────────┬─────────────────┘
//!          │                           │
//! ┌────────▼──────────────┐   ┌────────▼─────────────────┐
//! │ QdrantRepository      │   │ TeiTextEncoder            │
//! │ InMemory...Repository │   │ InferenceImageEncoder     │
//! └───────────────────────┘   └──────────────────────────┘
//! ```
//!
//! # Vector spaces
//!
//! | Name    | Dimension | Distance  | Source                     |
//! |---------|-----------|-----------|----------------------------|
//! | `name`  | 384       | Euclidean | sentence embedding of name |
//! | `image` | 1000      | Cosine    | image classifier logits    |
//!
//! Point ids are UUIDv5 of the product id, so re-indexing a product replaces
//! its point.
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_catalog::{
//!     CatalogService, EncoderConfig, InferenceImageEncoder, QdrantConfig, QdrantRepository,
//!     TeiTextEncoder,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = QdrantRepository::new(QdrantConfig::default())?;
//! let encoders = EncoderConfig::default();
//! let service = CatalogService::new(
//!     repository,
//!     Arc::new(TeiTextEncoder::new(&encoders)?),
//!     Arc::new(InferenceImageEncoder::new(&encoders)?),
//! );
//!
//! service.create_collection("products").await?;
//! let _related = service.search_related_by_name("products", "sku-1", 10, false).await?;
//! # Ok(())
//! # }
//! ```

pub mod encoder;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod identifier;
pub mod models;
pub mod qdrant;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use encoder::{
    EncoderConfig, ImageEncoder, InferenceImageEncoder, TeiTextEncoder, TextEncoder,
};
pub use error::{CatalogError, CatalogResult, ErrorResponse};
pub use handlers::CatalogApiDoc;
pub use identifier::point_id;
pub use models::{
    CollectionSchema, DistanceMetric, PointRecord, Product, ProductPayload, ProductPoint,
    ProductVectors, RelatedQuery, SearchRelatedRequest, SearchResult, UpsertAck, VectorSpace,
    VectorSpaceConfig,
};
pub use qdrant::{QdrantConfig, QdrantRepository};
pub use repository::{InMemoryProductPointRepository, ProductPointRepository};
pub use service::{CatalogService, validate_collection_name};
