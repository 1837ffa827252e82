//! Catalog API
//!
//! HTTP service that indexes products in Qdrant with a text and an image
//! embedding, and serves related-product lookups.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   ↓ (JSON over HTTP, /qdrant/...)
//! domain_catalog::handlers
//!   ↓
//! CatalogService
//!   ↓
//! ┌──────────────────┬──────────────────────────────┐
//! │ QdrantRepository │ TeiTextEncoder / Inference... │
//! └──────────────────┴──────────────────────────────┘
//!   ↓                       ↓
//! Qdrant              model servers
//! ```
//!
//! ## Modules
//!
//! - `config`: environment-driven configuration
//! - `openapi`: combined OpenAPI document
//! - `server`: router assembly, startup and graceful shutdown

pub mod config;
pub mod openapi;
pub mod server;

pub use server::run;
