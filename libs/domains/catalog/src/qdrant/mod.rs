mod config;
mod repository;

pub use config::QdrantConfig;
pub use repository::QdrantRepository;
