//! Configuration for Catalog API

use core_config::{FromEnv, server::ServerConfig};
use domain_catalog::{EncoderConfig, QdrantConfig};
use eyre::WrapErr;

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    pub qdrant: QdrantConfig,
    pub encoders: EncoderConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            environment: Environment::from_env(),
            server: ServerConfig::from_env().wrap_err("Invalid server configuration")?,
            qdrant: QdrantConfig::from_env().wrap_err("Invalid Qdrant configuration")?,
            encoders: EncoderConfig::from_env().wrap_err("Invalid encoder configuration")?,
        })
    }
}
