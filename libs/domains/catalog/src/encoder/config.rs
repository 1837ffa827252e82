use core_config::{ConfigError, FromEnv, env_or_default, env_parse};

/// Endpoints and limits for the two inference services
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Base URL of a text-embeddings-inference server hosting all-MiniLM-L6-v2
    pub text_url: String,
    /// Base URL of an Open Inference Protocol (KServe v2) server hosting the image classifier
    pub image_url: String,
    /// Model name on the image inference server
    pub image_model: String,
    /// Input tensor name expected by the image model
    pub image_input: String,
    /// Per-request timeout for image fetches and inference calls
    pub timeout_secs: u64,
    /// Largest product image body accepted from a fetch
    pub max_image_bytes: u64,
}

/// 10 MiB
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

impl EncoderConfig {
    pub fn new(text_url: String, image_url: String) -> Self {
        Self {
            text_url,
            image_url,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_max_image_bytes(mut self, bytes: u64) -> Self {
        self.max_image_bytes = bytes;
        self
    }
}

impl FromEnv for EncoderConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            text_url: env_or_default("TEXT_ENCODER_URL", "http://localhost:8080"),
            image_url: env_or_default("IMAGE_ENCODER_URL", "http://localhost:8085"),
            image_model: env_or_default("IMAGE_ENCODER_MODEL", "vit_base_patch16_224"),
            image_input: env_or_default("IMAGE_ENCODER_INPUT", "input"),
            timeout_secs: env_parse("ENCODER_TIMEOUT_SECS", 30)?,
            max_image_bytes: env_parse("IMAGE_MAX_BYTES", DEFAULT_MAX_IMAGE_BYTES)?,
        })
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            text_url: "http://localhost:8080".to_string(),
            image_url: "http://localhost:8085".to_string(),
            image_model: "vit_base_patch16_224".to_string(),
            image_input: "input".to_string(),
            timeout_secs: 30,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}
