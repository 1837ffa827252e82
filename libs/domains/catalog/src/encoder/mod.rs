mod config;
mod provider;
mod text;
mod vision;

#[cfg(test)]
mod testing;

pub use config::{DEFAULT_MAX_IMAGE_BYTES, EncoderConfig};
pub use provider::{ImageEncoder, TextEncoder, ensure_dimension};
pub use text::TeiTextEncoder;
pub use vision::{IMAGE_INPUT_SIZE, InferenceImageEncoder, preprocess_image};

#[cfg(test)]
pub use provider::{MockImageEncoder, MockTextEncoder};
