//! Image encoder: fetch → decode → resize/normalize → remote inference.
//!
//! The classifier itself runs on an Open Inference Protocol (KServe v2) server;
//! this side only prepares the `[1, 3, 224, 224]` FP32 input tensor.

use std::time::Duration;

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EncoderConfig, ImageEncoder, ensure_dimension};
use crate::error::{CatalogError, CatalogResult};
use crate::models::IMAGE_VECTOR_DIM;

/// Side length of the square model input
pub const IMAGE_INPUT_SIZE: u32 = 224;

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decode `bytes` to RGB, resize to 224×224 and lay it out as a normalized CHW tensor.
pub fn preprocess_image(bytes: &[u8]) -> CatalogResult<Vec<f32>> {
    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    let resized = imageops::resize(&rgb, IMAGE_INPUT_SIZE, IMAGE_INPUT_SIZE, FilterType::Triangle);

    let plane = (IMAGE_INPUT_SIZE * IMAGE_INPUT_SIZE) as usize;
    let mut tensor = vec![0.0f32; 3 * plane];

    for (x, y, pixel) in resized.enumerate_pixels() {
        let offset = (y * IMAGE_INPUT_SIZE + x) as usize;
        for channel in 0..3 {
            let value = f32::from(pixel[channel]) / 255.0;
            tensor[channel * plane + offset] =
                (value - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel];
        }
    }

    Ok(tensor)
}

/// Image encoder backed by a KServe v2 inference endpoint
pub struct InferenceImageEncoder {
    client: Client,
    base_url: String,
    model: String,
    input_name: String,
    max_image_bytes: u64,
}

impl InferenceImageEncoder {
    pub fn new(config: &EncoderConfig) -> CatalogResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.image_url.trim_end_matches('/').to_string(),
            model: config.image_model.clone(),
            input_name: config.image_input.clone(),
            max_image_bytes: config.max_image_bytes,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v2/models/{}/infer", self.base_url, self.model)
    }

    /// Download the image body, refusing anything over `max_image_bytes`
    async fn fetch(&self, source: &str) -> CatalogResult<Vec<u8>> {
        let mut response = self
            .client
            .get(source)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| CatalogError::Encoding(format!("Failed to fetch image {}: {}", source, e)))?;

        if response
            .content_length()
            .is_some_and(|length| length > self.max_image_bytes)
        {
            return Err(self.too_large(source));
        }

        // Content-Length is optional, so the streamed body is capped as well
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| CatalogError::Encoding(format!("Failed to read image {}: {}", source, e)))?
        {
            if (bytes.len() + chunk.len()) as u64 > self.max_image_bytes {
                return Err(self.too_large(source));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(bytes)
    }

    fn too_large(&self, source: &str) -> CatalogError {
        CatalogError::Encoding(format!(
            "Image {} exceeds the {} byte limit",
            source, self.max_image_bytes
        ))
    }

    async fn infer(&self, tensor: Vec<f32>) -> CatalogResult<Vec<f32>> {
        let size = u64::from(IMAGE_INPUT_SIZE);
        let request = InferRequest {
            inputs: vec![InferInput {
                name: &self.input_name,
                shape: [1, 3, size, size],
                datatype: "FP32",
                data: tensor,
            }],
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
                "Image encoder error ({}): {}",
                status, error_text
            )));
        }

        let body: InferResponse = response.json().await?;
        body.outputs
            .into_iter()
            .next()
            .map(|output| output.data)
            .ok_or_else(|| CatalogError::Encoding("Image encoder returned no outputs".to_string()))
    }
}

#[derive(Debug, Serialize)]
struct InferRequest<'a> {
    inputs: Vec<InferInput<'a>>,
}

#[derive(Debug, Serialize)]
struct InferInput<'a> {
    name: &'a str,
    shape: [u64; 4],
    datatype: &'static str,
    data: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct InferResponse {
    outputs: Vec<InferOutput>,
}

#[derive(Debug, Deserialize)]
struct InferOutput {
    data: Vec<f32>,
}

#[async_trait]
impl ImageEncoder for InferenceImageEncoder {
    async fn encode_image(&self, source: &str) -> CatalogResult<Vec<f32>> {
        let bytes = self.fetch(source).await?;
        debug!(source, bytes = bytes.len(), "Fetched product image");

        let tensor = tokio::task::spawn_blocking(move || preprocess_image(&bytes))
            .await
            .map_err(|e| CatalogError::Internal(format!("Image preprocessing panicked: {}", e)))??;

        let logits = self.infer(tensor).await?;
        ensure_dimension(logits, IMAGE_VECTOR_DIM, "Image")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::testing::serve;
    use axum::{
        Json, Router,
        http::{StatusCode, header},
        routing::{get, post},
    };
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    const INFER_PATH: &str = "/v2/models/vit_base_patch16_224/infer";

    /// Serves `/p1.png` and answers inference with `logits` values
    async fn inference_server(image: Vec<u8>, logits: usize) -> String {
        let app = Router::new()
            .route(
                "/p1.png",
                get(move || {
                    let image = image.clone();
                    async move { ([(header::CONTENT_TYPE, "image/png")], image) }
                }),
            )
            .route(
                INFER_PATH,
                post(move |Json(body): Json<serde_json::Value>| async move {
                    let input = &body["inputs"][0];
                    let values = input["data"].as_array().map_or(0, Vec::len);
                    let expected_shape = serde_json::json!([1, 3, 224, 224]);
                    if input["shape"] != expected_shape || values != 3 * 224 * 224 {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(serde_json::json!({ "error": "bad input tensor" })),
                        );
                    }
                    (
                        StatusCode::OK,
                        Json(serde_json::json!({
                            "model_name": "vit_base_patch16_224",
                            "outputs": [{
                                "name": "output",
                                "shape": [1, logits],
                                "datatype": "FP32",
                                "data": vec![0.125f32; logits],
                            }],
                        })),
                    )
                }),
            );
        serve(app).await
    }

    fn encoder_for(base_url: &str) -> InferenceImageEncoder {
        let config = EncoderConfig::new(base_url.to_string(), base_url.to_string()).with_timeout(5);
        InferenceImageEncoder::new(&config).unwrap()
    }

    fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_preprocess_produces_chw_tensor() {
        let tensor = preprocess_image(&png_bytes(40, 17, [255, 0, 0])).unwrap();
        let plane = (IMAGE_INPUT_SIZE * IMAGE_INPUT_SIZE) as usize;
        assert_eq!(tensor.len(), 3 * plane);

        let red = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        let green = (0.0 - IMAGENET_MEAN[1]) / IMAGENET_STD[1];
        let blue = (0.0 - IMAGENET_MEAN[2]) / IMAGENET_STD[2];

        assert!((tensor[0] - red).abs() < 0.02);
        assert!((tensor[plane] - green).abs() < 0.02);
        assert!((tensor[2 * plane + plane - 1] - blue).abs() < 0.02);
    }

    #[test]
    fn test_preprocess_rejects_non_image_bytes() {
        let err = preprocess_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, CatalogError::Encoding(_)));
    }

    #[test]
    fn test_infer_request_shape() {
        let request = InferRequest {
            inputs: vec![InferInput {
                name: "input",
                shape: [1, 3, 224, 224],
                datatype: "FP32",
                data: vec![0.5],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["inputs"][0]["shape"], serde_json::json!([1, 3, 224, 224]));
        assert_eq!(json["inputs"][0]["datatype"], "FP32");
    }

    #[test]
    fn test_endpoint_includes_model() {
        let config = EncoderConfig::new(
            "http://tei:8080".to_string(),
            "http://triton:8000/".to_string(),
        );
        let encoder = InferenceImageEncoder::new(&config).unwrap();
        assert_eq!(
            encoder.endpoint(),
            "http://triton:8000/v2/models/vit_base_patch16_224/infer"
        );
    }

    #[tokio::test]
    async fn test_unreachable_image_is_an_encoding_error() {
        let config = EncoderConfig::new(
            "http://127.0.0.1:9".to_string(),
            "http://127.0.0.1:9".to_string(),
        )
        .with_timeout(2);
        let encoder = InferenceImageEncoder::new(&config).unwrap();

        let err = encoder
            .encode_image("http://127.0.0.1:9/p1.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Encoding(_)));
    }

    #[tokio::test]
    async fn test_encode_image_returns_classifier_logits() {
        let base = inference_server(png_bytes(32, 32, [0, 128, 255]), 1000).await;
        let encoder = encoder_for(&base);

        let logits = encoder
            .encode_image(&format!("{}/p1.png", base))
            .await
            .unwrap();
        assert_eq!(logits.len(), 1000);
        assert!(logits.iter().all(|v| *v == 0.125));
    }

    #[tokio::test]
    async fn test_encode_image_rejects_wrong_logit_count() {
        let base = inference_server(png_bytes(8, 8, [10, 10, 10]), 10).await;
        let encoder = encoder_for(&base);

        let err = encoder
            .encode_image(&format!("{}/p1.png", base))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Encoding(_)));
        assert!(err.to_string().contains("returned 10 values"));
    }

    #[tokio::test]
    async fn test_image_over_declared_limit_is_rejected() {
        let base = inference_server(vec![0u8; 4096], 1000).await;
        let config = EncoderConfig::new(base.clone(), base.clone()).with_max_image_bytes(1024);
        let encoder = InferenceImageEncoder::new(&config).unwrap();

        let err = encoder
            .encode_image(&format!("{}/p1.png", base))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Encoding(_)));
        assert!(err.to_string().contains("1024 byte limit"));
    }

    #[tokio::test]
    async fn test_chunked_image_over_limit_is_rejected() {
        // Chunked transfer carries no Content-Length, so only the streaming check applies
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;

            let chunk = vec![b'x'; 800];
            let mut response =
                b"HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nTransfer-Encoding: chunked\r\n\r\n"
                    .to_vec();
            for _ in 0..3 {
                response.extend_from_slice(b"320\r\n");
                response.extend_from_slice(&chunk);
                response.extend_from_slice(b"\r\n");
            }
            response.extend_from_slice(b"0\r\n\r\n");
            let _ = socket.write_all(&response).await;
        });

        let base = format!("http://{}", addr);
        let config = EncoderConfig::new(base.clone(), base.clone()).with_max_image_bytes(1024);
        let encoder = InferenceImageEncoder::new(&config).unwrap();

        let err = encoder
            .encode_image(&format!("{}/p1.png", base))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Encoding(_)));
        assert!(err.to_string().contains("1024 byte limit"));
    }
}
