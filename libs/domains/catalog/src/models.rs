use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Output length of the text encoder (all-MiniLM-L6-v2 family)
pub const NAME_VECTOR_DIM: u64 = 384;

/// Output length of the image encoder (ImageNet-1k classifier logits)
pub const IMAGE_VECTOR_DIM: u64 = 1000;

/// Default number of related products returned by a search
pub const DEFAULT_RELATED_LIMIT: u64 = 10;

/// Upper bound accepted for a related-products `limit`
pub const MAX_RELATED_LIMIT: u64 = 1000;

/// Distance metric for a named vector space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DistanceMetric {
    Euclidean,
    Cosine,
}

/// One of the two independently addressable embedding spaces of a product point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VectorSpace {
    /// Sentence embedding of the product name
    Name,
    /// Classifier features of the product image
    Image,
}

impl VectorSpace {
    pub const ALL: [VectorSpace; 2] = [VectorSpace::Name, VectorSpace::Image];

    /// Vector name as stored in the collection
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorSpace::Name => "name",
            VectorSpace::Image => "image",
        }
    }

    pub fn dimension(&self) -> u64 {
        match self {
            VectorSpace::Name => NAME_VECTOR_DIM,
            VectorSpace::Image => IMAGE_VECTOR_DIM,
        }
    }

    pub fn distance(&self) -> DistanceMetric {
        match self {
            VectorSpace::Name => DistanceMetric::Euclidean,
            VectorSpace::Image => DistanceMetric::Cosine,
        }
    }

    pub fn config(&self) -> VectorSpaceConfig {
        VectorSpaceConfig {
            space: *self,
            dimension: self.dimension(),
            distance: self.distance(),
        }
    }
}

impl fmt::Display for VectorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VectorSpace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(VectorSpace::Name),
            "image" => Ok(VectorSpace::Image),
            other => Err(format!("unknown vector space '{}'", other)),
        }
    }
}

/// Dimension and metric of a single named vector space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VectorSpaceConfig {
    pub space: VectorSpace,
    pub dimension: u64,
    pub distance: DistanceMetric,
}

/// Layout of a product collection, fixed at creation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CollectionSchema {
    pub spaces: Vec<VectorSpaceConfig>,
}

impl CollectionSchema {
    /// `name` (384, Euclidean) and `image` (1000, Cosine)
    pub fn product_catalog() -> Self {
        Self {
            spaces: VectorSpace::ALL.iter().map(VectorSpace::config).collect(),
        }
    }

    pub fn space(&self, space: VectorSpace) -> Option<&VectorSpaceConfig> {
        self.spaces.iter().find(|c| c.space == space)
    }
}

/// A product record submitted for indexing
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct Product {
    #[validate(length(min = 1, message = "product_id must not be empty"))]
    pub product_id: String,
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    /// Image URI, dereferenced by the image encoder
    #[validate(url(message = "image must be a valid URL"))]
    pub image: String,
    #[validate(range(min = 0.0))]
    pub average_rating: f64,
    #[validate(range(min = 0))]
    pub total_purchases: i64,
    #[validate(range(min = 0))]
    pub total_reviews: i64,
    pub category_id: i64,
    /// Accepted on input, never persisted in the point payload
    pub description: String,
}

/// Scalar fields stored alongside the vectors of a product point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductPayload {
    pub product_id: String,
    pub name: String,
    pub average_rating: f64,
    pub total_purchases: i64,
    pub total_reviews: i64,
    pub category_id: i64,
}

impl From<&Product> for ProductPayload {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.product_id.clone(),
            name: product.name.clone(),
            average_rating: product.average_rating,
            total_purchases: product.total_purchases,
            total_reviews: product.total_reviews,
            category_id: product.category_id,
        }
    }
}

/// Both embeddings of a product; a point is never written with only one of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductVectors {
    pub name: Vec<f32>,
    pub image: Vec<f32>,
}

impl ProductVectors {
    pub fn get(&self, space: VectorSpace) -> &[f32] {
        match space {
            VectorSpace::Name => &self.name,
            VectorSpace::Image => &self.image,
        }
    }

    /// Keyed by stored vector name
    pub fn into_named(self) -> HashMap<String, Vec<f32>> {
        HashMap::from([
            (VectorSpace::Name.as_str().to_string(), self.name),
            (VectorSpace::Image.as_str().to_string(), self.image),
        ])
    }
}

/// A point ready to be upserted
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPoint {
    pub id: Uuid,
    pub vectors: ProductVectors,
    pub payload: ProductPayload,
}

/// A stored point as returned by lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PointRecord {
    pub id: Uuid,
    /// Stored vectors keyed by space name
    pub vectors: HashMap<String, Vec<f32>>,
    pub payload: ProductPayload,
}

impl PointRecord {
    /// The stored vector for `space`, or `None` when absent or empty
    pub fn vector(&self, space: VectorSpace) -> Option<&[f32]> {
        self.vectors
            .get(space.as_str())
            .map(Vec::as_slice)
            .filter(|v| !v.is_empty())
    }
}

/// A ranked neighbour, passed through from the vector store unmodified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchResult {
    pub id: Uuid,
    pub score: f32,
    pub payload: Option<serde_json::Value>,
}

impl SearchResult {
    pub fn product_id(&self) -> Option<&str> {
        self.payload.as_ref()?.get("product_id")?.as_str()
    }

    pub fn category_id(&self) -> Option<i64> {
        self.payload.as_ref()?.get("category_id")?.as_i64()
    }
}

/// Nearest-neighbour query scoped to one category
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedQuery {
    pub space: VectorSpace,
    pub vector: Vec<f32>,
    pub category_id: i64,
    pub limit: u64,
    /// Point to leave out of the results (the seed itself)
    pub exclude_id: Option<Uuid>,
}

/// Acknowledgement of a successful upsert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpsertAck {
    pub id: Uuid,
    pub product_id: String,
    pub status: String,
}

/// Body of the related-products endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct SearchRelatedRequest {
    #[validate(
        required(message = "product_id is required"),
        length(min = 1, message = "product_id must not be empty")
    )]
    pub product_id: Option<String>,
    #[serde(default = "default_related_limit")]
    #[validate(range(min = 1, max = 1000))]
    pub limit: u64,
    /// Leave the seed product out of its own results
    #[serde(default)]
    pub exclude_seed: bool,
}

fn default_related_limit() -> u64 {
    DEFAULT_RELATED_LIMIT
}
