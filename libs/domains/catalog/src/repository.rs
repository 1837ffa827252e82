use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    CollectionSchema, DistanceMetric, PointRecord, ProductPoint, RelatedQuery, SearchResult,
};

/// Storage operations for product points
///
/// Abstracts the vector database. Every call is a potential network round trip.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductPointRepository: Send + Sync {
    /// Drop `collection` if it exists and create it again with `schema`
    async fn recreate_collection(
        &self,
        collection: &str,
        schema: &CollectionSchema,
    ) -> CatalogResult<()>;

    /// Insert or replace a point, keyed by its id
    async fn upsert_point(&self, collection: &str, point: ProductPoint) -> CatalogResult<()>;

    /// Filtered fetch of at most one point whose payload `product_id` matches
    async fn find_by_product_id(
        &self,
        collection: &str,
        product_id: &str,
    ) -> CatalogResult<Option<PointRecord>>;

    /// Nearest neighbours in one named space, restricted to one category
    async fn search(
        &self,
        collection: &str,
        query: RelatedQuery,
    ) -> CatalogResult<Vec<SearchResult>>;

    /// Delete a point by id; deleting an absent point is not an error
    async fn delete_point(&self, collection: &str, id: Uuid) -> CatalogResult<()>;
}

#[derive(Debug, Clone)]
struct StoredCollection {
    schema: CollectionSchema,
    points: BTreeMap<Uuid, ProductPoint>,
}

/// In-memory implementation of ProductPointRepository (for development/testing)
///
/// Mirrors the store semantics the service relies on: named spaces with fixed
/// dimensions, exact-match category filtering, Euclidean distance ranked
/// ascending and cosine similarity ranked descending.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProductPointRepository {
    collections: Arc<RwLock<HashMap<String, StoredCollection>>>,
}

impl InMemoryProductPointRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of points in `collection`, `None` if it does not exist
    pub async fn point_count(&self, collection: &str) -> Option<usize> {
        let collections = self.collections.read().await;
        collections.get(collection).map(|c| c.points.len())
    }
}

fn missing_collection(collection: &str) -> String {
    format!("Collection '{}' not found", collection)
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl ProductPointRepository for InMemoryProductPointRepository {
    async fn recreate_collection(
        &self,
        collection: &str,
        schema: &CollectionSchema,
    ) -> CatalogResult<()> {
        let mut collections = self.collections.write().await;
        collections.insert(
            collection.to_string(),
            StoredCollection {
                schema: schema.clone(),
                points: BTreeMap::new(),
            },
        );

        tracing::info!(collection, "Recreated in-memory collection");
        Ok(())
    }

    async fn upsert_point(&self, collection: &str, point: ProductPoint) -> CatalogResult<()> {
        let mut collections = self.collections.write().await;
        let stored = collections
            .get_mut(collection)
            .ok_or_else(|| CatalogError::Store(missing_collection(collection)))?;

        for config in &stored.schema.spaces {
            let len = point.vectors.get(config.space).len() as u64;
            if len != config.dimension {
                return Err(CatalogError::Store(format!(
                    "Vector dimension error: '{}' expected dim: {}, got {}",
                    config.space, config.dimension, len
                )));
            }
        }

        stored.points.insert(point.id, point);
        Ok(())
    }

    async fn find_by_product_id(
        &self,
        collection: &str,
        product_id: &str,
    ) -> CatalogResult<Option<PointRecord>> {
        let collections = self.collections.read().await;
        let stored = collections
            .get(collection)
            .ok_or_else(|| CatalogError::Store(missing_collection(collection)))?;

        Ok(stored
            .points
            .values()
            .find(|p| p.payload.product_id == product_id)
            .map(|p| PointRecord {
                id: p.id,
                vectors: p.vectors.clone().into_named(),
                payload: p.payload.clone(),
            }))
    }

    async fn search(
        &self,
        collection: &str,
        query: RelatedQuery,
    ) -> CatalogResult<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let stored = collections
            .get(collection)
            .ok_or_else(|| CatalogError::Search(missing_collection(collection)))?;

        let config = stored.schema.space(query.space).ok_or_else(|| {
            CatalogError::Search(format!("Vector '{}' is not configured", query.space))
        })?;
        if query.vector.len() as u64 != config.dimension {
            return Err(CatalogError::Search(format!(
                "Query vector for '{}' has {} values, expected {}",
                query.space,
                query.vector.len(),
                config.dimension
            )));
        }

        let mut scored: Vec<(f32, &ProductPoint)> = stored
            .points
            .values()
            .filter(|p| p.payload.category_id == query.category_id)
            .filter(|p| Some(p.id) != query.exclude_id)
            .map(|p| {
                let candidate = p.vectors.get(query.space);
                let score = match config.distance {
                    DistanceMetric::Euclidean => euclidean(&query.vector, candidate),
                    DistanceMetric::Cosine => cosine(&query.vector, candidate),
                };
                (score, p)
            })
            .collect();

        match config.distance {
            DistanceMetric::Euclidean => scored.sort_by(|a, b| a.0.total_cmp(&b.0)),
            DistanceMetric::Cosine => scored.sort_by(|a, b| b.0.total_cmp(&a.0)),
        }

        scored
            .into_iter()
            .take(query.limit as usize)
            .map(|(score, p)| {
                let payload = serde_json::to_value(&p.payload)
                    .map_err(|e| CatalogError::Internal(format!("JSON error: {}", e)))?;
                Ok(SearchResult {
                    id: p.id,
                    score,
                    payload: Some(payload),
                })
            })
            .collect()
    }

    async fn delete_point(&self, collection: &str, id: Uuid) -> CatalogResult<()> {
        let mut collections = self.collections.write().await;
        let stored = collections
            .get_mut(collection)
            .ok_or_else(|| CatalogError::Store(missing_collection(collection)))?;

        stored.points.remove(&id);
        Ok(())
    }
}
