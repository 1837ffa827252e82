use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    self, Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointId,
    PointStruct, ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder,
    Value as QdrantValue, VectorParamsBuilder, VectorsConfigBuilder, vector_output,
};
use qdrant_client::{Qdrant, QdrantError};
use uuid::Uuid;

use super::QdrantConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    CollectionSchema, DistanceMetric, PointRecord, ProductPayload, ProductPoint, RelatedQuery,
    SearchResult,
};
use crate::repository::ProductPointRepository;

/// Qdrant-backed implementation of ProductPointRepository
pub struct QdrantRepository {
    client: Qdrant,
    timeout: Duration,
}

impl QdrantRepository {
    pub fn new(config: QdrantConfig) -> CatalogResult<Self> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(api_key) = config.api_key.clone() {
            builder = builder.api_key(api_key);
        }

        builder = builder.timeout(config.timeout());

        let client = builder
            .build()
            .map_err(|e| CatalogError::Config(format!("Failed to build Qdrant client: {}", e)))?;

        tracing::info!(url = %config.url, timeout_secs = config.timeout_secs, "Qdrant client ready");

        Ok(Self {
            client,
            timeout: config.timeout(),
        })
    }

    pub fn from_client(client: Qdrant, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Run one store call under the configured deadline.
    ///
    /// Store failures are reported through `on_error`; an expired deadline is
    /// always `CatalogError::Timeout`.
    async fn bounded<T, F>(
        &self,
        operation: &str,
        on_error: fn(String) -> CatalogError,
        call: F,
    ) -> CatalogResult<T>
    where
        F: Future<Output = Result<T, QdrantError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(|e| on_error(e.to_string())),
            Err(_) => Err(CatalogError::Timeout(format!(
                "{} did not complete within {:?}",
                operation, self.timeout
            ))),
        }
    }

    fn to_qdrant_distance(metric: DistanceMetric) -> Distance {
        match metric {
            DistanceMetric::Euclidean => Distance::Euclid,
            DistanceMetric::Cosine => Distance::Cosine,
        }
    }

    fn uuid_to_point_id(id: Uuid) -> PointId {
        PointId::from(id.to_string())
    }

    fn point_id_to_uuid(point_id: &PointId) -> CatalogResult<Uuid> {
        match &point_id.point_id_options {
            Some(qdrant::point_id::PointIdOptions::Uuid(uuid_str)) => Uuid::parse_str(uuid_str)
                .map_err(|e| CatalogError::Internal(format!("Invalid UUID: {}", e))),
            Some(qdrant::point_id::PointIdOptions::Num(num)) => Ok(Uuid::from_u128(*num as u128)),
            None => Err(CatalogError::Internal("Missing point ID".to_string())),
        }
    }

    fn required_id(point_id: Option<&PointId>) -> CatalogResult<Uuid> {
        point_id
            .map(Self::point_id_to_uuid)
            .transpose()?
            .ok_or_else(|| CatalogError::Internal("Missing point ID".to_string()))
    }

    fn payload_to_qdrant(payload: &ProductPayload) -> CatalogResult<HashMap<String, QdrantValue>> {
        let value = serde_json::to_value(payload)
            .map_err(|e| CatalogError::Internal(format!("JSON error: {}", e)))?;

        let mut result = HashMap::new();
        if let serde_json::Value::Object(map) = value {
            for (key, val) in map {
                if let Some(qdrant_val) = json_to_qdrant_value(val) {
                    result.insert(key, qdrant_val);
                }
            }
        }

        Ok(result)
    }

    fn qdrant_to_payload(payload: HashMap<String, QdrantValue>) -> Option<serde_json::Value> {
        if payload.is_empty() {
            return None;
        }

        let mut map = serde_json::Map::new();
        for (key, val) in payload {
            if let Some(json_val) = qdrant_value_to_json(val) {
                map.insert(key, json_val);
            }
        }

        Some(serde_json::Value::Object(map))
    }

    /// Category restriction plus optional exclusion of one point
    fn related_filter(query: &RelatedQuery) -> Filter {
        let mut filter = Filter::must([Condition::matches("category_id", query.category_id)]);
        if let Some(id) = query.exclude_id {
            filter
                .must_not
                .push(Condition::has_id([Self::uuid_to_point_id(id)]));
        }
        filter
    }

    /// Dense named vectors of a retrieved point
    fn extract_named_vectors(vectors: Option<qdrant::VectorsOutput>) -> HashMap<String, Vec<f32>> {
        match vectors {
            Some(qdrant::VectorsOutput {
                vectors_options: Some(qdrant::vectors_output::VectorsOptions::Vectors(map)),
            }) => map
                .vectors
                .into_iter()
                .filter_map(|(name, v)| match v.into_vector() {
                    vector_output::Vector::Dense(dense) => Some((name, dense.data)),
                    _ => None,
                })
                .collect(),
            _ => HashMap::new(),
        }
    }
}

fn json_to_qdrant_value(val: serde_json::Value) -> Option<QdrantValue> {
    match val {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(QdrantValue::from(b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(QdrantValue::from(i))
            } else {
                n.as_f64().map(QdrantValue::from)
            }
        }
        serde_json::Value::String(s) => Some(QdrantValue::from(s)),
        _ => Some(QdrantValue::from(val.to_string())),
    }
}

fn qdrant_value_to_json(val: QdrantValue) -> Option<serde_json::Value> {
    use qdrant::value::Kind;

    match val.kind {
        Some(Kind::NullValue(_)) => Some(serde_json::Value::Null),
        Some(Kind::BoolValue(b)) => Some(serde_json::Value::Bool(b)),
        Some(Kind::IntegerValue(i)) => Some(serde_json::Value::Number(i.into())),
        Some(Kind::DoubleValue(f)) => {
            serde_json::Number::from_f64(f).map(serde_json::Value::Number)
        }
        Some(Kind::StringValue(s)) => Some(serde_json::Value::String(s)),
        _ => None,
    }
}

#[async_trait]
impl ProductPointRepository for QdrantRepository {
    async fn recreate_collection(
        &self,
        collection: &str,
        schema: &CollectionSchema,
    ) -> CatalogResult<()> {
        let exists = self
            .bounded(
                "collection_exists",
                CatalogError::Schema,
                self.client.collection_exists(collection),
            )
            .await?;

        if exists {
            self.bounded(
                "delete_collection",
                CatalogError::Schema,
                self.client.delete_collection(collection),
            )
            .await?;
            tracing::debug!(collection, "Dropped existing collection");
        }

        let mut vectors_config = VectorsConfigBuilder::default();
        for space in &schema.spaces {
            vectors_config.add_named_vector_params(
                space.space.as_str(),
                VectorParamsBuilder::new(space.dimension, Self::to_qdrant_distance(space.distance)),
            );
        }

        self.bounded(
            "create_collection",
            CatalogError::Schema,
            self.client
                .create_collection(CreateCollectionBuilder::new(collection).vectors_config(vectors_config)),
        )
        .await?;

        tracing::info!(collection, spaces = schema.spaces.len(), "Created collection");
        Ok(())
    }

    async fn upsert_point(&self, collection: &str, point: ProductPoint) -> CatalogResult<()> {
        let payload = Self::payload_to_qdrant(&point.payload)?;
        let point = PointStruct::new(
            Self::uuid_to_point_id(point.id),
            point.vectors.into_named(),
            payload,
        );

        self.bounded(
            "upsert_points",
            CatalogError::Store,
            self.client
                .upsert_points(UpsertPointsBuilder::new(collection, vec![point]).wait(true)),
        )
        .await?;

        Ok(())
    }

    async fn find_by_product_id(
        &self,
        collection: &str,
        product_id: &str,
    ) -> CatalogResult<Option<PointRecord>> {
        let builder = ScrollPointsBuilder::new(collection)
            .filter(Filter::must([Condition::matches(
                "product_id",
                product_id.to_string(),
            )]))
            .limit(1)
            .with_payload(true)
            .with_vectors(true);

        let response = self
            .bounded("scroll", CatalogError::Store, self.client.scroll(builder))
            .await?;

        let Some(point) = response.result.into_iter().next() else {
            return Ok(None);
        };

        let id = Self::required_id(point.id.as_ref())?;
        let vectors = Self::extract_named_vectors(point.vectors);
        let payload = Self::qdrant_to_payload(point.payload).ok_or_else(|| {
            CatalogError::Internal(format!("Point {} has no payload", id))
        })?;
        let payload: ProductPayload = serde_json::from_value(payload).map_err(|e| {
            CatalogError::Internal(format!("Point {} has a malformed payload: {}", id, e))
        })?;

        Ok(Some(PointRecord {
            id,
            vectors,
            payload,
        }))
    }

    async fn search(
        &self,
        collection: &str,
        query: RelatedQuery,
    ) -> CatalogResult<Vec<SearchResult>> {
        let filter = Self::related_filter(&query);
        let builder = SearchPointsBuilder::new(collection, query.vector, query.limit)
            .vector_name(query.space.as_str())
            .filter(filter)
            .with_payload(true);

        let response = self
            .bounded(
                "search_points",
                CatalogError::Search,
                self.client.search_points(builder),
            )
            .await?;

        response
            .result
            .into_iter()
            .map(|point| {
                Ok(SearchResult {
                    id: Self::required_id(point.id.as_ref())?,
                    score: point.score,
                    payload: Self::qdrant_to_payload(point.payload),
                })
            })
            .collect()
    }

    async fn delete_point(&self, collection: &str, id: Uuid) -> CatalogResult<()> {
        let builder = DeletePointsBuilder::new(collection)
            .points(vec![Self::uuid_to_point_id(id)])
            .wait(true);

        self.bounded(
            "delete_points",
            CatalogError::Store,
            self.client.delete_points(builder),
        )
        .await?;

        Ok(())
    }
}
