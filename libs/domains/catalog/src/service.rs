use std::sync::Arc;

use tracing::instrument;
use validator::Validate;

use crate::encoder::{ImageEncoder, TextEncoder};
use crate::error::{CatalogError, CatalogResult};
use crate::identifier::point_id;
use crate::models::{
    CollectionSchema, MAX_RELATED_LIMIT, PointRecord, Product, ProductPayload, ProductPoint,
    ProductVectors, RelatedQuery, SearchResult, UpsertAck, VectorSpace,
};
use crate::repository::ProductPointRepository;

const MAX_COLLECTION_NAME_LEN: usize = 255;

/// Reject collection names the store would refuse or misinterpret.
pub fn validate_collection_name(name: &str) -> CatalogResult<()> {
    if name.is_empty() {
        return Err(CatalogError::Validation(
            "Collection name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_COLLECTION_NAME_LEN {
        return Err(CatalogError::Validation(format!(
            "Collection name exceeds {} characters",
            MAX_COLLECTION_NAME_LEN
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(CatalogError::Validation(format!(
            "Collection name '{}' may only contain letters, digits, '_' and '-'",
            name
        )));
    }
    Ok(())
}

/// Product catalog service
///
/// Turns product records into dual-vector points and answers related-product
/// queries scoped to the seed's category.
pub struct CatalogService<R: ProductPointRepository> {
    repository: R,
    text_encoder: Arc<dyn TextEncoder>,
    image_encoder: Arc<dyn ImageEncoder>,
    schema: CollectionSchema,
}

impl<R: ProductPointRepository> CatalogService<R> {
    pub fn new(
        repository: R,
        text_encoder: Arc<dyn TextEncoder>,
        image_encoder: Arc<dyn ImageEncoder>,
    ) -> Self {
        Self {
            repository,
            text_encoder,
            image_encoder,
            schema: CollectionSchema::product_catalog(),
        }
    }

    // ===== Collection Management =====

    /// Create `collection`, replacing any existing collection of the same name.
    ///
    /// All points of a replaced collection are lost.
    #[instrument(skip_all, fields(collection = %collection))]
    pub async fn create_collection(&self, collection: &str) -> CatalogResult<()> {
        validate_collection_name(collection)?;

        self.repository
            .recreate_collection(collection, &self.schema)
            .await
            .map_err(|e| match e {
                CatalogError::Store(msg) => CatalogError::Schema(msg),
                other => other,
            })
    }

    // ===== Point Operations =====

    /// Encode and store a product, replacing the previous point for the same key.
    #[instrument(skip_all, fields(collection = %collection, product_id = %product.product_id))]
    pub async fn upsert_product(
        &self,
        collection: &str,
        product: Product,
    ) -> CatalogResult<UpsertAck> {
        validate_collection_name(collection)?;
        product.validate()?;

        let id = point_id(&product.product_id);

        let (name, image) = tokio::try_join!(
            self.text_encoder.encode_text(&product.name),
            self.image_encoder.encode_image(&product.image),
        )
        .map_err(|e| CatalogError::upload(&product.product_id, e))?;

        let point = ProductPoint {
            id,
            vectors: ProductVectors { name, image },
            payload: ProductPayload::from(&product),
        };

        self.repository
            .upsert_point(collection, point)
            .await
            .map_err(|e| CatalogError::upload(&product.product_id, e))?;

        tracing::info!(point_id = %id, "Upserted product");

        Ok(UpsertAck {
            id,
            product_id: product.product_id,
            status: "uploaded".to_string(),
        })
    }

    #[instrument(skip_all, fields(collection = %collection, product_id = %product_id))]
    pub async fn find_by_product_id(
        &self,
        collection: &str,
        product_id: &str,
    ) -> CatalogResult<Option<PointRecord>> {
        validate_collection_name(collection)?;
        self.repository
            .find_by_product_id(collection, product_id)
            .await
    }

    /// Delete the point of `product_id`. Returns whether it existed.
    #[instrument(skip_all, fields(collection = %collection, product_id = %product_id))]
    pub async fn delete_product(&self, collection: &str, product_id: &str) -> CatalogResult<bool> {
        validate_collection_name(collection)?;

        if self
            .repository
            .find_by_product_id(collection, product_id)
            .await?
            .is_none()
        {
            return Ok(false);
        }

        self.repository
            .delete_point(collection, point_id(product_id))
            .await?;
        Ok(true)
    }

    // ===== Related Products =====

    /// Products of the seed's category nearest to the seed in `space`.
    ///
    /// Results keep the store's ranking. The seed itself is only left out when
    /// `exclude_seed` is set.
    #[instrument(skip_all, fields(collection = %collection, product_id = %product_id, space = %space))]
    pub async fn search_related(
        &self,
        collection: &str,
        product_id: &str,
        space: VectorSpace,
        limit: u64,
        exclude_seed: bool,
    ) -> CatalogResult<Vec<SearchResult>> {
        validate_collection_name(collection)?;
        if limit == 0 || limit > MAX_RELATED_LIMIT {
            return Err(CatalogError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_RELATED_LIMIT
            )));
        }

        let seed = self
            .repository
            .find_by_product_id(collection, product_id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(product_id.to_string()))?;

        let vector = seed
            .vector(space)
            .ok_or_else(|| CatalogError::InvalidVector {
                product_id: product_id.to_string(),
                space,
            })?
            .to_vec();

        let query = RelatedQuery {
            space,
            vector,
            category_id: seed.payload.category_id,
            limit,
            exclude_id: exclude_seed.then_some(seed.id),
        };

        let results = self
            .repository
            .search(collection, query)
            .await
            .map_err(|e| match e {
                CatalogError::Store(msg) => CatalogError::Search(msg),
                other => other,
            })?;

        tracing::debug!(count = results.len(), "Related search complete");
        Ok(results)
    }

    pub async fn search_related_by_name(
        &self,
        collection: &str,
        product_id: &str,
        limit: u64,
        exclude_seed: bool,
    ) -> CatalogResult<Vec<SearchResult>> {
        self.search_related(collection, product_id, VectorSpace::Name, limit, exclude_seed)
            .await
    }

    pub async fn search_related_by_image(
        &self,
        collection: &str,
        product_id: &str,
        limit: u64,
        exclude_seed: bool,
    ) -> CatalogResult<Vec<SearchResult>> {
        self.search_related(collection, product_id, VectorSpace::Image, limit, exclude_seed)
            .await
    }
}
