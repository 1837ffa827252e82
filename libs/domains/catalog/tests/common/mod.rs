//! Deterministic encoders and fixtures shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use domain_catalog::{
    CatalogError, CatalogResult, CatalogService, CollectionSchema, ImageEncoder,
    InMemoryProductPointRepository, PointRecord, Product, ProductPoint, ProductPointRepository,
    RelatedQuery, SearchResult, TextEncoder,
};
use uuid::Uuid;

/// Bag-of-bytes embedding: equal text gives equal vectors, similar text gives close ones
fn hashed(input: &str, dim: usize, salt: usize) -> Vec<f32> {
    let mut vector = vec![0.0; dim];
    for b in input.to_lowercase().bytes() {
        vector[(b as usize * salt) % dim] += 1.0;
    }
    vector
}

#[derive(Default)]
pub struct FakeTextEncoder {
    pub calls: AtomicUsize,
}

#[async_trait]
impl TextEncoder for FakeTextEncoder {
    async fn encode_text(&self, text: &str) -> CatalogResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(hashed(text, 384, 7))
    }
}

#[derive(Default)]
pub struct FakeImageEncoder {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ImageEncoder for FakeImageEncoder {
    async fn encode_image(&self, source: &str) -> CatalogResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(hashed(source, 1000, 13))
    }
}

pub struct UnreachableImageEncoder;

#[async_trait]
impl ImageEncoder for UnreachableImageEncoder {
    async fn encode_image(&self, source: &str) -> CatalogResult<Vec<f32>> {
        Err(CatalogError::Encoding(format!("Failed to fetch {}", source)))
    }
}

/// In-memory store that counts every call made through it
#[derive(Clone)]
pub struct CountingRepository {
    inner: InMemoryProductPointRepository,
    calls: Arc<AtomicUsize>,
}

impl CountingRepository {
    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProductPointRepository for CountingRepository {
    async fn recreate_collection(
        &self,
        collection: &str,
        schema: &CollectionSchema,
    ) -> CatalogResult<()> {
        self.record();
        self.inner.recreate_collection(collection, schema).await
    }

    async fn upsert_point(&self, collection: &str, point: ProductPoint) -> CatalogResult<()> {
        self.record();
        self.inner.upsert_point(collection, point).await
    }

    async fn find_by_product_id(
        &self,
        collection: &str,
        product_id: &str,
    ) -> CatalogResult<Option<PointRecord>> {
        self.record();
        self.inner.find_by_product_id(collection, product_id).await
    }

    async fn search(
        &self,
        collection: &str,
        query: RelatedQuery,
    ) -> CatalogResult<Vec<SearchResult>> {
        self.record();
        self.inner.search(collection, query).await
    }

    async fn delete_point(&self, collection: &str, id: Uuid) -> CatalogResult<()> {
        self.record();
        self.inner.delete_point(collection, id).await
    }
}

pub struct Harness {
    pub repo: InMemoryProductPointRepository,
    pub text: Arc<FakeTextEncoder>,
    pub image: Arc<FakeImageEncoder>,
    pub service: CatalogService<InMemoryProductPointRepository>,
    store_calls: Arc<AtomicUsize>,
}

impl Harness {
    pub fn new() -> Self {
        let repo = InMemoryProductPointRepository::new();
        let text = Arc::new(FakeTextEncoder::default());
        let image = Arc::new(FakeImageEncoder::default());
        let service = CatalogService::new(repo.clone(), text.clone(), image.clone());
        Self {
            repo,
            text,
            image,
            service,
            store_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A view of `repo` whose calls show up in `store_calls`
    pub fn counting_repo(&self) -> CountingRepository {
        CountingRepository {
            inner: self.repo.clone(),
            calls: self.store_calls.clone(),
        }
    }

    pub fn store_calls(&self) -> usize {
        self.store_calls.load(Ordering::SeqCst)
    }

    pub fn encoder_calls(&self) -> usize {
        self.text.calls.load(Ordering::SeqCst) + self.image.calls.load(Ordering::SeqCst)
    }
}

pub fn product(product_id: &str, name: &str, category_id: i64) -> Product {
    Product {
        product_id: product_id.to_string(),
        name: name.to_string(),
        image: format!("https://cdn.example.com/images/{}.jpg", product_id),
        average_rating: 4.2,
        total_purchases: 10,
        total_reviews: 3,
        category_id,
        description: format!("{} description", name),
    }
}
