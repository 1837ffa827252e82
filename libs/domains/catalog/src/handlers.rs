//! REST handlers for the product catalog

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::error::{CatalogError, CatalogResult, ErrorResponse};
use crate::extract::ValidatedJson;
use crate::models::{
    PointRecord, Product, ProductPayload, SearchRelatedRequest, SearchResult, UpsertAck,
    VectorSpace,
};
use crate::repository::ProductPointRepository;
use crate::service::CatalogService;

/// Response for collection creation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CollectionCreated {
    pub collection_name: String,
    pub status: String,
}

/// Liveness response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// OpenAPI documentation for the catalog API
#[derive(OpenApi)]
#[openapi(
    paths(
        create_collection,
        upsert_product,
        get_point,
        delete_point,
        search_related_by_name,
        search_related_by_image,
        health,
    ),
    components(
        schemas(
            Product, ProductPayload, PointRecord, UpsertAck,
            SearchRelatedRequest, SearchResult, VectorSpace,
            CollectionCreated, HealthResponse, ErrorResponse
        )
    ),
    tags(
        (name = "catalog", description = "Product vectors and related-product search")
    )
)]
pub struct CatalogApiDoc;

/// Create router for catalog handlers
pub fn router<R: ProductPointRepository + 'static>(service: CatalogService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/collections/{collection_name}", post(create_collection))
        .route("/collections/{collection_name}/points", post(upsert_product))
        .route(
            "/collections/{collection_name}/points/{product_id}",
            get(get_point).delete(delete_point),
        )
        .route(
            "/collections/{collection_name}/search-related-by-name",
            post(search_related_by_name),
        )
        .route(
            "/collections/{collection_name}/search-related-by-image",
            post(search_related_by_image),
        )
        .route("/health", get(health))
        .with_state(shared_service)
}

/// Create (or replace) a product collection
#[utoipa::path(
    post,
    path = "/collections/{collection_name}",
    tag = "catalog",
    params(("collection_name" = String, Path, description = "Collection name")),
    responses(
        (status = 201, description = "Collection created", body = CollectionCreated),
        (status = 400, description = "Invalid collection name", body = ErrorResponse),
        (status = 500, description = "Vector store error", body = ErrorResponse)
    )
)]
pub async fn create_collection<R: ProductPointRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    Path(collection_name): Path<String>,
) -> CatalogResult<impl IntoResponse> {
    service.create_collection(&collection_name).await?;

    Ok((
        StatusCode::CREATED,
        Json(CollectionCreated {
            collection_name,
            status: "created".to_string(),
        }),
    ))
}

/// Encode and upsert a product
#[utoipa::path(
    post,
    path = "/collections/{collection_name}/points",
    tag = "catalog",
    params(("collection_name" = String, Path, description = "Collection name")),
    request_body = Product,
    responses(
        (status = 200, description = "Product stored", body = UpsertAck),
        (status = 400, description = "Invalid product", body = ErrorResponse),
        (status = 502, description = "Encoder failure", body = ErrorResponse),
        (status = 504, description = "Vector store timeout", body = ErrorResponse)
    )
)]
pub async fn upsert_product<R: ProductPointRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    Path(collection_name): Path<String>,
    ValidatedJson(product): ValidatedJson<Product>,
) -> CatalogResult<Json<UpsertAck>> {
    let ack = service.upsert_product(&collection_name, product).await?;
    Ok(Json(ack))
}

/// Look up a stored point by product id
#[utoipa::path(
    get,
    path = "/collections/{collection_name}/points/{product_id}",
    tag = "catalog",
    params(
        ("collection_name" = String, Path, description = "Collection name"),
        ("product_id" = String, Path, description = "External product key")
    ),
    responses(
        (status = 200, description = "Stored point", body = PointRecord),
        (status = 404, description = "Product not found", body = ErrorResponse)
    )
)]
pub async fn get_point<R: ProductPointRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    Path((collection_name, product_id)): Path<(String, String)>,
) -> CatalogResult<Json<PointRecord>> {
    service
        .find_by_product_id(&collection_name, &product_id)
        .await?
        .map(Json)
        .ok_or(CatalogError::NotFound(product_id))
}

/// Delete a stored point by product id
#[utoipa::path(
    delete,
    path = "/collections/{collection_name}/points/{product_id}",
    tag = "catalog",
    params(
        ("collection_name" = String, Path, description = "Collection name"),
        ("product_id" = String, Path, description = "External product key")
    ),
    responses(
        (status = 204, description = "Point deleted"),
        (status = 404, description = "Product not found", body = ErrorResponse)
    )
)]
pub async fn delete_point<R: ProductPointRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    Path((collection_name, product_id)): Path<(String, String)>,
) -> CatalogResult<StatusCode> {
    if service.delete_product(&collection_name, &product_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(CatalogError::NotFound(product_id))
    }
}

/// Products of the same category with the most similar names
#[utoipa::path(
    post,
    path = "/collections/{collection_name}/search-related-by-name",
    tag = "catalog",
    params(("collection_name" = String, Path, description = "Collection name")),
    request_body = SearchRelatedRequest,
    responses(
        (status = 200, description = "Related products, closest first", body = Vec<SearchResult>),
        (status = 400, description = "Missing or invalid product_id", body = ErrorResponse),
        (status = 404, description = "Seed product not found", body = ErrorResponse),
        (status = 422, description = "Seed has no name vector", body = ErrorResponse)
    )
)]
pub async fn search_related_by_name<R: ProductPointRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    Path(collection_name): Path<String>,
    ValidatedJson(request): ValidatedJson<SearchRelatedRequest>,
) -> CatalogResult<Json<Vec<SearchResult>>> {
    search_related(&service, &collection_name, VectorSpace::Name, request).await
}

/// Products of the same category with the most similar images
#[utoipa::path(
    post,
    path = "/collections/{collection_name}/search-related-by-image",
    tag = "catalog",
    params(("collection_name" = String, Path, description = "Collection name")),
    request_body = SearchRelatedRequest,
    responses(
        (status = 200, description = "Related products, most similar first", body = Vec<SearchResult>),
        (status = 400, description = "Missing or invalid product_id", body = ErrorResponse),
        (status = 404, description = "Seed product not found", body = ErrorResponse),
        (status = 422, description = "Seed has no image vector", body = ErrorResponse)
    )
)]
pub async fn search_related_by_image<R: ProductPointRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    Path(collection_name): Path<String>,
    ValidatedJson(request): ValidatedJson<SearchRelatedRequest>,
) -> CatalogResult<Json<Vec<SearchResult>>> {
    search_related(&service, &collection_name, VectorSpace::Image, request).await
}

async fn search_related<R: ProductPointRepository>(
    service: &CatalogService<R>,
    collection_name: &str,
    space: VectorSpace,
    request: SearchRelatedRequest,
) -> CatalogResult<Json<Vec<SearchResult>>> {
    let product_id = request
        .product_id
        .ok_or_else(|| CatalogError::Validation("product_id is required".to_string()))?;

    let results = service
        .search_related(
            collection_name,
            &product_id,
            space,
            request.limit,
            request.exclude_seed,
        )
        .await?;
    Ok(Json(results))
}

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    tag = "catalog",
    responses((status = 200, description = "Service is alive", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "catalog".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
