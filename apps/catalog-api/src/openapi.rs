//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for Catalog API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        version = "0.1.0",
        description = "Product vector indexing and related-product search backed by Qdrant"
    ),
    servers(
        (url = "http://localhost:8001", description = "Local development server")
    ),
    nest(
        (path = "/qdrant", api = domain_catalog::CatalogApiDoc)
    ),
    tags(
        (name = "catalog", description = "Product vectors and related-product search")
    )
)]
pub struct ApiDoc;
