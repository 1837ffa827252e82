//! Stable point identifiers derived from external product keys.

use uuid::Uuid;

/// Derive the point id for `product_id`.
///
/// UUID version 5 over the DNS namespace, so the same key always maps to the same
/// point and upserts replace instead of duplicating.
pub fn point_id(product_id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, product_id.as_bytes())
}
