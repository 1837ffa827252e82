//! Handler tests for the catalog domain
//!
//! These tests verify that HTTP handlers work correctly:
//! - Request deserialization and validation
//! - HTTP status codes
//! - Error response bodies
//!
//! The router runs against the in-memory store and deterministic encoders.

mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{Harness, product};
use domain_catalog::handlers::{CollectionCreated, HealthResponse};
use domain_catalog::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt; // For oneshot()

// Helper to parse JSON response body
async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn empty(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Router over a harness whose "products" collection holds p1, p2 (category 7) and p3 (category 9)
async fn seeded_app() -> (Router, Harness) {
    let h = Harness::new();
    h.service.create_collection("products").await.unwrap();
    for p in [
        product("p1", "Red Shoe", 7),
        product("p2", "Red Shoes", 7),
        product("p3", "Red Shoe", 9),
    ] {
        h.service.upsert_product("products", p).await.unwrap();
    }

    let service = CatalogService::new(h.counting_repo(), h.text.clone(), h.image.clone());
    (handlers::router(service), h)
}

#[tokio::test]
async fn test_create_collection_returns_201() {
    let h = Harness::new();
    let app = handlers::router(CatalogService::new(
        h.repo.clone(),
        h.text.clone(),
        h.image.clone(),
    ));

    let response = app
        .oneshot(empty("POST", "/collections/products"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: CollectionCreated = json_body(response.into_body()).await;
    assert_eq!(body.collection_name, "products");
    assert_eq!(h.repo.point_count("products").await, Some(0));
}

#[tokio::test]
async fn test_create_collection_rejects_invalid_name() {
    let h = Harness::new();
    let app = handlers::router(CatalogService::new(
        h.repo.clone(),
        h.text.clone(),
        h.image.clone(),
    ));

    let response = app
        .oneshot(empty("POST", "/collections/bad.name"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_upsert_product_returns_ack() {
    let (app, h) = seeded_app().await;

    let response = app
        .oneshot(post_json(
            "/collections/products/points",
            serde_json::to_value(product("p4", "Blue Shoe", 7)).unwrap(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let ack: UpsertAck = json_body(response.into_body()).await;
    assert_eq!(ack.id, point_id("p4"));
    assert_eq!(ack.product_id, "p4");
    assert_eq!(h.repo.point_count("products").await, Some(4));
}

#[tokio::test]
async fn test_upsert_product_validates_input() {
    let (app, h) = seeded_app().await;
    let calls_before = h.encoder_calls();

    let mut invalid = serde_json::to_value(product("p4", "Blue Shoe", 7)).unwrap();
    invalid["product_id"] = json!("");

    let response = app
        .oneshot(post_json("/collections/products/points", invalid))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response.into_body()).await;
    assert!(body["details"]["product_id"].is_array());
    assert_eq!(h.encoder_calls(), calls_before);
    assert_eq!(h.store_calls(), 0);
}

#[tokio::test]
async fn test_get_point_returns_record() {
    let (app, _h) = seeded_app().await;

    let response = app
        .oneshot(empty("GET", "/collections/products/points/p2"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let record: PointRecord = json_body(response.into_body()).await;
    assert_eq!(record.id, point_id("p2"));
    assert_eq!(record.payload.name, "Red Shoes");
    assert_eq!(record.vectors["name"].len(), 384);
    assert_eq!(record.vectors["image"].len(), 1000);
}

#[tokio::test]
async fn test_get_unknown_point_returns_404() {
    let (app, _h) = seeded_app().await;

    let response = app
        .oneshot(empty("GET", "/collections/products/points/ghost"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "NOT_FOUND");
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn test_delete_point() {
    let (app, h) = seeded_app().await;

    let response = app
        .clone()
        .oneshot(empty("DELETE", "/collections/products/points/p1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(h.repo.point_count("products").await, Some(2));

    let response = app
        .oneshot(empty("DELETE", "/collections/products/points/p1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_related_by_name() {
    let (app, _h) = seeded_app().await;

    let response = app
        .oneshot(post_json(
            "/collections/products/search-related-by-name",
            json!({ "product_id": "p1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let results: Vec<SearchResult> = json_body(response.into_body()).await;
    let ids: Vec<&str> = results.iter().filter_map(SearchResult::product_id).collect();
    assert!(ids.contains(&"p2"));
    assert!(!ids.contains(&"p3"));
}

#[tokio::test]
async fn test_search_related_by_image_excluding_seed() {
    let (app, h) = seeded_app().await;

    let response = app
        .oneshot(post_json(
            "/collections/products/search-related-by-image",
            json!({ "product_id": "p1", "limit": 5, "exclude_seed": true }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let results: Vec<SearchResult> = json_body(response.into_body()).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].product_id(), Some("p2"));
    // Seed lookup, then the filtered search
    assert_eq!(h.store_calls(), 2);
}

#[tokio::test]
async fn test_search_without_product_id_returns_400() {
    let (app, h) = seeded_app().await;

    let response = app
        .oneshot(post_json(
            "/collections/products/search-related-by-name",
            json!({ "limit": 3 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(h.store_calls(), 0);
}

#[tokio::test]
async fn test_search_with_unknown_seed_returns_404() {
    let (app, _h) = seeded_app().await;

    let response = app
        .oneshot(post_json(
            "/collections/products/search-related-by-name",
            json!({ "product_id": "ghost" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let h = Harness::new();
    let app = handlers::router(CatalogService::new(
        h.repo.clone(),
        h.text.clone(),
        h.image.clone(),
    ));

    let response = app.oneshot(empty("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: HealthResponse = json_body(response.into_body()).await;
    assert_eq!(body.status, "ok");
}
