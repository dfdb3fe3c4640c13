use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use forma_store::api::routes::create_router;
use forma_store::seed::load_seed_data;
use forma_store::store::memory::MemoryStore;

async fn app() -> Router {
    let store = Arc::new(MemoryStore::new());
    load_seed_data(&*store).await.unwrap();
    create_router().with_state(store)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_as(uri: &str, header: (&str, &str)) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header.0, header.1)
        .body(Body::empty())
        .unwrap()
}

fn send_json(method: &str, uri: &str, header: Option<(&str, &str)>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some((name, value)) = header {
        builder = builder.header(name, value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let response = app().await.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_catalog_surface() {
    let app = app().await;

    let response = app.clone().oneshot(get("/products")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 3);

    let response = app
        .clone()
        .oneshot(get("/products/prod-roller-blind/configuration"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["groups"].as_array().unwrap().len(), 2);

    let response = app.oneshot(get("/products/prod-missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_price_quote() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/products/prod-roller-blind/price",
            None,
            json!({
                "selection": { "join-blind-width": "param-w100" },
                "quantity": 3
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["unit_price"], 120_000);
    assert_eq!(body["line_total"], 360_000);

    // A foreign parameter id is a construction-time error on this surface.
    let response = app
        .oneshot(send_json(
            "POST",
            "/products/prod-roller-blind/price",
            None,
            json!({
                "selection": { "join-blind-width": "param-linen" }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_specials_carry_derived_pricing() {
    let response = app().await.oneshot(get("/specials")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);

    let pricing = &body["items"][0]["pricing"];
    assert_eq!(pricing["original_price"], 90_000);
    assert_eq!(pricing["discounted_price"], 75_000);
    assert_eq!(pricing["savings"], 15_000);
}

#[tokio::test]
async fn test_cart_requires_identity() {
    let response = app().await.oneshot(get("/cart")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_guest_shopping_flow() {
    let app = app().await;
    let session = ("x-guest-session", "tab-1");

    // Lazily created, empty cart.
    let response = app.clone().oneshot(get_as("/cart", session)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["lines"].as_array().unwrap().len(), 0);

    // One configured blind.
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/cart/items",
            Some(session),
            json!({
                "product_id": "prod-roller-blind",
                "quantity": 1,
                "selection": { "join-blind-width": "param-w100" }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Plus the starter-kit bundle.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/cart/specials/special-starter-kit")
                .header(session.0, session.1)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bundle_lines = body_json(response).await;
    let bundle_line_id = bundle_lines[0]["id"].as_str().unwrap().to_string();

    // 120,000 + 90,000 worth of lines.
    let response = app
        .clone()
        .oneshot(get_as("/cart/total", session))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 210_000);

    // Bundle lines cannot be picked off one by one.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/cart/items/{}", bundle_line_id))
                .header(session.0, session.1)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Checkout.
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/orders",
            Some(session),
            json!({
                "name": "Ada Lovelace",
                "phone": "+44 20 7946 0958",
                "address": "12 Byron Terrace"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let order = body_json(response).await;
    assert_eq!(order["total_price"], 210_000);
    assert_eq!(order["status"], "pending");
    let order_id = order["id"].as_str().unwrap().to_string();

    // The cart is terminal now.
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/cart/items",
            Some(session),
            json!({
                "product_id": "prod-curtain-rod",
                "quantity": 1
            }),
        ))
        .await
        .unwrap();
    // The old cart is checked out; the identity gets a fresh active cart,
    // so a new add succeeds against the new cart.
    assert_eq!(response.status(), StatusCode::OK);

    // Admin moves the order along; the trail records both steps.
    let response = app
        .clone()
        .oneshot(send_json(
            "PATCH",
            &format!("/orders/{}/status", order_id),
            Some(("x-admin-id", "admin-1")),
            json!({ "status": "processing" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get(&format!("/orders/{}/history", order_id)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["items"][0]["action"], "status_changed");
    assert_eq!(body["items"][0]["actor"]["admin"], "admin-1");
    assert_eq!(body["items"][1]["action"], "created");
}

#[tokio::test]
async fn test_merge_endpoint_requires_user() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/cart/merge",
            Some(("x-guest-session", "tab-2")),
            json!({ "guest_session": "tab-2" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(send_json(
            "POST",
            "/cart/merge",
            Some(("x-user-id", "user-9")),
            json!({ "guest_session": "tab-2" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
