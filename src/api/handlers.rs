use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::identity::AdminContext;
use crate::error::StoreError;
use crate::logic::{pricing, CartOperations, OrderOperations, SpecialOperations, SpecialPricing};
use crate::model::{
    Cart, CartLine, ContactDetails, HistoryEntry, Id, Identity, Order, OrderStatus,
    ParameterSelection, Product, ProductConfig, SelectionBuilder, Special, SpecialItem,
};
use crate::notify::LogNotifier;
use crate::store::traits::Store;

pub type AppState<S> = Arc<S>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a domain error onto the HTTP status it documents: validation → 400,
/// not-found → 404, state-conflict → 409, storage → 500.
fn error_response(err: StoreError) -> ApiError {
    let status = match &err {
        StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::StateConflict(_) => StatusCode::CONFLICT,
        StoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::new(&err.to_string())))
}

fn storage_error(err: anyhow::Error) -> ApiError {
    error_response(StoreError::Storage(err))
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

pub async fn list_products<S: Store>(
    State(store): State<AppState<S>>,
) -> Result<Json<ListResponse<Product>>, ApiError> {
    let items = store.list_products().await.map_err(storage_error)?;
    let total = items.len();
    Ok(Json(ListResponse { items, total }))
}

pub async fn get_product<S: Store>(
    State(store): State<AppState<S>>,
    Path(product_id): Path<Id>,
) -> Result<Json<Product>, ApiError> {
    let product = store
        .get_product(&product_id)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| error_response(StoreError::not_found("Product", &product_id)))?;
    Ok(Json(product))
}

/// The parameter catalog for one product: every group join with its
/// parameters and the per-join default, the way the configurator renders
/// it. Duplicate joins of the same group appear as separate entries.
pub async fn get_product_configuration<S: Store>(
    State(store): State<AppState<S>>,
    Path(product_id): Path<Id>,
) -> Result<Json<ProductConfig>, ApiError> {
    let config = store
        .get_product_config(&product_id)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| error_response(StoreError::not_found("Product", &product_id)))?;
    Ok(Json(config))
}

#[derive(Debug, Deserialize)]
pub struct PriceQuoteRequest {
    /// Join-row id → parameter id.
    #[serde(default)]
    pub selection: HashMap<Id, Id>,
    pub quantity: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PriceQuoteResponse {
    pub unit_price: i64,
    pub quantity: i64,
    pub line_total: i64,
}

pub async fn quote_product_price<S: Store>(
    State(store): State<AppState<S>>,
    Path(product_id): Path<Id>,
    RequestJson(request): RequestJson<PriceQuoteRequest>,
) -> Result<Json<PriceQuoteResponse>, ApiError> {
    let quantity = request.quantity.unwrap_or(1);
    if quantity < 1 {
        return Err(error_response(StoreError::validation(
            "quantity must be at least 1",
        )));
    }

    let (config, selection) = resolve_selection(&*store, &product_id, &request.selection)
        .await
        .map_err(error_response)?;

    let unit_price = pricing::unit_price(&config, &selection);
    Ok(Json(PriceQuoteResponse {
        unit_price,
        quantity,
        line_total: unit_price * quantity,
    }))
}

#[derive(Debug, Serialize)]
pub struct SpecialResponse {
    #[serde(flatten)]
    pub special: Special,
    pub pricing: SpecialPricing,
}

#[derive(Debug, Serialize)]
pub struct SpecialDetailResponse {
    #[serde(flatten)]
    pub special: Special,
    pub pricing: SpecialPricing,
    pub items: Vec<SpecialItem>,
}

pub async fn list_specials<S: Store>(
    State(store): State<AppState<S>>,
) -> Result<Json<ListResponse<SpecialResponse>>, ApiError> {
    let specials = store.list_specials().await.map_err(storage_error)?;

    let mut items = Vec::with_capacity(specials.len());
    for special in specials {
        let pricing = SpecialOperations::pricing(&*store, &special.id)
            .await
            .map_err(error_response)?;
        items.push(SpecialResponse { special, pricing });
    }
    let total = items.len();
    Ok(Json(ListResponse { items, total }))
}

pub async fn get_special<S: Store>(
    State(store): State<AppState<S>>,
    Path(special_id): Path<Id>,
) -> Result<Json<SpecialDetailResponse>, ApiError> {
    let special = store
        .get_special(&special_id)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| error_response(StoreError::not_found("Special", &special_id)))?;
    let items = store
        .list_special_items(&special_id)
        .await
        .map_err(storage_error)?;
    let pricing = SpecialOperations::pricing(&*store, &special_id)
        .await
        .map_err(error_response)?;

    Ok(Json(SpecialDetailResponse {
        special,
        pricing,
        items,
    }))
}

// ---------------------------------------------------------------------------
// Cart
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub id: Id,
    pub product_id: Id,
    pub product_name: String,
    pub quantity: i64,
    pub selection: ParameterSelection,
    pub special_id: Option<Id>,
    pub unit_price: i64,
    pub line_total: i64,
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub cart: Cart,
    pub lines: Vec<CartLineView>,
    pub total: i64,
}

pub async fn get_cart<S: Store>(
    State(store): State<AppState<S>>,
    identity: Identity,
) -> Result<Json<CartView>, ApiError> {
    let cart = CartOperations::get_or_create_cart(&*store, &identity)
        .await
        .map_err(error_response)?;
    let view = build_cart_view(&*store, cart).await.map_err(error_response)?;
    Ok(Json(view))
}

#[derive(Debug, Serialize)]
pub struct CartTotalResponse {
    pub cart_id: Id,
    pub total: i64,
}

pub async fn get_cart_total<S: Store>(
    State(store): State<AppState<S>>,
    identity: Identity,
) -> Result<Json<CartTotalResponse>, ApiError> {
    let cart = CartOperations::get_or_create_cart(&*store, &identity)
        .await
        .map_err(error_response)?;
    let total = CartOperations::cart_total(&*store, &cart.id)
        .await
        .map_err(error_response)?;
    Ok(Json(CartTotalResponse {
        cart_id: cart.id,
        total,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: Id,
    pub quantity: i64,
    #[serde(default)]
    pub selection: HashMap<Id, Id>,
}

pub async fn add_cart_item<S: Store>(
    State(store): State<AppState<S>>,
    identity: Identity,
    RequestJson(request): RequestJson<AddItemRequest>,
) -> Result<Json<CartLine>, ApiError> {
    let cart = CartOperations::get_or_create_cart(&*store, &identity)
        .await
        .map_err(error_response)?;

    let (_, selection) = resolve_selection(&*store, &request.product_id, &request.selection)
        .await
        .map_err(error_response)?;

    let line = CartOperations::add_item(
        &*store,
        &cart.id,
        &request.product_id,
        request.quantity,
        selection,
    )
    .await
    .map_err(error_response)?;
    Ok(Json(line))
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: Option<i64>,
    pub selection: Option<HashMap<Id, Id>>,
}

pub async fn update_cart_item<S: Store>(
    State(store): State<AppState<S>>,
    identity: Identity,
    Path(line_id): Path<Id>,
    RequestJson(request): RequestJson<UpdateItemRequest>,
) -> Result<Json<CartLine>, ApiError> {
    let line = require_own_line(&*store, &identity, &line_id)
        .await
        .map_err(error_response)?;

    let selection = match &request.selection {
        Some(raw) => {
            let (_, selection) = resolve_selection(&*store, &line.product_id, raw)
                .await
                .map_err(error_response)?;
            Some(selection)
        }
        None => None,
    };

    let line = CartOperations::update_item(&*store, &line_id, request.quantity, selection)
        .await
        .map_err(error_response)?;
    Ok(Json(line))
}

pub async fn remove_cart_item<S: Store>(
    State(store): State<AppState<S>>,
    identity: Identity,
    Path(line_id): Path<Id>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_own_line(&*store, &identity, &line_id)
        .await
        .map_err(error_response)?;

    CartOperations::remove_item(&*store, &line_id)
        .await
        .map_err(error_response)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

pub async fn add_bundle<S: Store>(
    State(store): State<AppState<S>>,
    identity: Identity,
    Path(special_id): Path<Id>,
) -> Result<Json<Vec<CartLine>>, ApiError> {
    let cart = CartOperations::get_or_create_cart(&*store, &identity)
        .await
        .map_err(error_response)?;
    let lines = CartOperations::add_bundle(&*store, &cart.id, &special_id)
        .await
        .map_err(error_response)?;
    Ok(Json(lines))
}

pub async fn remove_bundle<S: Store>(
    State(store): State<AppState<S>>,
    identity: Identity,
    Path(special_id): Path<Id>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cart = CartOperations::get_or_create_cart(&*store, &identity)
        .await
        .map_err(error_response)?;
    let removed = CartOperations::remove_bundle(&*store, &cart.id, &special_id)
        .await
        .map_err(error_response)?;
    Ok(Json(serde_json::json!({ "removed_lines": removed })))
}

#[derive(Debug, Deserialize)]
pub struct MergeCartRequest {
    pub guest_session: Id,
}

/// Login hook: fold the caller's old guest cart into their user cart.
/// Safe to call again: the retired guest cart is simply gone.
pub async fn merge_guest_cart<S: Store>(
    State(store): State<AppState<S>>,
    identity: Identity,
    RequestJson(request): RequestJson<MergeCartRequest>,
) -> Result<Json<CartView>, ApiError> {
    let Identity::User(user_id) = &identity else {
        return Err(error_response(StoreError::validation(
            "cart merge requires an authenticated user",
        )));
    };

    let cart =
        CartOperations::merge_guest_cart_into_user(&*store, &request.guest_session, user_id)
            .await
            .map_err(error_response)?;
    let view = build_cart_view(&*store, cart).await.map_err(error_response)?;
    Ok(Json(view))
}

// ---------------------------------------------------------------------------
// Orders & history
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub name: String,
    pub phone: String,
    pub secondary_phone: Option<String>,
    pub address: String,
}

pub async fn create_order<S: Store>(
    State(store): State<AppState<S>>,
    identity: Identity,
    RequestJson(request): RequestJson<CreateOrderRequest>,
) -> Result<Json<Order>, ApiError> {
    let cart = store
        .find_active_cart(&identity)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| error_response(StoreError::not_found("Cart", identity.key())))?;

    let contact = ContactDetails {
        name: request.name,
        phone: request.phone,
        secondary_phone: request.secondary_phone,
        address: request.address,
    };

    let order =
        OrderOperations::create_order(&*store, &LogNotifier, &cart.id, &identity, contact)
            .await
            .map_err(error_response)?;
    Ok(Json(order))
}

pub async fn list_orders<S: Store>(
    State(store): State<AppState<S>>,
    identity: Identity,
) -> Result<Json<ListResponse<Order>>, ApiError> {
    let items = store
        .list_orders_for_buyer(&identity)
        .await
        .map_err(storage_error)?;
    let total = items.len();
    Ok(Json(ListResponse { items, total }))
}

#[derive(Debug, Serialize)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<crate::model::OrderLine>,
}

pub async fn get_order<S: Store>(
    State(store): State<AppState<S>>,
    Path(order_id): Path<Id>,
) -> Result<Json<OrderDetailResponse>, ApiError> {
    let order = store
        .get_order(&order_id)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| error_response(StoreError::not_found("Order", &order_id)))?;
    let lines = store
        .list_order_lines(&order_id)
        .await
        .map_err(storage_error)?;
    Ok(Json(OrderDetailResponse { order, lines }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

pub async fn update_order_status<S: Store>(
    State(store): State<AppState<S>>,
    admin: AdminContext,
    Path(order_id): Path<Id>,
    RequestJson(request): RequestJson<UpdateOrderStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let order =
        OrderOperations::update_order_status(&*store, &order_id, request.status, admin.admin_id)
            .await
            .map_err(error_response)?;
    Ok(Json(order))
}

pub async fn get_order_history<S: Store>(
    State(store): State<AppState<S>>,
    Path(order_id): Path<Id>,
) -> Result<Json<ListResponse<HistoryEntry>>, ApiError> {
    let items = OrderOperations::order_history(&*store, &order_id)
        .await
        .map_err(error_response)?;
    let total = items.len();
    Ok(Json(ListResponse { items, total }))
}

pub async fn get_entity_history<S: Store>(
    State(store): State<AppState<S>>,
    Path((entity_type, entity_id)): Path<(String, Id)>,
) -> Result<Json<ListResponse<HistoryEntry>>, ApiError> {
    let items = store
        .list_history(&entity_type, &entity_id)
        .await
        .map_err(storage_error)?;
    let total = items.len();
    Ok(Json(ListResponse { items, total }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve a raw join-id → parameter-id map against the product's catalog,
/// rejecting stale or foreign references up front. The calculator would
/// skip them anyway; failing here gives the configurator a real error
/// instead of a silently unchanged price.
async fn resolve_selection<S: Store>(
    store: &S,
    product_id: &Id,
    raw: &HashMap<Id, Id>,
) -> Result<(ProductConfig, ParameterSelection), StoreError> {
    let config = store
        .get_product_config(product_id)
        .await?
        .ok_or_else(|| StoreError::not_found("Product", product_id))?;

    let mut builder = SelectionBuilder::new(&config);
    for (join_id, parameter_id) in raw {
        builder = builder.choose(join_id, parameter_id)?;
    }
    let selection = builder.build();
    Ok((config, selection))
}

/// A line may only be touched by the owner of the cart it belongs to.
/// Foreign lines read as not-found rather than leaking their existence;
/// the state of the cart itself (active or checked out) is judged by the
/// operation that follows.
async fn require_own_line<S: Store>(
    store: &S,
    identity: &Identity,
    line_id: &Id,
) -> Result<CartLine, StoreError> {
    let line = store
        .get_line(line_id)
        .await?
        .ok_or_else(|| StoreError::not_found("Cart line", line_id))?;
    let cart = store
        .get_cart(&line.cart_id)
        .await?
        .ok_or_else(|| StoreError::not_found("Cart line", line_id))?;
    if &cart.owner != identity {
        return Err(StoreError::not_found("Cart line", line_id));
    }
    Ok(line)
}

async fn build_cart_view<S: Store>(store: &S, cart: Cart) -> Result<CartView, StoreError> {
    let lines = store.list_lines(&cart.id).await?;

    let mut views = Vec::with_capacity(lines.len());
    let mut total = 0;
    for line in lines {
        let (product_name, unit_price) = match store.get_product_config(&line.product_id).await? {
            Some(config) => (
                config.product.name.clone(),
                pricing::unit_price(&config, &line.selection),
            ),
            None => (line.product_id.clone(), 0),
        };
        let line_total = unit_price * line.quantity;
        total += line_total;
        views.push(CartLineView {
            id: line.id,
            product_id: line.product_id,
            product_name,
            quantity: line.quantity,
            selection: line.selection,
            special_id: line.special_id,
            unit_price,
            line_total,
        });
    }

    Ok(CartView {
        cart,
        lines: views,
        total,
    })
}
