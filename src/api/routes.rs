use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::api::handlers;
use crate::store::traits::Store;

pub fn create_router<S: Store + 'static>() -> Router<Arc<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Catalog - READ-ONLY storefront surface
        .route("/products", get(handlers::list_products::<S>))
        .route("/products/:product_id", get(handlers::get_product::<S>))
        .route(
            "/products/:product_id/configuration",
            get(handlers::get_product_configuration::<S>),
        )
        .route(
            "/products/:product_id/price",
            post(handlers::quote_product_price::<S>),
        )
        // Specials with live derived pricing
        .route("/specials", get(handlers::list_specials::<S>))
        .route("/specials/:special_id", get(handlers::get_special::<S>))
        // Cart for the calling identity (created lazily)
        .route("/cart", get(handlers::get_cart::<S>))
        .route("/cart/total", get(handlers::get_cart_total::<S>))
        .route("/cart/items", post(handlers::add_cart_item::<S>))
        .route(
            "/cart/items/:line_id",
            patch(handlers::update_cart_item::<S>),
        )
        .route(
            "/cart/items/:line_id",
            delete(handlers::remove_cart_item::<S>),
        )
        // Bundles enter and leave as a unit
        .route(
            "/cart/specials/:special_id",
            post(handlers::add_bundle::<S>),
        )
        .route(
            "/cart/specials/:special_id",
            delete(handlers::remove_bundle::<S>),
        )
        // Login hook
        .route("/cart/merge", post(handlers::merge_guest_cart::<S>))
        // Orders
        .route("/orders", post(handlers::create_order::<S>))
        .route("/orders", get(handlers::list_orders::<S>))
        .route("/orders/:order_id", get(handlers::get_order::<S>))
        .route(
            "/orders/:order_id/status",
            patch(handlers::update_order_status::<S>),
        )
        // Audit trail
        .route(
            "/orders/:order_id/history",
            get(handlers::get_order_history::<S>),
        )
        .route(
            "/history/:entity_type/:entity_id",
            get(handlers::get_entity_history::<S>),
        )
}
