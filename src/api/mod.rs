//! HTTP surface: routes, extractors and error responses.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod extract;
pub mod orders;
pub mod payment;
pub mod promotions;
pub mod response;
pub mod reviews;
pub mod upload;
pub mod wishlist;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::services::{upload::PUBLIC_PREFIX, Services};

const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
}

impl AppState {
    pub fn new(services: Services) -> Self { Self { services: Arc::new(services) } }
}

pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.services.uploads.dir());
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront"})) }))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/products", get(catalog::list_products).post(catalog::create_product))
        .route("/products/:id", get(catalog::get_product).put(catalog::update_product).delete(catalog::delete_product))
        .route("/categories", get(catalog::list_categories).post(catalog::create_category))
        .route("/categories/:id", delete(catalog::delete_category))
        .route("/orders", get(orders::list_orders).post(orders::create_order))
        .route("/orders/:id", get(orders::get_order).put(orders::update_order))
        .route("/payment/gateway", post(payment::create_session))
        .route("/payment/webhook", post(payment::webhook))
        .route("/promotions", get(promotions::list_promotions).post(promotions::create_promotion))
        .route("/promotions/apply", post(promotions::apply_promotion))
        .route("/reviews", get(reviews::list_reviews).post(reviews::create_review))
        .route("/cart", get(cart::get_cart).post(cart::add_to_cart).put(cart::update_cart).delete(cart::remove_from_cart))
        .route("/cart/merge", post(cart::merge_cart))
        .route("/wishlist", get(wishlist::list_wishlist).post(wishlist::toggle_wishlist))
        .route("/upload", post(upload::upload_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)))
        .nest_service(PUBLIC_PREFIX, uploads)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
