//! HTTP surface
//!
//! Routes under `/api/products` wrap every outcome in the
//! `{success, message, ...}` JSON envelope.

pub mod form;
pub mod handlers;
pub mod response;

pub use form::ProductForm;
pub use response::ApiError;

use crate::service::ProductService;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub products: ProductService,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::welcome))
        .nest("/api/products", product_routes())
        .fallback(handlers::route_not_found)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(handlers::create_product))
        .route("/update/{product_id}", put(handlers::update_product))
        .route("/all", get(handlers::list_products))
        .route(
            "/{product_id}",
            get(handlers::get_product).delete(handlers::delete_product),
        )
}
