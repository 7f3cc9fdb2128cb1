use super::form::ProductForm;
use super::response::{success, ApiError};
use super::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::json;
use tracing::{error, instrument};
use uuid::Uuid;

fn parse_product_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid product id: {}", raw)))
}

pub async fn welcome() -> &'static str {
    "Welcome to the Restful API"
}

pub async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found")
}

#[instrument(name = "handler::create_product", skip_all)]
pub async fn create_product(
    State(state): State<AppState>,
    form: ProductForm,
) -> Result<Response, ApiError> {
    let product = state
        .products
        .create(form.fields, form.images)
        .await
        .map_err(|e| ApiError::from_write(e, "Failed to create product"))?;

    Ok(success(
        StatusCode::CREATED,
        "Product created successfully",
        json!({ "product": product }),
    ))
}

#[instrument(name = "handler::update_product", skip(state, form))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    form: ProductForm,
) -> Result<Response, ApiError> {
    let id = parse_product_id(&product_id)?;
    let product = state
        .products
        .update(id, form.fields, form.images)
        .await
        .map_err(|e| ApiError::from_write(e, "Failed to update product"))?;

    Ok(success(
        StatusCode::OK,
        "Product updated successfully",
        json!({ "product": product }),
    ))
}

#[instrument(name = "handler::list_products", skip_all)]
pub async fn list_products(State(state): State<AppState>) -> Result<Response, ApiError> {
    let (total, products) = state.products.list().await.map_err(|e| {
        error!("Error retrieving products: {}", e);
        ApiError::internal("Failed to retrieve products", e)
    })?;

    Ok(success(
        StatusCode::OK,
        "Products retrieved successfully",
        json!({ "totalProducts": total, "products": products }),
    ))
}

#[instrument(name = "handler::get_product", skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_product_id(&product_id)?;
    let product = state
        .products
        .get_by_id(id)
        .await
        .map_err(|e| {
            error!("Error retrieving product {}: {}", id, e);
            ApiError::internal("Failed to retrieve product", e)
        })?
        .ok_or(ApiError::NotFound("Product not found"))?;

    Ok(success(
        StatusCode::OK,
        "Product retrieved successfully",
        json!({ "product": product }),
    ))
}

#[instrument(name = "handler::delete_product", skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_product_id(&product_id)?;
    state.products.delete(id).await?;

    Ok(success(
        StatusCode::OK,
        "Product deleted successfully",
        json!({}),
    ))
}
