//! HTTP handlers for product and variant endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::products::{
    CreateProductInput, CreateVariantInput, Product, ProductDetail, ProductService,
    ProductVariant, UpdateProductInput, UpdateVariantInput,
};
use crate::AppState;

/// Query for listing products
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub project_id: Option<Uuid>,
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    let product = service.create_product(&current_user.0, input).await?;
    Ok(Json(product))
}

/// List products
pub async fn list_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ProductsQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let service = ProductService::new(state.db);
    let products = service
        .list_products(current_user.0.organization_id, query.project_id)
        .await?;
    Ok(Json(products))
}

/// Get a product with its variants
pub async fn get_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductDetail>> {
    let service = ProductService::new(state.db);
    let detail = service
        .get_product(current_user.0.organization_id, product_id)
        .await?;
    Ok(Json(detail))
}

/// Update a product
pub async fn update_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    let product = service
        .update_product(&current_user.0, product_id, input)
        .await?;
    Ok(Json(product))
}

/// Delete a product
pub async fn delete_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = ProductService::new(state.db);
    service.delete_product(&current_user.0, product_id).await?;
    Ok(Json(()))
}

/// Add a variant to a product
pub async fn create_variant(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<CreateVariantInput>,
) -> AppResult<Json<ProductVariant>> {
    let service = ProductService::new(state.db);
    let variant = service
        .create_variant(&current_user.0, product_id, input)
        .await?;
    Ok(Json(variant))
}

/// Update a variant
pub async fn update_variant(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((product_id, variant_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<UpdateVariantInput>,
) -> AppResult<Json<ProductVariant>> {
    let service = ProductService::new(state.db);
    let variant = service
        .update_variant(&current_user.0, product_id, variant_id, input)
        .await?;
    Ok(Json(variant))
}

/// Delete a variant
pub async fn delete_variant(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((product_id, variant_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<()>> {
    let service = ProductService::new(state.db);
    service
        .delete_variant(&current_user.0, product_id, variant_id)
        .await?;
    Ok(Json(()))
}
