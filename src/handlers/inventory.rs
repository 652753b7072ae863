// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, payload::Payload, rbac::RequirePermission},
    models::inventory::{
        CreateProductPayload, CreateSalePayload, Product, RestockPayload, Sale, SaleQuery,
    },
    services::rbac_service::{PermInventoryCreate, PermInventoryRead, PermInventoryUpdate},
};

// GET /api/inventory/products
#[utoipa::path(
    get,
    path = "/api/inventory/products",
    tag = "Inventory",
    responses((status = 200, body = [Product]), (status = 403)),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePermission(grant): RequirePermission<PermInventoryRead>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .inventory_service
        .list_products(&grant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(products.as_ref().clone()))
}

// POST /api/inventory/products
#[utoipa::path(
    post,
    path = "/api/inventory/products",
    tag = "Inventory",
    request_body = CreateProductPayload,
    responses((status = 201, body = Product), (status = 400), (status = 409)),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePermission(grant): RequirePermission<PermInventoryCreate>,
    Payload(payload): Payload<CreateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .inventory_service
        .create_product(&grant, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(product)))
}

// POST /api/inventory/products/{id}/restock
#[utoipa::path(
    post,
    path = "/api/inventory/products/{id}/restock",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "Produto")),
    request_body = RestockPayload,
    responses((status = 200, body = Product), (status = 404)),
    security(("api_jwt" = []))
)]
pub async fn restock(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePermission(grant): RequirePermission<PermInventoryUpdate>,
    Path(product_id): Path<Uuid>,
    Payload(payload): Payload<RestockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .inventory_service
        .restock(&grant, product_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

// GET /api/inventory/sales?productId=..
#[utoipa::path(
    get,
    path = "/api/inventory/sales",
    tag = "Inventory",
    params(SaleQuery),
    responses((status = 200, body = [Sale])),
    security(("api_jwt" = []))
)]
pub async fn list_sales(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePermission(grant): RequirePermission<PermInventoryRead>,
    Query(query): Query<SaleQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sales = app_state
        .inventory_service
        .list_sales(&grant, query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(sales))
}

// POST /api/inventory/sales
#[utoipa::path(
    post,
    path = "/api/inventory/sales",
    tag = "Inventory",
    request_body = CreateSalePayload,
    responses(
        (status = 201, body = Sale),
        (status = 400, description = "Campos inválidos"),
        (status = 404, description = "Produto não encontrado"),
        (status = 422, description = "Estoque insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePermission(grant): RequirePermission<PermInventoryCreate>,
    Payload(payload): Payload<CreateSalePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let sale = app_state
        .inventory_service
        .create_sale(&grant, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(sale)))
}
