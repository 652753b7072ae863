// src/models/inventory.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Produto ---
// O estoque é contado em embalagens (packs); cada pack tem `quantity_per_pack` itens.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,

    #[schema(example = "Seringa 5ml")]
    pub name: String,

    #[schema(example = "SER-5ML")]
    pub sku: String,

    // Em packs. Nunca negativo (CHECK no banco).
    #[schema(example = 10)]
    pub stock_quantity: i32,

    // Itens por pack. Nulo significa 1.
    #[schema(example = 12)]
    pub quantity_per_pack: Option<i32>,

    // Valores em centavos
    pub sale_price: i64,
    pub cost_price: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn pack_size(&self) -> i64 {
        match self.quantity_per_pack {
            Some(n) if n > 0 => i64::from(n),
            _ => 1,
        }
    }
}

// --- Venda ---
// Registro imutável: criado uma vez por venda e nunca alterado.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    pub product_id: Uuid,

    // Itens individuais, não packs
    pub quantity: i32,
    pub unit_price: i64,
    pub cost_price: i64,
    pub total_amount: i64,
    pub profit: i64,

    pub sold_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// O que o serviço entrega ao store para inserir
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSale {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
    pub cost_price: i64,
    pub total_amount: i64,
    pub profit: i64,
    pub sold_by: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalePayload {
    #[validate(required(message = "The field 'productId' is required."))]
    pub product_id: Option<Uuid>,

    #[validate(
        required(message = "Quantity must be a positive integer."),
        range(min = 1, max = 1_000_000, message = "Quantity must be a positive integer.")
    )]
    #[serde(default, deserialize_with = "crate::models::lenient")]
    #[schema(value_type = i32, example = 5)]
    pub quantity: Option<i32>,

    #[validate(
        required(message = "Unit price must be a non-negative amount."),
        range(min = 0i64, max = 1_000_000_000_000i64, message = "Unit price cannot be negative.")
    )]
    #[serde(default, deserialize_with = "crate::models::lenient")]
    #[schema(value_type = i64, example = 1000)]
    pub unit_price: Option<i64>,

    #[validate(
        required(message = "Cost price must be a non-negative amount."),
        range(min = 0i64, max = 1_000_000_000_000i64, message = "Cost price cannot be negative.")
    )]
    #[serde(default, deserialize_with = "crate::models::lenient")]
    #[schema(value_type = i64, example = 600)]
    pub cost_price: Option<i64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, message = "The name is required."))]
    pub name: String,

    #[validate(length(min = 1, message = "The SKU is required."))]
    pub sku: String,

    #[validate(range(min = 0, message = "Stock cannot be negative."))]
    #[serde(default)]
    pub stock_quantity: i32,

    #[validate(range(min = 1, message = "Items per pack must be at least 1."))]
    pub quantity_per_pack: Option<i32>,

    #[validate(range(min = 0i64, max = 1_000_000_000_000i64, message = "Price cannot be negative."))]
    #[serde(default)]
    pub sale_price: i64,

    #[validate(range(min = 0i64, max = 1_000_000_000_000i64, message = "Price cannot be negative."))]
    #[serde(default)]
    pub cost_price: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestockPayload {
    #[validate(
        required(message = "Packs must be a positive integer."),
        range(min = 1, max = 1_000_000, message = "Packs must be a positive integer.")
    )]
    #[serde(default, deserialize_with = "crate::models::lenient")]
    #[schema(value_type = i32, example = 4)]
    pub packs: Option<i32>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SaleQuery {
    pub product_id: Option<Uuid>,
}
