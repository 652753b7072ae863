// src/services/inventory_service.rs

use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::InventoryStore,
    models::{
        audit::{AuditAction, FieldChange, NewAuditLog},
        inventory::{
            CreateProductPayload, CreateSalePayload, NewSale, Product, RestockPayload, Sale,
            SaleQuery,
        },
    },
    services::{
        audit_service::{format_changes, snapshot, AuditLogger},
        product_cache::ProductListCache,
        rbac_service::{Grant, PermInventoryCreate, PermInventoryRead, PermInventoryUpdate},
    },
};

/// O resultado do cálculo de uma venda, antes de qualquer escrita.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalePlan {
    pub packs_needed: i32,
    pub remaining_stock: i32,
    pub total_amount: i64,
    pub profit: i64,
}

/// Regra da venda: valida o saldo em itens e converte para packs.
///
/// Um pack aberto é baixado por inteiro (arredonda para cima); os itens que
/// sobram nele não são rastreados.
pub fn plan_sale(
    product: &Product,
    quantity: i32,
    unit_price: i64,
    cost_price: i64,
) -> Result<SalePlan, AppError> {
    let pack_size = product.pack_size();
    let quantity = i64::from(quantity);

    let available_items = i64::from(product.stock_quantity) * pack_size;
    if available_items < quantity {
        return Err(AppError::InsufficientStock);
    }

    // ceil(quantity / pack_size)
    let packs_needed = (quantity + pack_size - 1) / pack_size;
    let packs_needed = i32::try_from(packs_needed).map_err(|_| AppError::InsufficientStock)?;

    Ok(SalePlan {
        packs_needed,
        remaining_stock: product.stock_quantity - packs_needed,
        total_amount: unit_price * quantity,
        profit: (unit_price - cost_price) * quantity,
    })
}

fn required(field: &'static str) -> AppError {
    AppError::invalid_field(field, "required", format!("The field '{field}' is required."))
}

#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn InventoryStore>,
    audit: AuditLogger,
    cache: ProductListCache,
}

impl InventoryService {
    pub fn new(store: Arc<dyn InventoryStore>, audit: AuditLogger) -> Self {
        Self {
            store,
            audit,
            cache: ProductListCache::new(),
        }
    }

    // --- LISTAGEM (com cache) ---
    pub async fn list_products(
        &self,
        _grant: &Grant<PermInventoryRead>,
    ) -> Result<Arc<Vec<Product>>, AppError> {
        let (generation, cached) = self.cache.get().await;
        if let Some(products) = cached {
            return Ok(products);
        }

        let products = Arc::new(self.store.list_products().await?);
        self.cache.put(generation, products.clone()).await;
        Ok(products)
    }

    pub async fn list_sales(
        &self,
        _grant: &Grant<PermInventoryRead>,
        query: SaleQuery,
    ) -> Result<Vec<Sale>, AppError> {
        self.store.list_sales(query.product_id).await
    }

    // --- CREATE PRODUCT ---
    pub async fn create_product(
        &self,
        grant: &Grant<PermInventoryCreate>,
        payload: CreateProductPayload,
    ) -> Result<Product, AppError> {
        payload.validate()?;

        let product = self.store.create_product(&payload).await?;
        self.cache.invalidate().await;

        self.audit
            .record(
                NewAuditLog::new(grant.user_id(), AuditAction::Create, "inventory")
                    .entity(product.id, product.name.clone()),
            )
            .await;

        Ok(product)
    }

    // --- RESTOCK (ENTRADA EM PACKS) ---
    pub async fn restock(
        &self,
        grant: &Grant<PermInventoryUpdate>,
        product_id: Uuid,
        payload: RestockPayload,
    ) -> Result<Product, AppError> {
        payload.validate()?;
        let packs = payload.packs.ok_or_else(|| required("packs"))?;

        // O store recusa (erro no campo `packs`) se o total passar de i32::MAX.
        let product = self
            .store
            .restock(product_id, packs)
            .await?
            .ok_or(AppError::ProductNotFound)?;
        self.cache.invalidate().await;

        let mut changes = crate::models::audit::Changes::new();
        changes.insert(
            "stockQuantity".to_string(),
            FieldChange {
                before: Some(json!(product.stock_quantity - packs)),
                after: Some(json!(product.stock_quantity)),
            },
        );

        self.audit
            .record(
                NewAuditLog::new(grant.user_id(), AuditAction::Update, "inventory")
                    .entity(product.id, product.name.clone())
                    .changes(changes),
            )
            .await;

        Ok(product)
    }

    // --- SELL (VENDA) ---
    /// Valida, calcula e grava a venda e a baixa de estoque numa única transação.
    pub async fn create_sale(
        &self,
        grant: &Grant<PermInventoryCreate>,
        payload: CreateSalePayload,
    ) -> Result<Sale, AppError> {
        // 1. Validação (todos os campos de uma vez)
        payload.validate()?;
        let product_id = payload.product_id.ok_or_else(|| required("product_id"))?;
        let quantity = payload.quantity.ok_or_else(|| required("quantity"))?;
        let unit_price = payload.unit_price.ok_or_else(|| required("unit_price"))?;
        let cost_price = payload.cost_price.ok_or_else(|| required("cost_price"))?;

        // 2. Inicia Transação. Qualquer `?` daqui até o commit faz rollback no drop.
        let mut tx = self.store.begin_sale().await?;

        let product = tx
            .find_product_for_update(product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        // 3. Regra de negócio (saldo, packs, totais)
        let plan = plan_sale(&product, quantity, unit_price, cost_price)?;

        // 4. Escritas
        let sale = tx
            .insert_sale(&NewSale {
                product_id,
                quantity,
                unit_price,
                cost_price,
                total_amount: plan.total_amount,
                profit: plan.profit,
                sold_by: grant.user_id(),
            })
            .await?;

        let updated = tx.decrement_stock(product_id, plan.packs_needed).await?;

        // 5. Commit
        tx.commit().await?;

        tracing::info!(
            sale_id = %sale.id,
            product_id = %product_id,
            quantity = sale.quantity,
            packs = plan.packs_needed,
            "Venda registrada"
        );

        // Efeitos colaterais depois do commit
        self.cache.invalidate().await;

        let changes = format_changes(
            &snapshot(&json!({ "stockQuantity": product.stock_quantity })),
            &snapshot(&json!({ "stockQuantity": updated.stock_quantity })),
        );
        self.audit
            .record(
                NewAuditLog::new(grant.user_id(), AuditAction::Create, "inventory")
                    .entity(sale.id, product.name.clone())
                    .changes(changes),
            )
            .await;

        Ok(sale)
    }
}
