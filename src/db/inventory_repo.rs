// src/db/inventory_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{stock_overflow, InventoryStore, SaleTransaction},
    models::inventory::{CreateProductPayload, NewSale, Product, Sale},
};

const PRODUCT_COLUMNS: &str = "id, name, sku, stock_quantity, quantity_per_pack, \
                               sale_price, cost_price, created_at, updated_at";

const SALE_COLUMNS: &str = "id, product_id, quantity, unit_price, cost_price, \
                            total_amount, profit, sold_by, created_at";

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryStore for InventoryRepository {
    async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name ASC"
        ))
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn create_product(&self, input: &CreateProductPayload) -> Result<Product, AppError> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (name, sku, stock_quantity, quantity_per_pack, sale_price, cost_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
            .bind(&input.name)
            .bind(&input.sku)
            .bind(input.stock_quantity)
            .bind(input.quantity_per_pack)
            .bind(input.sale_price)
            .bind(input.cost_price)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::UniqueConstraintViolation("sku".into());
                    }
                }
                e.into()
            })
    }

    /// Entrada de estoque em packs. O UPDATE é atômico, sem leitura prévia.
    /// Se o total passar do limite do INTEGER, o erro sai no campo `packs`.
    async fn restock(&self, product_id: Uuid, packs: i32) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
            .bind(product_id)
            .bind(packs)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                // 22003: numeric_value_out_of_range (INTEGER estourou)
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.code().as_deref() == Some("22003") {
                        return stock_overflow();
                    }
                }
                e.into()
            })?;
        Ok(product)
    }

    async fn list_sales(&self, product_id: Option<Uuid>) -> Result<Vec<Sale>, AppError> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {SALE_COLUMNS}
            FROM sales
            WHERE ($1::uuid IS NULL OR product_id = $1)
            ORDER BY created_at DESC
            "#
        ))
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }

    async fn begin_sale(&self) -> Result<Box<dyn SaleTransaction>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSaleTransaction { tx }))
    }
}

// ---
// Transação de venda
// ---
// Se o Box for descartado sem commit, o sqlx faz rollback no drop.
pub struct PgSaleTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SaleTransaction for PgSaleTransaction {
    async fn find_product_for_update(&mut self, id: Uuid) -> Result<Option<Product>, AppError> {
        // FOR UPDATE: vendas concorrentes do mesmo produto esperam aqui
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(product)
    }

    async fn insert_sale(&mut self, sale: &NewSale) -> Result<Sale, AppError> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            r#"
            INSERT INTO sales (product_id, quantity, unit_price, cost_price, total_amount, profit, sold_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {SALE_COLUMNS}
            "#
        ))
            .bind(sale.product_id)
            .bind(sale.quantity)
            .bind(sale.unit_price)
            .bind(sale.cost_price)
            .bind(sale.total_amount)
            .bind(sale.profit)
            .bind(sale.sold_by)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(sale)
    }

    async fn decrement_stock(&mut self, product_id: Uuid, packs: i32) -> Result<Product, AppError> {
        // A condição `stock_quantity >= $2` mantém o invariante mesmo sem o lock
        sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity - $2, updated_at = NOW()
            WHERE id = $1 AND stock_quantity >= $2
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
            .bind(product_id)
            .bind(packs)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or(AppError::InsufficientStock)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}
