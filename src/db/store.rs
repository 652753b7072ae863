// src/db/store.rs
//
// As "portas" de acesso a dados. Os services só conhecem estes traits;
// as implementações Postgres ficam nos *_repo.rs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        audit::{AuditLogEntry, AuditLogQuery, NewAuditLog},
        auth::User,
        billing::{
            CreatePatientPayload, NewPayment, Patient, Payment, PaymentPlan, PaymentPlanStatus,
        },
        inventory::{CreateProductPayload, NewSale, Product, Sale},
        rbac::{Permission, PermissionPair, Role},
    },
};

/// Recusa de restock que estouraria o INTEGER de `stock_quantity`.
pub fn stock_overflow() -> AppError {
    AppError::invalid_field("packs", "stock_overflow", "Restock would exceed the maximum stock.")
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> Result<User, AppError>;
}

#[async_trait]
pub trait RbacStore: Send + Sync {
    async fn role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>, AppError>;
    async fn list_permissions(&self) -> Result<Vec<Permission>, AppError>;
    async fn list_roles(&self) -> Result<Vec<Role>, AppError>;
    async fn find_role(&self, id: Uuid) -> Result<Option<Role>, AppError>;

    /// Cria o cargo e os vínculos com as permissões na mesma transação.
    async fn create_role(
        &self,
        name: &str,
        description: Option<&str>,
        permissions: &[PermissionPair],
    ) -> Result<Role, AppError>;

    /// Garante que todo par do catálogo existe em `permissions` e que o cargo
    /// `admin_role` possui todos eles.
    async fn sync_catalog(
        &self,
        catalog: &[PermissionPair],
        admin_role: &str,
    ) -> Result<Role, AppError>;
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, AppError>;
    async fn create_product(&self, input: &CreateProductPayload) -> Result<Product, AppError>;
    async fn restock(&self, product_id: Uuid, packs: i32) -> Result<Option<Product>, AppError>;
    async fn list_sales(&self, product_id: Option<Uuid>) -> Result<Vec<Sale>, AppError>;
    async fn begin_sale(&self) -> Result<Box<dyn SaleTransaction>, AppError>;
}

/// Unidade de trabalho da venda. Se for descartada sem `commit`, nada persiste.
#[async_trait]
pub trait SaleTransaction: Send {
    /// Lê o produto travando a linha até o fim da transação.
    async fn find_product_for_update(&mut self, id: Uuid) -> Result<Option<Product>, AppError>;
    async fn insert_sale(&mut self, sale: &NewSale) -> Result<Sale, AppError>;
    async fn decrement_stock(&mut self, product_id: Uuid, packs: i32) -> Result<Product, AppError>;
    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}

#[async_trait]
pub trait BillingStore: Send + Sync {
    async fn create_patient(&self, input: &CreatePatientPayload) -> Result<Patient, AppError>;
    async fn list_patients(&self) -> Result<Vec<Patient>, AppError>;
    async fn find_patient(&self, id: Uuid) -> Result<Option<Patient>, AppError>;

    async fn create_plan(
        &self,
        patient_id: Uuid,
        description: &str,
        total_amount: i64,
        installments: i32,
    ) -> Result<PaymentPlan, AppError>;
    async fn list_plans_for_patient(&self, patient_id: Uuid) -> Result<Vec<PaymentPlan>, AppError>;

    /// Pagamento avulso (sem plano)
    async fn insert_payment(&self, payment: &NewPayment) -> Result<Payment, AppError>;
    async fn begin_payment(&self) -> Result<Box<dyn PaymentTransaction>, AppError>;
}

#[async_trait]
pub trait PaymentTransaction: Send {
    async fn find_plan_for_update(&mut self, id: Uuid) -> Result<Option<PaymentPlan>, AppError>;
    async fn insert_payment(&mut self, payment: &NewPayment) -> Result<Payment, AppError>;
    async fn update_plan(
        &mut self,
        id: Uuid,
        paid_amount: i64,
        status: PaymentPlanStatus,
    ) -> Result<PaymentPlan, AppError>;
    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert(&self, entry: &NewAuditLog) -> Result<AuditLogEntry, AppError>;
    async fn list(&self, query: &AuditLogQuery, limit: i64) -> Result<Vec<AuditLogEntry>, AppError>;
}
