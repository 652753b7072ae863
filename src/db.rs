pub mod store;
pub use store::{
    stock_overflow, AuditStore, BillingStore, InventoryStore, PaymentTransaction, RbacStore,
    SaleTransaction, UserStore,
};

pub mod user_repo;
pub use user_repo::UserRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod billing_repo;
pub use billing_repo::BillingRepository;
pub mod audit_repo;
pub use audit_repo::AuditRepository;

use sqlx::PgPool;
use std::sync::Arc;

// Todos os stores de uma vez, prontos para montar o AppState
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub rbac: Arc<dyn RbacStore>,
    pub inventory: Arc<dyn InventoryStore>,
    pub billing: Arc<dyn BillingStore>,
    pub audit: Arc<dyn AuditStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            rbac: Arc::new(RbacRepository::new(pool.clone())),
            inventory: Arc::new(InventoryRepository::new(pool.clone())),
            billing: Arc::new(BillingRepository::new(pool.clone())),
            audit: Arc::new(AuditRepository::new(pool)),
        }
    }
}
