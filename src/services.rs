pub mod audit_service;
pub mod auth;
pub mod billing_service;
pub mod inventory_service;
pub mod product_cache;
pub mod rbac_service;
