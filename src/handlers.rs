pub mod audit;
pub mod auth;
pub mod billing;
pub mod inventory;
pub mod rbac;
