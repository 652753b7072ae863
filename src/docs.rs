// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::assign_role,

        // --- RBAC ---
        handlers::rbac::list_permissions,
        handlers::rbac::check_permission,
        handlers::rbac::list_roles,
        handlers::rbac::create_role,

        // --- INVENTORY ---
        handlers::inventory::list_products,
        handlers::inventory::create_product,
        handlers::inventory::restock,
        handlers::inventory::list_sales,
        handlers::inventory::create_sale,

        // --- Patients / Payments ---
        handlers::billing::list_patients,
        handlers::billing::create_patient,
        handlers::billing::get_patient,
        handlers::billing::patient_balance,
        handlers::billing::create_payment_plan,
        handlers::billing::cancel_payment_plan,
        handlers::billing::record_payment,

        // --- Audit ---
        handlers::audit::list_audit_logs,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::AssignRolePayload,

            // --- RBAC ---
            models::rbac::Role,
            models::rbac::Permission,
            models::rbac::PermissionPair,
            models::rbac::CreateRolePayload,
            models::rbac::RoleResponse,
            models::rbac::PermissionCheckResponse,

            // --- Inventory ---
            models::inventory::Product,
            models::inventory::Sale,
            models::inventory::CreateProductPayload,
            models::inventory::CreateSalePayload,
            models::inventory::RestockPayload,

            // --- Billing ---
            models::billing::Patient,
            models::billing::CreatePatientPayload,
            models::billing::PaymentPlanStatus,
            models::billing::PaymentPlan,
            models::billing::CreatePaymentPlanPayload,
            models::billing::PaymentMethod,
            models::billing::Payment,
            models::billing::RecordPaymentPayload,
            models::billing::PatientBalance,

            // --- Audit ---
            models::audit::AuditAction,
            models::audit::AuditLogEntry,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação"),
        (name = "Users", description = "Dados do Usuário e Cargo"),
        (name = "RBAC", description = "Controle de Acesso (Cargos e Permissões)"),
        (name = "Inventory", description = "Produtos, Reposição e Vendas"),
        (name = "Patients", description = "Cadastro de Pacientes"),
        (name = "Payments", description = "Planos de Pagamento e Recebimentos"),
        (name = "Audit", description = "Trilha de Auditoria")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
