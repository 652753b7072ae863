// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    // Tudo daqui para baixo exige sessão válida
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/{id}/role", put(handlers::auth::assign_role));

    let inventory_routes = Router::new()
        .route(
            "/products",
            get(handlers::inventory::list_products).post(handlers::inventory::create_product),
        )
        .route("/products/{id}/restock", post(handlers::inventory::restock))
        .route(
            "/sales",
            get(handlers::inventory::list_sales).post(handlers::inventory::create_sale),
        );

    let protected = Router::new()
        .nest("/users", user_routes)
        .nest("/inventory", inventory_routes)
        .route("/permissions", get(handlers::rbac::list_permissions))
        .route("/permissions/check", get(handlers::rbac::check_permission))
        .route(
            "/roles",
            get(handlers::rbac::list_roles).post(handlers::rbac::create_role),
        )
        .route(
            "/patients",
            get(handlers::billing::list_patients).post(handlers::billing::create_patient),
        )
        .route("/patients/{id}", get(handlers::billing::get_patient))
        .route("/patients/{id}/balance", get(handlers::billing::patient_balance))
        .route("/payment-plans", post(handlers::billing::create_payment_plan))
        .route(
            "/payment-plans/{id}/cancel",
            post(handlers::billing::cancel_payment_plan),
        )
        .route("/payments", post(handlers::billing::record_payment))
        .route("/audit-logs", get(handlers::audit::list_audit_logs))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let api_routes = Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/auth", auth_routes)
        .merge(protected);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .with_state(app_state)
}
