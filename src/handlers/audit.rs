// src/handlers/audit.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, rbac::RequirePermission},
    models::audit::{AuditLogEntry, AuditLogQuery},
    services::rbac_service::PermAuditRead,
};

// GET /api/audit-logs?module=..&userId=..&limit=..
#[utoipa::path(
    get,
    path = "/api/audit-logs",
    tag = "Audit",
    params(AuditLogQuery),
    responses((status = 200, body = [AuditLogEntry]), (status = 403)),
    security(("api_jwt" = []))
)]
pub async fn list_audit_logs(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePermission(grant): RequirePermission<PermAuditRead>,
    Query(query): Query<AuditLogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = app_state
        .audit_logger
        .list(&grant, query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(entries))
}
