// src/handlers/rbac.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, payload::Payload, rbac::RequirePermission},
    models::rbac::{
        CreateRolePayload, Permission, PermissionCheckQuery, PermissionCheckResponse, Role,
        RoleResponse,
    },
    services::rbac_service::{PermSettingsRead, PermSettingsUpdate},
};

// GET /api/permissions (Para o frontend saber o que mostrar na tela de criação)
#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "RBAC",
    responses((status = 200, body = [Permission]), (status = 403)),
    security(("api_jwt" = []))
)]
pub async fn list_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePermission(grant): RequirePermission<PermSettingsRead>,
) -> Result<impl IntoResponse, ApiError> {
    let permissions = app_state
        .rbac_service
        .list_permissions(&grant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(permissions))
}

// GET /api/permissions/check?module=..&action=..
// Responde sobre o próprio usuário: o frontend usa para esconder botões.
#[utoipa::path(
    get,
    path = "/api/permissions/check",
    tag = "RBAC",
    params(PermissionCheckQuery),
    responses((status = 200, body = PermissionCheckResponse)),
    security(("api_jwt" = []))
)]
pub async fn check_permission(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<PermissionCheckQuery>,
) -> Json<PermissionCheckResponse> {
    let allowed = app_state
        .rbac_service
        .check_permission(user.0.id, &query.module, &query.action)
        .await;

    Json(PermissionCheckResponse {
        module: query.module,
        action: query.action,
        allowed,
    })
}

// GET /api/roles
#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "RBAC",
    responses((status = 200, body = [Role]), (status = 403)),
    security(("api_jwt" = []))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePermission(grant): RequirePermission<PermSettingsRead>,
) -> Result<impl IntoResponse, ApiError> {
    let roles = app_state
        .rbac_service
        .list_roles(&grant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(roles))
}

// POST /api/roles
#[utoipa::path(
    post,
    path = "/api/roles",
    tag = "RBAC",
    request_body = CreateRolePayload,
    responses(
        (status = 201, body = RoleResponse),
        (status = 400, description = "Campos inválidos ou permissões desconhecidas"),
        (status = 409, description = "Nome de cargo já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_role(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePermission(grant): RequirePermission<PermSettingsUpdate>,
    Payload(payload): Payload<CreateRolePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .rbac_service
        .create_role_with_permissions(&grant, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(response)))
}
