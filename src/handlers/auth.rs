// src/handlers/auth.rs

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, payload::Payload, rbac::RequirePermission},
    models::auth::{AssignRolePayload, AuthResponse, LoginUserPayload, User},
    services::rbac_service::PermSettingsUpdate,
};

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Token de acesso", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    Payload(payload): Payload<LoginUserPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    let token = app_state
        .auth_service
        .login_user(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(AuthResponse { token }))
}

// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses((status = 200, body = User), (status = 401)),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}

// PUT /api/users/{id}/role
#[utoipa::path(
    put,
    path = "/api/users/{id}/role",
    tag = "Users",
    params(("id" = Uuid, Path, description = "Usuário que recebe o cargo")),
    request_body = AssignRolePayload,
    responses((status = 200, body = User), (status = 403), (status = 404)),
    security(("api_jwt" = []))
)]
pub async fn assign_role(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePermission(grant): RequirePermission<PermSettingsUpdate>,
    Path(user_id): Path<Uuid>,
    Payload(payload): Payload<AssignRolePayload>,
) -> Result<Json<User>, ApiError> {
    let user = app_state
        .rbac_service
        .assign_role(&grant, user_id, payload.role_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(user))
}
