// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    services::rbac_service::{Grant, PermissionDef},
};

/// O Extractor (Guardião). Entrega o `Grant<T>` que os services exigem.
pub struct RequirePermission<T: PermissionDef>(pub Grant<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);

        // A. Extrai Usuário
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::NotAuthenticated)
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        // B. Verifica no Banco (falha fechada)
        let grant = app_state
            .rbac_service
            .authorize::<T>(user.0.id)
            .await
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        Ok(RequirePermission(grant))
    }
}
