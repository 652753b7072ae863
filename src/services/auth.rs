// src/services/auth.rs

use axum::http::{header, HeaderMap};
use axum_extra::extract::CookieJar;
use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::UserStore,
    models::{
        audit::{AuditAction, NewAuditLog},
        auth::{Claims, LoginUserPayload, User},
    },
    services::audit_service::AuditLogger,
};

/// Cookie de sessão aceito como alternativa ao header `Authorization`.
pub const SESSION_COOKIE: &str = "session";

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    audit: AuditLogger,
    jwt_secret: String,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        audit: AuditLogger,
        jwt_secret: String,
        token_ttl: Duration,
    ) -> Self {
        Self {
            users,
            audit,
            jwt_secret,
            token_ttl,
        }
    }

    pub async fn login_user(&self, payload: LoginUserPayload) -> Result<String, AppError> {
        payload.validate()?;

        let user = self
            .users
            .find_by_email(&payload.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password = payload.password;
        let password_hash = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password, &password_hash))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            tracing::warn!(user_id = %user.id, "Tentativa de login com senha inválida");
            return Err(AppError::InvalidCredentials);
        }

        self.audit
            .record(NewAuditLog::new(user.id, AuditAction::Login, "auth").entity(user.id, user.email.clone()))
            .await;

        self.issue_token(user.id)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
            .map_err(|_| AppError::InvalidToken)?;

        self.users
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    /// Resolve o usuário da requisição (Bearer ou cookie de sessão).
    /// Qualquer falha vira `None`.
    pub async fn current_user(&self, headers: &HeaderMap) -> Option<User> {
        let token = bearer_token(headers).or_else(|| {
            CookieJar::from_headers(headers)
                .get(SESSION_COOKIE)
                .map(|c| c.value().to_string())
        })?;

        match self.validate_token(&token).await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!(error = %e, "Sessão inválida");
                None
            }
        }
    }

    pub fn issue_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}
