// src/common/error.rs

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// O erro de domínio. Services e stores devolvem sempre este tipo.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Não autenticado")]
    NotAuthenticated,

    #[error("Sem permissão")]
    Unauthorized,

    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Produto não encontrado")]
    ProductNotFound,

    #[error("Estoque insuficiente")]
    InsufficientStock,

    #[error("Paciente não encontrado")]
    PatientNotFound,

    #[error("Plano de pagamento não encontrado")]
    PaymentPlanNotFound,

    #[error("Pagamento maior que o saldo do plano")]
    PaymentExceedsBalance,

    #[error("Plano de pagamento encerrado")]
    PaymentPlanClosed,

    #[error("Cargo não encontrado")]
    RoleNotFound,

    #[error("Cargo já existe: {0}")]
    RoleNameAlreadyExists(String),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O erro que sai pela API (já traduzido)
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Corpo ilegível (JSON malformado, content-type errado) vira erro de validação do campo `body`.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::invalid_field("body", "invalid_body", rejection.body_text())
    }
}

impl AppError {
    pub fn invalid_field(
        field: &'static str,
        code: &'static str,
        message: impl Into<std::borrow::Cow<'static, str>>,
    ) -> Self {
        let mut errors = validator::ValidationErrors::new();
        errors.add(field, validator::ValidationError::new(code).with_message(message.into()));
        AppError::ValidationError(errors)
    }

    /// Chave usada para buscar a mensagem no `I18nStore`.
    pub fn key(&self) -> &'static str {
        match self {
            AppError::NotAuthenticated => "NOT_AUTHENTICATED",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::ProductNotFound => "PRODUCT_NOT_FOUND",
            AppError::InsufficientStock => "INSUFFICIENT_STOCK",
            AppError::PatientNotFound => "PATIENT_NOT_FOUND",
            AppError::PaymentPlanNotFound => "PAYMENT_PLAN_NOT_FOUND",
            AppError::PaymentExceedsBalance => "PAYMENT_EXCEEDS_BALANCE",
            AppError::PaymentPlanClosed => "PAYMENT_PLAN_CLOSED",
            AppError::RoleNotFound => "ROLE_NOT_FOUND",
            AppError::RoleNameAlreadyExists(_) => "ROLE_NAME_ALREADY_EXISTS",
            AppError::UniqueConstraintViolation(_) => "UNIQUE_CONSTRAINT_VIOLATION",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotAuthenticated | AppError::InvalidCredentials | AppError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Unauthorized => StatusCode::FORBIDDEN,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::ProductNotFound
            | AppError::PatientNotFound
            | AppError::PaymentPlanNotFound
            | AppError::RoleNotFound
            | AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::RoleNameAlreadyExists(_) | AppError::UniqueConstraintViolation(_) => {
                StatusCode::CONFLICT
            }
            AppError::InsufficientStock
            | AppError::PaymentExceedsBalance
            | AppError::PaymentPlanClosed => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de domínio em resposta HTTP no idioma do cliente.
    /// Erros de infraestrutura são logados e nunca expõem detalhes internos.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let details = match self {
            AppError::ValidationError(errors) => Some(json!(validation_details(errors))),
            AppError::RoleNameAlreadyExists(name) => Some(json!({ "name": name })),
            AppError::UniqueConstraintViolation(what) => Some(json!({ "constraint": what })),
            _ => None,
        };

        ApiError {
            status,
            error: store.get(&locale.0, self.key()),
            details,
        }
    }
}

// Todos os campos inválidos de uma vez, nunca uma lista parcial.
fn validation_details(errors: &validator::ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, field_errors)| {
            let messages = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

// Para extratores que rodam sem Locale (ex: auth_guard) respondemos em inglês.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::default())
            .into_response()
    }
}
