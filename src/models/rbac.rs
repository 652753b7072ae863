// src/models/rbac.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// O que sai do banco (Tabela roles)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: Uuid,

    #[schema(example = "receptionist")]
    pub name: String,

    #[schema(example = "Agenda, pacientes e recebimentos")]
    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
}

// O que sai do banco (Tabela permissions). Único por (module, action).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: Uuid,

    #[schema(example = "inventory")]
    pub module: String,

    #[schema(example = "create")]
    pub action: String,
}

// Um par (módulo, ação) sem identidade de banco
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct PermissionPair {
    #[schema(example = "inventory")]
    pub module: String,
    #[schema(example = "read")]
    pub action: String,
}

impl PermissionPair {
    pub fn new(module: &str, action: &str) -> Self {
        Self {
            module: module.to_string(),
            action: action.to_string(),
        }
    }
}

impl From<&Permission> for PermissionPair {
    fn from(p: &Permission) -> Self {
        PermissionPair::new(&p.module, &p.action)
    }
}

// O Payload para criar um cargo
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRolePayload {
    #[validate(length(min = 1, max = 64, message = "The role name is required."))]
    #[schema(example = "stock-assistant")]
    pub name: String,

    pub description: Option<String>,

    #[schema(example = json!([{"module": "inventory", "action": "read"}]))]
    pub permissions: Vec<PermissionPair>,
}

// Resposta completa (Cargo + Lista de Permissões)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    #[serde(flatten)]
    pub role: Role,

    pub permissions: Vec<PermissionPair>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PermissionCheckQuery {
    pub module: String,
    pub action: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionCheckResponse {
    pub module: String,
    pub action: String,
    pub allowed: bool,
}
