// src/models/audit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

// Conjunto fechado de ações auditáveis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "audit_action", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Login,
    Logout,
    View,
    Export,
    Upload,
    Download,
    Lock,
    Unlock,
}

// Linha append-only da tabela audit_logs
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: AuditAction,
    #[schema(example = "inventory")]
    pub module: String,
    pub entity_id: Option<String>,
    pub entity_name: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub changes: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

// "Antes" ausente é `None` (o campo não existia naquele snapshot)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
}

pub type Changes = BTreeMap<String, FieldChange>;

#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub user_id: Option<Uuid>,
    pub action: AuditAction,
    pub module: String,
    pub entity_id: Option<String>,
    pub entity_name: Option<String>,
    pub changes: Option<Changes>,
}

impl NewAuditLog {
    pub fn new(user_id: Uuid, action: AuditAction, module: &str) -> Self {
        Self {
            user_id: Some(user_id),
            action,
            module: module.to_string(),
            entity_id: None,
            entity_name: None,
            changes: None,
        }
    }

    pub fn entity(mut self, id: impl ToString, name: impl Into<String>) -> Self {
        self.entity_id = Some(id.to_string());
        self.entity_name = Some(name.into());
        self
    }

    pub fn changes(mut self, changes: Changes) -> Self {
        if !changes.is_empty() {
            self.changes = Some(changes);
        }
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AuditLogQuery {
    pub module: Option<String>,
    pub user_id: Option<Uuid>,
    pub limit: Option<i64>,
}
