// src/db/audit_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::AuditStore,
    models::audit::{AuditLogEntry, AuditLogQuery, NewAuditLog},
};

// Tabela append-only: só INSERT e SELECT
#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for AuditRepository {
    async fn insert(&self, entry: &NewAuditLog) -> Result<AuditLogEntry, AppError> {
        let changes = entry
            .changes
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(anyhow::Error::from)?;

        let row = sqlx::query_as::<_, AuditLogEntry>(
            r#"
            INSERT INTO audit_logs (user_id, action, module, entity_id, entity_name, changes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, action, module, entity_id, entity_name, changes, created_at
            "#,
        )
            .bind(entry.user_id)
            .bind(entry.action)
            .bind(&entry.module)
            .bind(entry.entity_id.as_deref())
            .bind(entry.entity_name.as_deref())
            .bind(changes)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn list(&self, query: &AuditLogQuery, limit: i64) -> Result<Vec<AuditLogEntry>, AppError> {
        let rows = sqlx::query_as::<_, AuditLogEntry>(
            r#"
            SELECT id, user_id, action, module, entity_id, entity_name, changes, created_at
            FROM audit_logs
            WHERE ($1::text IS NULL OR module = $1)
              AND ($2::uuid IS NULL OR user_id = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
            .bind(query.module.as_deref())
            .bind(query.user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
