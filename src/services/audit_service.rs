// src/services/audit_service.rs

use serde::Serialize;
use serde_json::{Map, Value};
use std::{collections::BTreeSet, sync::Arc};

use crate::{
    common::error::AppError,
    db::AuditStore,
    models::audit::{AuditLogEntry, AuditLogQuery, Changes, FieldChange, NewAuditLog},
    services::rbac_service::{Grant, PermAuditRead},
};

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

/// Grava a trilha de auditoria em modo "best-effort".
#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn AuditStore>,
}

impl AuditLogger {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Nunca devolve erro: a operação que está sendo auditada já aconteceu
    /// e não pode ser desfeita nem bloqueada por falha aqui.
    pub async fn record(&self, entry: NewAuditLog) {
        if let Err(e) = self.store.insert(&entry).await {
            tracing::error!(
                user_id = ?entry.user_id,
                action = ?entry.action,
                module = %entry.module,
                entity_id = ?entry.entity_id,
                error = %e,
                "Falha ao gravar log de auditoria"
            );
        }
    }

    pub async fn list(
        &self,
        _grant: &Grant<PermAuditRead>,
        query: AuditLogQuery,
    ) -> Result<Vec<AuditLogEntry>, AppError> {
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        self.store.list(&query, limit).await
    }
}

/// Diferença entre dois snapshots planos: só as chaves cujo valor mudou,
/// considerando a união das chaves dos dois lados.
pub fn format_changes(before: &Map<String, Value>, after: &Map<String, Value>) -> Changes {
    let keys: BTreeSet<&String> = before.keys().chain(after.keys()).collect();

    keys.into_iter()
        .filter_map(|key| {
            let old = before.get(key);
            let new = after.get(key);
            (old != new).then(|| {
                (
                    key.clone(),
                    FieldChange {
                        before: old.cloned(),
                        after: new.cloned(),
                    },
                )
            })
        })
        .collect()
}

/// Serializa um valor para um mapa plano (vazio se não for um objeto).
pub fn snapshot<T: Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn diff_covers_union_of_keys() {
        let changes = format_changes(&obj(json!({"a": 1, "b": 2})), &obj(json!({"a": 1, "b": 3, "c": 4})));

        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes["b"],
            FieldChange { before: Some(json!(2)), after: Some(json!(3)) }
        );
        assert_eq!(
            changes["c"],
            FieldChange { before: None, after: Some(json!(4)) }
        );
        assert!(!changes.contains_key("a"));
    }

    #[test]
    fn removed_keys_show_up_with_empty_after() {
        let changes = format_changes(&obj(json!({"phone": "123"})), &Map::new());
        assert_eq!(
            changes["phone"],
            FieldChange { before: Some(json!("123")), after: None }
        );
    }

    #[test]
    fn identical_snapshots_have_no_changes() {
        let snap = obj(json!({"name": "Gaze", "stock": 4, "tags": ["a"]}));
        assert!(format_changes(&snap, &snap.clone()).is_empty());
    }

    #[test]
    fn explicit_null_differs_from_missing() {
        let changes = format_changes(&obj(json!({"x": null})), &Map::new());
        assert_eq!(
            changes["x"],
            FieldChange { before: Some(Value::Null), after: None }
        );
    }

    #[test]
    fn snapshot_of_non_object_is_empty() {
        assert!(snapshot(&5).is_empty());
        assert_eq!(snapshot(&json!({"k": 1}))["k"], json!(1));
    }
}
