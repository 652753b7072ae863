// src/services/rbac_service.rs

use std::{collections::HashSet, marker::PhantomData, sync::Arc};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors, Validate};

use crate::{
    common::error::AppError,
    db::{RbacStore, UserStore},
    models::{
        audit::{AuditAction, FieldChange, NewAuditLog},
        auth::User,
        rbac::{CreateRolePayload, Permission, PermissionPair, Role, RoleResponse},
    },
    services::audit_service::AuditLogger,
};

/// Nome do cargo que recebe o catálogo inteiro na inicialização.
pub const ADMIN_ROLE: &str = "admin";

/// Catálogo fechado de pares (módulo, ação). Pares fora daqui são negados para todos,
/// inclusive o `admin`: ele só recebe o que está listado aqui.
pub const PERMISSION_CATALOG: &[(&str, &str)] = &[
    ("patients", "create"),
    ("patients", "read"),
    ("patients", "update"),
    ("patients", "delete"),
    ("payments", "create"),
    ("payments", "read"),
    ("payments", "update"),
    ("inventory", "create"),
    ("inventory", "read"),
    ("inventory", "update"),
    ("inventory", "delete"),
    ("audit", "read"),
    ("audit", "export"),
    ("settings", "read"),
    ("settings", "update"),
];

pub fn catalog_pairs() -> Vec<PermissionPair> {
    PERMISSION_CATALOG
        .iter()
        .map(|(module, action)| PermissionPair::new(module, action))
        .collect()
}

/// O trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn module() -> &'static str;
    fn action() -> &'static str;
}

macro_rules! permission {
    ($name:ident, $module:literal, $action:literal) => {
        pub struct $name;
        impl PermissionDef for $name {
            fn module() -> &'static str {
                $module
            }
            fn action() -> &'static str {
                $action
            }
        }
    };
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---
permission!(PermPatientsCreate, "patients", "create");
permission!(PermPatientsRead, "patients", "read");
permission!(PermPaymentsCreate, "payments", "create");
permission!(PermPaymentsRead, "payments", "read");
permission!(PermPaymentsUpdate, "payments", "update");
permission!(PermInventoryCreate, "inventory", "create");
permission!(PermInventoryRead, "inventory", "read");
permission!(PermInventoryUpdate, "inventory", "update");
permission!(PermAuditRead, "audit", "read");
permission!(PermSettingsRead, "settings", "read");
permission!(PermSettingsUpdate, "settings", "update");

/// Prova de que `user_id` passou pela checagem de `P`.
///
/// Só `RbacService::authorize` constrói um `Grant`, e toda operação que altera
/// dados exige um. Esquecer a checagem vira erro de compilação.
pub struct Grant<P: PermissionDef> {
    user_id: Uuid,
    _perm: PhantomData<P>,
}

impl<P: PermissionDef> Grant<P> {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
}

impl<P: PermissionDef> std::fmt::Debug for Grant<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grant")
            .field("user_id", &self.user_id)
            .field("module", &P::module())
            .field("action", &P::action())
            .finish()
    }
}

/// Igualdade exata (case-sensitive) em módulo e ação.
pub fn role_grants(permissions: &[Permission], module: &str, action: &str) -> bool {
    permissions
        .iter()
        .any(|p| p.module == module && p.action == action)
}

#[derive(Clone)]
pub struct RbacService {
    store: Arc<dyn RbacStore>,
    users: Arc<dyn UserStore>,
    audit: AuditLogger,
}

impl RbacService {
    pub fn new(store: Arc<dyn RbacStore>, users: Arc<dyn UserStore>, audit: AuditLogger) -> Self {
        Self { store, users, audit }
    }

    /// Decide se o usuário pode executar `action` em `module`.
    /// Nunca falha: qualquer incerteza vira `false`.
    pub async fn check_permission(&self, user_id: Uuid, module: &str, action: &str) -> bool {
        let user = match self.users.find_by_id(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!(%user_id, module, action, "Permissão negada: usuário não encontrado");
                return false;
            }
            Err(e) => {
                tracing::warn!(%user_id, module, action, error = %e, "Falha ao carregar usuário para checagem de permissão");
                return false;
            }
        };

        let Some(role_id) = user.role_id else {
            tracing::warn!(%user_id, module, action, "Permissão negada: usuário sem cargo");
            return false;
        };

        match self.store.role_permissions(role_id).await {
            Ok(permissions) => {
                let allowed = role_grants(&permissions, module, action);
                if !allowed {
                    tracing::warn!(%user_id, %role_id, module, action, "Permissão negada");
                }
                allowed
            }
            Err(e) => {
                tracing::warn!(%user_id, %role_id, module, action, error = %e, "Falha ao carregar permissões do cargo");
                false
            }
        }
    }

    pub async fn authorize<P: PermissionDef>(&self, user_id: Uuid) -> Result<Grant<P>, AppError> {
        if self.check_permission(user_id, P::module(), P::action()).await {
            Ok(Grant {
                user_id,
                _perm: PhantomData,
            })
        } else {
            Err(AppError::Unauthorized)
        }
    }

    /// Sincroniza o catálogo com o banco e dá tudo ao cargo `admin`.
    pub async fn sync_catalog(&self) -> Result<Role, AppError> {
        let admin = self.store.sync_catalog(&catalog_pairs(), ADMIN_ROLE).await?;
        tracing::info!(role_id = %admin.id, permissions = PERMISSION_CATALOG.len(), "Catálogo de permissões sincronizado");
        Ok(admin)
    }

    pub async fn list_permissions(
        &self,
        _grant: &Grant<PermSettingsRead>,
    ) -> Result<Vec<Permission>, AppError> {
        self.store.list_permissions().await
    }

    pub async fn list_roles(&self, _grant: &Grant<PermSettingsRead>) -> Result<Vec<Role>, AppError> {
        self.store.list_roles().await
    }

    pub async fn create_role_with_permissions(
        &self,
        grant: &Grant<PermSettingsUpdate>,
        payload: CreateRolePayload,
    ) -> Result<RoleResponse, AppError> {
        let mut errors = match payload.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        let catalog: HashSet<PermissionPair> = catalog_pairs().into_iter().collect();
        let unknown: Vec<String> = payload
            .permissions
            .iter()
            .filter(|p| !catalog.contains(*p))
            .map(|p| format!("{}:{}", p.module, p.action))
            .collect();

        if !unknown.is_empty() {
            let mut err = ValidationError::new("unknown_permission");
            err.message = Some(format!("Unknown permissions: {}", unknown.join(", ")).into());
            errors.add("permissions", err);
        }

        if !errors.is_empty() {
            return Err(AppError::ValidationError(errors));
        }

        // Remove duplicados mantendo a ordem
        let mut seen = HashSet::new();
        let pairs: Vec<PermissionPair> = payload
            .permissions
            .into_iter()
            .filter(|p| seen.insert(p.clone()))
            .collect();

        let role = self
            .store
            .create_role(&payload.name, payload.description.as_deref(), &pairs)
            .await?;

        self.audit
            .record(
                NewAuditLog::new(grant.user_id(), AuditAction::Create, "settings")
                    .entity(role.id, role.name.clone()),
            )
            .await;

        Ok(RoleResponse {
            role,
            permissions: pairs,
        })
    }

    /// Atribui um cargo a outro usuário. Ninguém altera o próprio cargo.
    pub async fn assign_role(
        &self,
        grant: &Grant<PermSettingsUpdate>,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<User, AppError> {
        if grant.user_id() == user_id {
            tracing::warn!(%user_id, %role_id, "Tentativa de alterar o próprio cargo");
            return Err(AppError::Unauthorized);
        }

        let role = self.store.find_role(role_id).await?.ok_or(AppError::RoleNotFound)?;
        let previous = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let updated = self.users.assign_role(user_id, role.id).await?;

        let mut changes = crate::models::audit::Changes::new();
        if previous.role_id != updated.role_id {
            changes.insert(
                "roleId".to_string(),
                FieldChange {
                    before: previous.role_id.map(|id| id.to_string().into()),
                    after: updated.role_id.map(|id| id.to_string().into()),
                },
            );
        }

        self.audit
            .record(
                NewAuditLog::new(grant.user_id(), AuditAction::Update, "settings")
                    .entity(updated.id, updated.email.clone())
                    .changes(changes),
            )
            .await;

        Ok(updated)
    }
}
