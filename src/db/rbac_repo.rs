// src/db/rbac_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RbacStore,
    models::rbac::{Permission, PermissionPair, Role},
};

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

// Separa os pares em dois arrays para usar com UNNEST
fn split_pairs(pairs: &[PermissionPair]) -> (Vec<String>, Vec<String>) {
    pairs
        .iter()
        .map(|p| (p.module.clone(), p.action.clone()))
        .unzip()
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Vincular Cargo <-> Permissões (só os pares que existem no catálogo do banco)
    async fn grant_pairs<'e, E>(
        &self,
        executor: E,
        role_id: Uuid,
        pairs: &[PermissionPair],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (modules, actions) = split_pairs(pairs);

        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            SELECT $1, p.id
            FROM permissions p
            WHERE (p.module, p.action) IN (
                SELECT m, a FROM UNNEST($2::text[], $3::text[]) AS t(m, a)
            )
            ON CONFLICT DO NOTHING
            "#,
        )
            .bind(role_id)
            .bind(modules)
            .bind(actions)
            .execute(executor)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl RbacStore for RbacRepository {
    async fn role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>, AppError> {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.id, p.module, p.action
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            "#,
        )
            .bind(role_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(permissions)
    }

    // Listar todas as permissões disponíveis (para o Frontend montar a tela)
    async fn list_permissions(&self) -> Result<Vec<Permission>, AppError> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT id, module, action FROM permissions ORDER BY module, action",
        )
            .fetch_all(&self.pool)
            .await?;

        Ok(permissions)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, name, description, created_at FROM roles ORDER BY name",
        )
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    async fn find_role(&self, id: Uuid) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, description, created_at FROM roles WHERE id = $1",
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role)
    }

    async fn create_role(
        &self,
        name: &str,
        description: Option<&str>,
        permissions: &[PermissionPair],
    ) -> Result<Role, AppError> {
        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria o Cargo
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at
            "#,
        )
            .bind(name)
            .bind(description)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::RoleNameAlreadyExists(name.to_string());
                    }
                }
                e.into()
            })?;

        // 3. Salva o Vínculo
        if !permissions.is_empty() {
            self.grant_pairs(&mut *tx, role.id, permissions).await?;
        }

        // 4. Commit
        tx.commit().await?;

        Ok(role)
    }

    async fn sync_catalog(
        &self,
        catalog: &[PermissionPair],
        admin_role: &str,
    ) -> Result<Role, AppError> {
        let mut tx = self.pool.begin().await?;

        let (modules, actions) = split_pairs(catalog);

        // 1. Todo par do catálogo vira uma linha em permissions (idempotente)
        sqlx::query(
            r#"
            INSERT INTO permissions (module, action)
            SELECT m, a FROM UNNEST($1::text[], $2::text[]) AS t(m, a)
            ON CONFLICT (module, action) DO NOTHING
            "#,
        )
            .bind(modules)
            .bind(actions)
            .execute(&mut *tx)
            .await?;

        // 2. O cargo administrador existe...
        let admin = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, description)
            VALUES ($1, 'Full access to every module')
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, description, created_at
            "#,
        )
            .bind(admin_role)
            .fetch_one(&mut *tx)
            .await?;

        // 3. ...e recebe o catálogo inteiro
        self.grant_pairs(&mut *tx, admin.id, catalog).await?;

        tx.commit().await?;

        Ok(admin)
    }
}
