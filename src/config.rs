// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    common::i18n::I18nStore,
    db::Stores,
    services::{
        audit_service::AuditLogger, auth::AuthService, billing_service::BillingService,
        inventory_service::InventoryService, rbac_service::RbacService,
    },
};

// Configuração lida do ambiente (.env + variáveis)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub token_ttl_hours: i64,
}

fn var_or<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{} inválida ({}): {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000".to_string())?,
            db_max_connections: var_or("DB_MAX_CONNECTIONS", 5)?,
            token_ttl_hours: var_or("TOKEN_TTL_HOURS", 24 * 7)?,
        })
    }

    pub async fn connect(&self) -> anyhow::Result<PgPool> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let pool = PgPoolOptions::new()
            .max_connections(self.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&self.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Ok(pool)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub i18n_store: I18nStore,
    pub audit_logger: AuditLogger,
    pub auth_service: AuthService,
    pub rbac_service: RbacService,
    pub inventory_service: InventoryService,
    pub billing_service: BillingService,
}

impl AppState {
    // --- Monta o gráfico de dependências ---
    pub fn from_stores(stores: Stores, jwt_secret: String, token_ttl: chrono::Duration) -> Self {
        let audit_logger = AuditLogger::new(stores.audit);

        let auth_service = AuthService::new(
            stores.users.clone(),
            audit_logger.clone(),
            jwt_secret,
            token_ttl,
        );
        let rbac_service = RbacService::new(stores.rbac, stores.users, audit_logger.clone());
        let inventory_service = InventoryService::new(stores.inventory, audit_logger.clone());
        let billing_service = BillingService::new(stores.billing, audit_logger.clone());

        Self {
            i18n_store: I18nStore::default(),
            audit_logger,
            auth_service,
            rbac_service,
            inventory_service,
            billing_service,
        }
    }

    pub fn postgres(pool: PgPool, config: &Config) -> Self {
        Self::from_stores(
            Stores::postgres(pool),
            config.jwt_secret.clone(),
            chrono::Duration::hours(config.token_ttl_hours),
        )
    }
}
