//! Data plane operations
//!
//! Server-level administration (creating and dropping tenant databases) runs on the
//! registry's connection, which must belong to a role with `CREATEDB`. Operations that
//! target one tenant database receive that tenant's pool from the connection router.

use async_trait::async_trait;
use hirebase_core::models::{NewTenantUser, TenantUser};
use hirebase_core::validation::is_safe_database_name;
use hirebase_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::errors::tenant_error;
use crate::db::tenant::{apply_tenant_schema, TenantUserRepository};

#[async_trait]
pub trait DataPlane: Send + Sync {
    /// Whether the server catalog already holds a database with this name
    async fn database_exists(&self, database_name: &str) -> Result<bool, AppError>;

    async fn create_database(&self, database_name: &str) -> Result<(), AppError>;

    /// Terminate open connections and drop the database if present
    async fn drop_database(&self, database_name: &str) -> Result<(), AppError>;

    /// Apply the versioned tenant schema, returning the applied version
    async fn apply_schema(&self, pool: &PgPool) -> Result<i32, AppError>;

    /// Create a user; an email already present in that database is a `Conflict`.
    async fn create_user(&self, pool: &PgPool, user: NewTenantUser)
        -> Result<TenantUser, AppError>;

    async fn find_user_by_email(
        &self,
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<TenantUser>, AppError>;

    async fn find_user_by_id(&self, pool: &PgPool, id: Uuid)
        -> Result<Option<TenantUser>, AppError>;
}

/// Postgres data plane
#[derive(Clone)]
pub struct PgDataPlane {
    admin_pool: PgPool,
}

impl PgDataPlane {
    pub fn new(admin_pool: PgPool) -> Self {
        Self { admin_pool }
    }
}

fn ensure_safe_name(database_name: &str) -> Result<(), AppError> {
    if !is_safe_database_name(database_name) {
        return Err(AppError::InvalidInput(format!(
            "Refusing to operate on database '{}'",
            database_name
        )));
    }
    Ok(())
}

#[async_trait]
impl DataPlane for PgDataPlane {
    async fn database_exists(&self, database_name: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
                .bind(database_name)
                .fetch_one(&self.admin_pool)
                .await
                .map_err(|e| tenant_error("check database catalog", e))?;
        Ok(exists)
    }

    async fn create_database(&self, database_name: &str) -> Result<(), AppError> {
        ensure_safe_name(database_name)?;

        // CREATE DATABASE cannot take bind parameters; the name is validated above.
        sqlx::query(&format!(r#"CREATE DATABASE "{}""#, database_name))
            .execute(&self.admin_pool)
            .await
            .map_err(|e| tenant_error("create database", e))?;

        tracing::info!(database = %database_name, "Created tenant database");
        Ok(())
    }

    async fn drop_database(&self, database_name: &str) -> Result<(), AppError> {
        ensure_safe_name(database_name)?;

        sqlx::query(
            r#"
            SELECT pg_terminate_backend(pid)
            FROM pg_stat_activity
            WHERE datname = $1 AND pid <> pg_backend_pid()
            "#,
        )
        .bind(database_name)
        .execute(&self.admin_pool)
        .await
        .map_err(|e| tenant_error("terminate tenant connections", e))?;

        sqlx::query(&format!(r#"DROP DATABASE IF EXISTS "{}""#, database_name))
            .execute(&self.admin_pool)
            .await
            .map_err(|e| tenant_error("drop database", e))?;

        tracing::info!(database = %database_name, "Dropped tenant database");
        Ok(())
    }

    async fn apply_schema(&self, pool: &PgPool) -> Result<i32, AppError> {
        apply_tenant_schema(pool).await
    }

    async fn create_user(
        &self,
        pool: &PgPool,
        user: NewTenantUser,
    ) -> Result<TenantUser, AppError> {
        let users = TenantUserRepository::new(pool.clone());
        if users.get_by_email(&user.email).await?.is_some() {
            return Err(AppError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }
        users.create(&user).await
    }

    async fn find_user_by_email(
        &self,
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<TenantUser>, AppError> {
        TenantUserRepository::new(pool.clone())
            .get_by_email(email)
            .await
    }

    async fn find_user_by_id(
        &self,
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<TenantUser>, AppError> {
        TenantUserRepository::new(pool.clone()).get_by_id(id).await
    }
}
