use hirebase_core::models::{NewTenantUser, TenantUser};
use hirebase_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::errors::tenant_error;

/// Users of one company, stored in that company's database
#[derive(Clone)]
pub struct TenantUserRepository {
    pool: PgPool,
}

impl TenantUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &NewTenantUser) -> Result<TenantUser, AppError> {
        sqlx::query_as::<_, TenantUser>(
            r#"
            INSERT INTO users (email, password_hash, full_name, role)
            VALUES (LOWER($1), $2, $3, $4)
            RETURNING id, email, password_hash, full_name, role, is_active, created_at, updated_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| tenant_error("create user", e))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<TenantUser>, AppError> {
        sqlx::query_as::<_, TenantUser>(
            r#"
            SELECT id, email, password_hash, full_name, role, is_active, created_at, updated_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| tenant_error("fetch user by email", e))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<TenantUser>, AppError> {
        sqlx::query_as::<_, TenantUser>(
            r#"
            SELECT id, email, password_hash, full_name, role, is_active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| tenant_error("fetch user by id", e))
    }
}
