use hirebase_core::models::{NewTenantDatabase, TenantDatabase, TenantDatabaseStatus};
use hirebase_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::errors::registry_error;

#[derive(Clone)]
pub struct TenantDatabaseRepository {
    pool: PgPool,
}

impl TenantDatabaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, record: &NewTenantDatabase) -> Result<TenantDatabase, AppError> {
        let created = sqlx::query_as::<_, TenantDatabase>(
            r#"
            INSERT INTO tenant_databases (company_id, database_name, host, port, db_user, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, company_id, database_name, host, port, db_user, status, provisioned_at
            "#,
        )
        .bind(record.company_id)
        .bind(&record.database_name)
        .bind(&record.host)
        .bind(record.port)
        .bind(&record.db_user)
        .bind(record.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| registry_error("record tenant database", e))?;

        tracing::info!(
            company_id = %created.company_id,
            database = %created.database_name,
            "Recorded tenant database"
        );
        Ok(created)
    }

    /// Mapping for a company, whatever its status
    pub async fn get_by_company(&self, company_id: Uuid) -> Result<Option<TenantDatabase>, AppError> {
        sqlx::query_as::<_, TenantDatabase>(
            r#"
            SELECT id, company_id, database_name, host, port, db_user, status, provisioned_at
            FROM tenant_databases
            WHERE company_id = $1
            "#,
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| registry_error("fetch tenant database", e))
    }

    pub async fn name_exists(&self, database_name: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM tenant_databases WHERE database_name = $1)",
        )
        .bind(database_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| registry_error("check tenant database name", e))?;

        Ok(exists)
    }

    pub async fn update_status(
        &self,
        company_id: Uuid,
        status: TenantDatabaseStatus,
    ) -> Result<TenantDatabase, AppError> {
        sqlx::query_as::<_, TenantDatabase>(
            r#"
            UPDATE tenant_databases
            SET status = $2
            WHERE company_id = $1
            RETURNING id, company_id, database_name, host, port, db_user, status, provisioned_at
            "#,
        )
        .bind(company_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| registry_error("update tenant database status", e))?
        .ok_or_else(|| AppError::NotFound("Tenant database not found".to_string()))
    }

    pub async fn delete_by_company(&self, company_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tenant_databases WHERE company_id = $1")
            .bind(company_id)
            .execute(&self.pool)
            .await
            .map_err(|e| registry_error("delete tenant database record", e))?;

        Ok(result.rows_affected() > 0)
    }
}
