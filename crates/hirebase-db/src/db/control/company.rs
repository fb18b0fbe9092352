use hirebase_core::models::{Company, CompanyStatus, NewCompany};
use hirebase_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::errors::registry_error;

const COMPANY_COLUMNS: &str = "id, name, custom_domain, subdomain, status, contact_email, \
                               created_at, activated_at, trial_ends_at";

#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a company row. Unique violations on email or subdomain become `Conflict`.
    pub async fn create_company(&self, company: &NewCompany) -> Result<Company, AppError> {
        let created = sqlx::query_as::<_, Company>(&format!(
            r#"
            INSERT INTO companies (id, name, subdomain, status, contact_email, activated_at, trial_ends_at)
            VALUES ($1, $2, LOWER($3), $4, LOWER($5), $6, $7)
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(company.id)
        .bind(&company.name)
        .bind(&company.subdomain)
        .bind(company.status)
        .bind(&company.contact_email)
        .bind(company.activated_at)
        .bind(company.trial_ends_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| registry_error("create company", e))?;

        tracing::info!(
            company_id = %created.id,
            subdomain = ?created.subdomain,
            "Created company {}",
            created.name
        );
        Ok(created)
    }

    /// Active company by id
    pub async fn get_active_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        sqlx::query_as::<_, Company>(&format!(
            "SELECT {} FROM companies WHERE id = $1 AND status = 'active'",
            COMPANY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| registry_error("fetch company by id", e))
    }

    /// Active company by subdomain, compared case-insensitively
    pub async fn get_active_by_subdomain(
        &self,
        subdomain: &str,
    ) -> Result<Option<Company>, AppError> {
        sqlx::query_as::<_, Company>(&format!(
            "SELECT {} FROM companies WHERE LOWER(subdomain) = LOWER($1) AND status = 'active'",
            COMPANY_COLUMNS
        ))
        .bind(subdomain)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| registry_error("fetch company by subdomain", e))
    }

    /// Company by contact email, any status
    pub async fn get_by_contact_email(&self, email: &str) -> Result<Option<Company>, AppError> {
        sqlx::query_as::<_, Company>(&format!(
            "SELECT {} FROM companies WHERE LOWER(contact_email) = LOWER($1)",
            COMPANY_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| registry_error("fetch company by contact email", e))
    }

    /// Whether any company, whatever its status, holds the subdomain
    pub async fn subdomain_exists(&self, subdomain: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM companies WHERE LOWER(subdomain) = LOWER($1))",
        )
        .bind(subdomain)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| registry_error("check subdomain", e))?;

        Ok(exists)
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: CompanyStatus,
    ) -> Result<Company, AppError> {
        let company = sqlx::query_as::<_, Company>(&format!(
            r#"
            UPDATE companies
            SET status = $2,
                activated_at = CASE WHEN $2 = 'active'::company_status THEN COALESCE(activated_at, NOW()) ELSE activated_at END
            WHERE id = $1
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| registry_error("update company status", e))?
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;

        tracing::info!(company_id = %id, "Updated company status to {:?}", status);
        Ok(company)
    }

    /// Physical delete. Reserved for provisioning rollback.
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| registry_error("delete company", e))?;

        Ok(result.rows_affected() > 0)
    }
}
