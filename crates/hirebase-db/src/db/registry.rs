//! Tenant registry
//!
//! The registry is the single source of truth mapping companies to their databases.
//! It is consulted by the tenant resolver (subdomain and explicit identifier lookups),
//! the connection router (database coordinates) and the provisioning orchestrator.
//!
//! Absent rows are `Ok(None)`. Errors always mean the lookup could not be answered and
//! are never to be read as "no such tenant".

use async_trait::async_trait;
use hirebase_core::models::{
    Company, CompanyStatus, NewCompany, NewPlan, NewSubscription, NewTenantDatabase, Plan,
    Subscription, TenantDatabase, TenantDatabaseStatus,
};
use hirebase_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::control::{
    CompanyRepository, PlanRepository, SubscriptionRepository, TenantDatabaseRepository,
};
use crate::db::errors::registry_error;

#[async_trait]
pub trait TenantRegistry: Send + Sync {
    /// Active company by id
    async fn find_company_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError>;

    /// Active company by subdomain (case-insensitive)
    async fn find_company_by_subdomain(&self, subdomain: &str)
        -> Result<Option<Company>, AppError>;

    /// Company by contact email, any status
    async fn find_company_by_email(&self, email: &str) -> Result<Option<Company>, AppError>;

    /// Whether the subdomain is held by any company, any status
    async fn subdomain_exists(&self, subdomain: &str) -> Result<bool, AppError>;

    async fn create_company(&self, company: NewCompany) -> Result<Company, AppError>;

    async fn update_company_status(
        &self,
        id: Uuid,
        status: CompanyStatus,
    ) -> Result<Company, AppError>;

    async fn delete_company(&self, id: Uuid) -> Result<(), AppError>;

    async fn database_name_exists(&self, database_name: &str) -> Result<bool, AppError>;

    /// Database mapping for a company, any status
    async fn find_tenant_database(
        &self,
        company_id: Uuid,
    ) -> Result<Option<TenantDatabase>, AppError>;

    async fn create_tenant_database(
        &self,
        record: NewTenantDatabase,
    ) -> Result<TenantDatabase, AppError>;

    async fn update_tenant_database_status(
        &self,
        company_id: Uuid,
        status: TenantDatabaseStatus,
    ) -> Result<TenantDatabase, AppError>;

    async fn delete_tenant_database(&self, company_id: Uuid) -> Result<(), AppError>;

    /// Lowest-tier plan
    async fn default_plan(&self) -> Result<Option<Plan>, AppError>;

    async fn create_plan(&self, plan: NewPlan) -> Result<Plan, AppError>;

    async fn create_subscription(
        &self,
        subscription: NewSubscription,
    ) -> Result<Subscription, AppError>;

    async fn find_subscription(&self, company_id: Uuid)
        -> Result<Option<Subscription>, AppError>;

    async fn delete_subscription(&self, id: Uuid) -> Result<(), AppError>;

    /// Readiness check
    async fn ping(&self) -> Result<(), AppError>;
}

/// Postgres-backed registry composed from the control repositories
#[derive(Clone)]
pub struct PgTenantRegistry {
    pool: PgPool,
    companies: CompanyRepository,
    databases: TenantDatabaseRepository,
    plans: PlanRepository,
    subscriptions: SubscriptionRepository,
}

impl PgTenantRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self {
            companies: CompanyRepository::new(pool.clone()),
            databases: TenantDatabaseRepository::new(pool.clone()),
            plans: PlanRepository::new(pool.clone()),
            subscriptions: SubscriptionRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl TenantRegistry for PgTenantRegistry {
    async fn find_company_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        self.companies.get_active_by_id(id).await
    }

    async fn find_company_by_subdomain(
        &self,
        subdomain: &str,
    ) -> Result<Option<Company>, AppError> {
        self.companies.get_active_by_subdomain(subdomain).await
    }

    async fn find_company_by_email(&self, email: &str) -> Result<Option<Company>, AppError> {
        self.companies.get_by_contact_email(email).await
    }

    async fn subdomain_exists(&self, subdomain: &str) -> Result<bool, AppError> {
        self.companies.subdomain_exists(subdomain).await
    }

    async fn create_company(&self, company: NewCompany) -> Result<Company, AppError> {
        self.companies.create_company(&company).await
    }

    async fn update_company_status(
        &self,
        id: Uuid,
        status: CompanyStatus,
    ) -> Result<Company, AppError> {
        self.companies.update_status(id, status).await
    }

    async fn delete_company(&self, id: Uuid) -> Result<(), AppError> {
        if !self.companies.delete(id).await? {
            tracing::warn!(company_id = %id, "Company row already absent on delete");
        }
        Ok(())
    }

    async fn database_name_exists(&self, database_name: &str) -> Result<bool, AppError> {
        self.databases.name_exists(database_name).await
    }

    async fn find_tenant_database(
        &self,
        company_id: Uuid,
    ) -> Result<Option<TenantDatabase>, AppError> {
        self.databases.get_by_company(company_id).await
    }

    async fn create_tenant_database(
        &self,
        record: NewTenantDatabase,
    ) -> Result<TenantDatabase, AppError> {
        self.databases.create(&record).await
    }

    async fn update_tenant_database_status(
        &self,
        company_id: Uuid,
        status: TenantDatabaseStatus,
    ) -> Result<TenantDatabase, AppError> {
        self.databases.update_status(company_id, status).await
    }

    async fn delete_tenant_database(&self, company_id: Uuid) -> Result<(), AppError> {
        if !self.databases.delete_by_company(company_id).await? {
            tracing::warn!(company_id = %company_id, "Tenant database row already absent on delete");
        }
        Ok(())
    }

    async fn default_plan(&self) -> Result<Option<Plan>, AppError> {
        self.plans.get_default().await
    }

    async fn create_plan(&self, plan: NewPlan) -> Result<Plan, AppError> {
        self.plans.create(&plan).await
    }

    async fn create_subscription(
        &self,
        subscription: NewSubscription,
    ) -> Result<Subscription, AppError> {
        self.subscriptions.create(&subscription).await
    }

    async fn find_subscription(
        &self,
        company_id: Uuid,
    ) -> Result<Option<Subscription>, AppError> {
        self.subscriptions.get_by_company(company_id).await
    }

    async fn delete_subscription(&self, id: Uuid) -> Result<(), AppError> {
        self.subscriptions.delete(id).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| registry_error("ping registry", e))?;
        Ok(())
    }
}
