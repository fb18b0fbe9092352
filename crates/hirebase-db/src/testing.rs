//! In-memory doubles for the registry, the data plane and pool construction.
//!
//! Pools handed out here are created with `connect_lazy_with`: they carry the tenant's
//! connect options but never open a connection unless a query is run on them.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hirebase_core::models::{
    Company, CompanyStatus, NewCompany, NewPlan, NewSubscription, NewTenantDatabase,
    NewTenantUser, Plan, Subscription, TenantDatabase, TenantDatabaseStatus, TenantUser,
};
use hirebase_core::validation::{normalize_email, tenant_database_name};
use hirebase_core::AppError;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::admin::DataPlane;
use crate::db::registry::TenantRegistry;
use crate::db::router::PoolFactory;

/// Lazily connecting pool pointed at `database_name` on localhost.
pub fn lazy_pool(database_name: &str) -> PgPool {
    let options = PgConnectOptions::new()
        .host("localhost")
        .port(5432)
        .username("hirebase")
        .database(database_name);
    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy_with(options)
}

pub fn sample_company(name: &str, subdomain: &str) -> Company {
    Company {
        id: Uuid::new_v4(),
        name: name.to_string(),
        custom_domain: None,
        subdomain: Some(subdomain.to_lowercase()),
        status: CompanyStatus::Active,
        contact_email: format!("admin@{}.test", subdomain.to_lowercase()),
        created_at: Utc::now(),
        activated_at: Some(Utc::now()),
        trial_ends_at: None,
    }
}

pub fn sample_tenant_database(company_id: Uuid, status: TenantDatabaseStatus) -> TenantDatabase {
    TenantDatabase {
        id: Uuid::new_v4(),
        company_id,
        database_name: tenant_database_name(company_id),
        host: "localhost".to_string(),
        port: 5432,
        db_user: None,
        status,
        provisioned_at: Utc::now(),
    }
}

#[derive(Default)]
struct RegistryState {
    companies: HashMap<Uuid, Company>,
    databases: HashMap<Uuid, TenantDatabase>,
    plans: Vec<Plan>,
    subscriptions: HashMap<Uuid, Subscription>,
    /// Subdomain a rival registration claims right before the next matching insert
    rival_claim: Option<String>,
}

/// Registry backed by hash maps, enforcing the same uniqueness rules as the tables.
#[derive(Default)]
pub struct InMemoryRegistry {
    state: Mutex<RegistryState>,
    unavailable: AtomicBool,
    lookups: AtomicUsize,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with `RegistryUnavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of tenant database lookups served
    pub fn tenant_database_lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub async fn insert_company(&self, company: Company) {
        self.state
            .lock()
            .await
            .companies
            .insert(company.id, company);
    }

    pub async fn insert_tenant_database(&self, database: TenantDatabase) {
        self.state
            .lock()
            .await
            .databases
            .insert(database.company_id, database);
    }

    /// Insert an active company together with an active database mapping
    pub async fn seed_tenant(&self, name: &str, subdomain: &str) -> (Company, TenantDatabase) {
        let company = sample_company(name, subdomain);
        let database = sample_tenant_database(company.id, TenantDatabaseStatus::Active);
        self.insert_company(company.clone()).await;
        self.insert_tenant_database(database.clone()).await;
        (company, database)
    }

    /// Let another company take `subdomain` between the availability check and the
    /// next insert that uses it, as a concurrent registration would.
    pub async fn claim_subdomain_before_next_insert(&self, subdomain: &str) {
        self.state.lock().await.rival_claim = Some(subdomain.to_lowercase());
    }

    pub async fn company_count(&self) -> usize {
        self.state.lock().await.companies.len()
    }

    pub async fn tenant_database_count(&self) -> usize {
        self.state.lock().await.databases.len()
    }

    pub async fn subscription_count(&self) -> usize {
        self.state.lock().await.subscriptions.len()
    }

    pub async fn plan_count(&self) -> usize {
        self.state.lock().await.plans.len()
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::RegistryUnavailable(
                "registry is unreachable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl TenantRegistry for InMemoryRegistry {
    async fn find_company_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .await
            .companies
            .get(&id)
            .filter(|c| c.status.is_active())
            .cloned())
    }

    async fn find_company_by_subdomain(
        &self,
        subdomain: &str,
    ) -> Result<Option<Company>, AppError> {
        self.check_available()?;
        let wanted = subdomain.to_lowercase();
        Ok(self
            .state
            .lock()
            .await
            .companies
            .values()
            .find(|c| c.status.is_active() && c.subdomain.as_deref() == Some(wanted.as_str()))
            .cloned())
    }

    async fn find_company_by_email(&self, email: &str) -> Result<Option<Company>, AppError> {
        self.check_available()?;
        let wanted = normalize_email(email);
        Ok(self
            .state
            .lock()
            .await
            .companies
            .values()
            .find(|c| normalize_email(&c.contact_email) == wanted)
            .cloned())
    }

    async fn subdomain_exists(&self, subdomain: &str) -> Result<bool, AppError> {
        self.check_available()?;
        let wanted = subdomain.to_lowercase();
        Ok(self
            .state
            .lock()
            .await
            .companies
            .values()
            .any(|c| c.subdomain.as_deref() == Some(wanted.as_str())))
    }

    async fn create_company(&self, company: NewCompany) -> Result<Company, AppError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let email = normalize_email(&company.contact_email);
        let subdomain = company.subdomain.to_lowercase();
        if state.rival_claim.as_deref() == Some(subdomain.as_str()) {
            state.rival_claim = None;
            let rival = sample_company("Rival", &subdomain);
            state.companies.insert(rival.id, rival);
        }
        if state
            .companies
            .values()
            .any(|c| normalize_email(&c.contact_email) == email)
        {
            return Err(AppError::Conflict(
                "A company with this contact email already exists".to_string(),
            ));
        }
        if state
            .companies
            .values()
            .any(|c| c.subdomain.as_deref() == Some(subdomain.as_str()))
        {
            return Err(AppError::Conflict("Subdomain is already taken".to_string()));
        }

        let created = Company {
            id: company.id,
            name: company.name,
            custom_domain: None,
            subdomain: Some(subdomain),
            status: company.status,
            contact_email: email,
            created_at: Utc::now(),
            activated_at: company.activated_at,
            trial_ends_at: company.trial_ends_at,
        };
        state.companies.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_company_status(
        &self,
        id: Uuid,
        status: CompanyStatus,
    ) -> Result<Company, AppError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let company = state
            .companies
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;
        company.status = status;
        Ok(company.clone())
    }

    async fn delete_company(&self, id: Uuid) -> Result<(), AppError> {
        self.check_available()?;
        self.state.lock().await.companies.remove(&id);
        Ok(())
    }

    async fn database_name_exists(&self, database_name: &str) -> Result<bool, AppError> {
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .await
            .databases
            .values()
            .any(|d| d.database_name == database_name))
    }

    async fn find_tenant_database(
        &self,
        company_id: Uuid,
    ) -> Result<Option<TenantDatabase>, AppError> {
        self.check_available()?;
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().await.databases.get(&company_id).cloned())
    }

    async fn create_tenant_database(
        &self,
        record: NewTenantDatabase,
    ) -> Result<TenantDatabase, AppError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        if state.databases.contains_key(&record.company_id)
            || state
                .databases
                .values()
                .any(|d| d.database_name == record.database_name)
        {
            return Err(AppError::Conflict(
                "Tenant database name is already registered".to_string(),
            ));
        }
        let created = TenantDatabase {
            id: Uuid::new_v4(),
            company_id: record.company_id,
            database_name: record.database_name,
            host: record.host,
            port: record.port,
            db_user: record.db_user,
            status: record.status,
            provisioned_at: Utc::now(),
        };
        state.databases.insert(created.company_id, created.clone());
        Ok(created)
    }

    async fn update_tenant_database_status(
        &self,
        company_id: Uuid,
        status: TenantDatabaseStatus,
    ) -> Result<TenantDatabase, AppError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let database = state
            .databases
            .get_mut(&company_id)
            .ok_or_else(|| AppError::NotFound("Tenant database not found".to_string()))?;
        database.status = status;
        Ok(database.clone())
    }

    async fn delete_tenant_database(&self, company_id: Uuid) -> Result<(), AppError> {
        self.check_available()?;
        self.state.lock().await.databases.remove(&company_id);
        Ok(())
    }

    async fn default_plan(&self) -> Result<Option<Plan>, AppError> {
        self.check_available()?;
        let state = self.state.lock().await;
        let mut plans: Vec<&Plan> = state.plans.iter().collect();
        plans.sort_by_key(|p| (!p.is_default, p.tier));
        Ok(plans.first().map(|p| (*p).clone()))
    }

    async fn create_plan(&self, plan: NewPlan) -> Result<Plan, AppError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        if let Some(existing) = state.plans.iter().find(|p| p.code == plan.code) {
            return Ok(existing.clone());
        }
        let created = Plan {
            id: Uuid::new_v4(),
            code: plan.code,
            name: plan.name,
            tier: plan.tier,
            max_users: plan.max_users,
            is_default: plan.is_default,
            created_at: Utc::now(),
        };
        state.plans.push(created.clone());
        Ok(created)
    }

    async fn create_subscription(
        &self,
        subscription: NewSubscription,
    ) -> Result<Subscription, AppError> {
        self.check_available()?;
        let now = Utc::now();
        let created = Subscription {
            id: Uuid::new_v4(),
            company_id: subscription.company_id,
            plan_id: subscription.plan_id,
            status: subscription.status,
            started_at: now,
            trial_ends_at: subscription.trial_ends_at,
            created_at: now,
        };
        self.state
            .lock()
            .await
            .subscriptions
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_subscription(
        &self,
        company_id: Uuid,
    ) -> Result<Option<Subscription>, AppError> {
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .await
            .subscriptions
            .values()
            .filter(|s| s.company_id == company_id)
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn delete_subscription(&self, id: Uuid) -> Result<(), AppError> {
        self.check_available()?;
        self.state.lock().await.subscriptions.remove(&id);
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.check_available()
    }
}

/// Step of the data plane that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataPlaneFault {
    CreateDatabase,
    ApplySchema,
    CreateUser,
    DropDatabase,
}

/// Data plane keeping databases, schema versions and users in memory.
///
/// Tenant-scoped calls identify the database through the pool's connect options.
#[derive(Default)]
pub struct FakeDataPlane {
    databases: Mutex<HashSet<String>>,
    schemas: Mutex<HashMap<String, i32>>,
    users: Mutex<HashMap<String, Vec<TenantUser>>>,
    dropped: Mutex<Vec<String>>,
    faults: Mutex<HashSet<DataPlaneFault>>,
}

impl FakeDataPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn inject_fault(&self, fault: DataPlaneFault) {
        self.faults.lock().await.insert(fault);
    }

    pub async fn clear_faults(&self) {
        self.faults.lock().await.clear();
    }

    pub async fn database_names(&self) -> Vec<String> {
        self.databases.lock().await.iter().cloned().collect()
    }

    pub async fn dropped_databases(&self) -> Vec<String> {
        self.dropped.lock().await.clone()
    }

    pub async fn schema_version(&self, database_name: &str) -> Option<i32> {
        self.schemas.lock().await.get(database_name).copied()
    }

    /// Register a database that already exists on the server
    pub async fn add_database(&self, database_name: &str) {
        self.databases
            .lock()
            .await
            .insert(database_name.to_string());
    }

    /// Put a user straight into a tenant database
    pub async fn seed_user(&self, database_name: &str, user: TenantUser) {
        self.users
            .lock()
            .await
            .entry(database_name.to_string())
            .or_default()
            .push(user);
    }

    async fn fails(&self, fault: DataPlaneFault) -> bool {
        self.faults.lock().await.contains(&fault)
    }

    fn database_of(pool: &PgPool) -> Result<String, AppError> {
        pool.connect_options()
            .get_database()
            .map(str::to_string)
            .ok_or_else(|| AppError::Internal("pool has no database name".to_string()))
    }

    async fn ensure_exists(&self, database_name: &str) -> Result<(), AppError> {
        if !self.databases.lock().await.contains(database_name) {
            return Err(AppError::Internal(format!(
                "database \"{}\" does not exist",
                database_name
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DataPlane for FakeDataPlane {
    async fn database_exists(&self, database_name: &str) -> Result<bool, AppError> {
        Ok(self.databases.lock().await.contains(database_name))
    }

    async fn create_database(&self, database_name: &str) -> Result<(), AppError> {
        if self.fails(DataPlaneFault::CreateDatabase).await {
            return Err(AppError::Internal("injected create database failure".to_string()));
        }
        if !self
            .databases
            .lock()
            .await
            .insert(database_name.to_string())
        {
            return Err(AppError::Internal(format!(
                "database \"{}\" already exists",
                database_name
            )));
        }
        Ok(())
    }

    async fn drop_database(&self, database_name: &str) -> Result<(), AppError> {
        if self.fails(DataPlaneFault::DropDatabase).await {
            return Err(AppError::Internal("injected drop database failure".to_string()));
        }
        self.databases.lock().await.remove(database_name);
        self.schemas.lock().await.remove(database_name);
        self.users.lock().await.remove(database_name);
        self.dropped.lock().await.push(database_name.to_string());
        Ok(())
    }

    async fn apply_schema(&self, pool: &PgPool) -> Result<i32, AppError> {
        let database_name = Self::database_of(pool)?;
        self.ensure_exists(&database_name).await?;
        if self.fails(DataPlaneFault::ApplySchema).await {
            return Err(AppError::Internal("injected schema failure".to_string()));
        }
        self.schemas
            .lock()
            .await
            .insert(database_name, crate::db::tenant::TENANT_SCHEMA_VERSION);
        Ok(crate::db::tenant::TENANT_SCHEMA_VERSION)
    }

    async fn create_user(
        &self,
        pool: &PgPool,
        user: NewTenantUser,
    ) -> Result<TenantUser, AppError> {
        let database_name = Self::database_of(pool)?;
        self.ensure_exists(&database_name).await?;
        if self.fails(DataPlaneFault::CreateUser).await {
            return Err(AppError::Internal("injected create user failure".to_string()));
        }

        let mut users = self.users.lock().await;
        let tenant_users = users.entry(database_name).or_default();
        let email = normalize_email(&user.email);
        if tenant_users.iter().any(|u| u.email == email) {
            return Err(AppError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }
        let now = Utc::now();
        let created = TenantUser {
            id: Uuid::new_v4(),
            email,
            password_hash: user.password_hash,
            full_name: user.full_name,
            role: user.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tenant_users.push(created.clone());
        Ok(created)
    }

    async fn find_user_by_email(
        &self,
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<TenantUser>, AppError> {
        let database_name = Self::database_of(pool)?;
        let wanted = normalize_email(email);
        Ok(self
            .users
            .lock()
            .await
            .get(&database_name)
            .and_then(|users| users.iter().find(|u| u.email == wanted).cloned()))
    }

    async fn find_user_by_id(
        &self,
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<TenantUser>, AppError> {
        let database_name = Self::database_of(pool)?;
        Ok(self
            .users
            .lock()
            .await
            .get(&database_name)
            .and_then(|users| users.iter().find(|u| u.id == id).cloned()))
    }
}

/// Pool factory that counts constructions and hands out lazy pools.
#[derive(Default)]
pub struct CountingPoolFactory {
    pub created: AtomicUsize,
    delay_ms: AtomicU64,
    failing: AtomicBool,
    fail_next: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl CountingPoolFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep inside construction to widen race windows
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Fail only the next `count` constructions
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Highest number of constructions observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PoolFactory for CountingPoolFactory {
    async fn create_pool(&self, database: &TenantDatabase) -> Result<PgPool, AppError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let fail_once = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail_once || self.failing.load(Ordering::SeqCst) {
            return Err(AppError::TenantDatabaseUnavailable {
                company_id: database.company_id,
                reason: "connection failed".to_string(),
            });
        }
        Ok(lazy_pool(&database.database_name))
    }
}
