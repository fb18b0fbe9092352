//! Company onboarding
//!
//! Provisioning runs as an explicit state machine. Every completed step is journaled
//! together with its compensating action; a failure after validation replays the
//! journal in reverse. There is no cross-database transaction, so atomicity comes from
//! compensation only.

use std::fmt;
use std::sync::Arc;

use chrono::{Duration, Utc};
use hirebase_core::constants::SUBDOMAIN_SUFFIX_ATTEMPTS;
use hirebase_core::models::{
    Company, CompanyStatus, NewCompany, NewPlan, NewSubscription, NewTenantDatabase, NewTenantUser,
    OnboardingResult, RegistrationRequest, SubscriptionStatus, TenantDatabaseStatus, UserRole,
};
use hirebase_core::validation::{
    normalize_email, random_suffix, sanitize_subdomain, tenant_database_name, validate_password,
    with_suffix,
};
use hirebase_core::AppError;
use hirebase_db::{ConnectionRouter, DataPlane, TenantRegistry};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{hash_password, JwtService};
use crate::constants::TOKEN_TYPE;
use crate::middleware::audit;

/// Steps of the onboarding state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningState {
    Validating,
    CompanyCreated,
    DatabaseCreated,
    MappingRecorded,
    SubscriptionCreated,
    SchemaApplied,
    AdminCreated,
    Complete,
    RolledBack,
}

impl ProvisioningState {
    /// What the orchestrator is doing while moving into this state
    pub fn step(&self) -> &'static str {
        match self {
            ProvisioningState::Validating => "validating the request",
            ProvisioningState::CompanyCreated => "creating the company",
            ProvisioningState::DatabaseCreated => "creating the database",
            ProvisioningState::MappingRecorded => "recording the database mapping",
            ProvisioningState::SubscriptionCreated => "creating the subscription",
            ProvisioningState::SchemaApplied => "applying the schema",
            ProvisioningState::AdminCreated => "creating the administrator",
            ProvisioningState::Complete => "issuing the access token",
            ProvisioningState::RolledBack => "rolling back",
        }
    }
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.step())
    }
}

/// Undo action for a completed step
#[derive(Debug, Clone, PartialEq, Eq)]
enum Compensation {
    DeleteCompany(Uuid),
    /// Evict the router entry, then drop the database
    DropDatabase {
        company_id: Uuid,
        database_name: String,
    },
    DeleteMapping(Uuid),
    DeleteSubscription(Uuid),
}

/// Journal of completed steps for one onboarding run
struct Saga {
    company_id: Uuid,
    state: ProvisioningState,
    journal: Vec<(ProvisioningState, Option<Compensation>)>,
}

impl Saga {
    fn new(company_id: Uuid) -> Self {
        Self {
            company_id,
            state: ProvisioningState::Validating,
            journal: Vec::new(),
        }
    }

    fn record(&mut self, state: ProvisioningState, compensation: Option<Compensation>) {
        tracing::debug!(company_id = %self.company_id, state = ?state, "Provisioning step completed");
        self.state = state;
        self.journal.push((state, compensation));
    }

    /// The step that was in flight when the run stopped.
    fn failed_step(&self) -> ProvisioningState {
        match self.state {
            ProvisioningState::Validating => ProvisioningState::CompanyCreated,
            ProvisioningState::CompanyCreated => ProvisioningState::DatabaseCreated,
            ProvisioningState::DatabaseCreated => ProvisioningState::MappingRecorded,
            ProvisioningState::MappingRecorded => ProvisioningState::SubscriptionCreated,
            ProvisioningState::SubscriptionCreated => ProvisioningState::SchemaApplied,
            ProvisioningState::SchemaApplied => ProvisioningState::AdminCreated,
            ProvisioningState::AdminCreated
            | ProvisioningState::Complete
            | ProvisioningState::RolledBack => ProvisioningState::Complete,
        }
    }
}

/// Where new tenant databases live and how onboarding is constrained
#[derive(Debug, Clone)]
pub struct ProvisioningSettings {
    pub tenant_db_host: String,
    pub tenant_db_port: u16,
    pub tenant_db_user: Option<String>,
    pub trial_days: i64,
    pub min_password_length: usize,
}

struct ValidatedRegistration {
    company_name: String,
    /// Sanitized subdomain before any collision suffix
    subdomain_base: String,
    subdomain: String,
    admin_email: String,
    admin_password: String,
    admin_name: String,
}

#[derive(Clone)]
pub struct ProvisioningOrchestrator {
    registry: Arc<dyn TenantRegistry>,
    data_plane: Arc<dyn DataPlane>,
    router: Arc<ConnectionRouter>,
    jwt: JwtService,
    settings: ProvisioningSettings,
}

impl ProvisioningOrchestrator {
    pub fn new(
        registry: Arc<dyn TenantRegistry>,
        data_plane: Arc<dyn DataPlane>,
        router: Arc<ConnectionRouter>,
        jwt: JwtService,
        settings: ProvisioningSettings,
    ) -> Self {
        Self {
            registry,
            data_plane,
            router,
            jwt,
            settings,
        }
    }

    /// Register a company: registry rows, a dedicated database with the tenant schema,
    /// the first administrator and an access token for them.
    ///
    /// Conflicts and validation errors are returned as is. Any other failure after
    /// validation rolls back every completed step and surfaces as `ProvisioningFailed`.
    #[tracing::instrument(skip(self, request), fields(company_name = %request.company_name))]
    pub async fn onboard_company(
        &self,
        request: RegistrationRequest,
    ) -> Result<OnboardingResult, AppError> {
        self.onboard_company_with_id(request, Uuid::new_v4()).await
    }

    pub(crate) async fn onboard_company_with_id(
        &self,
        request: RegistrationRequest,
        company_id: Uuid,
    ) -> Result<OnboardingResult, AppError> {
        let registration = self.validate(request).await?;

        let mut saga = Saga::new(company_id);
        match self.provision(&registration, &mut saga).await {
            Ok(result) => {
                saga.state = ProvisioningState::Complete;
                audit::log_company_registered(
                    result.company_id,
                    result.admin_user_id,
                    &result.subdomain,
                );
                tracing::info!(
                    company_id = %result.company_id,
                    subdomain = %result.subdomain,
                    database_name = %result.database_name,
                    "Company provisioned"
                );
                Ok(result)
            }
            Err(err) => {
                let failed = saga.failed_step();
                tracing::warn!(
                    company_id = %company_id,
                    step = %failed,
                    error = %err,
                    "Provisioning failed, rolling back"
                );
                self.compensate(&mut saga).await;
                audit::log_provisioning_rolled_back(company_id, failed.step(), &err.to_string());

                if err.is_client_error() || matches!(err, AppError::ProvisioningFailed { .. }) {
                    Err(err)
                } else {
                    Err(AppError::ProvisioningFailed {
                        step: failed.step().to_string(),
                        message: err.to_string(),
                    })
                }
            }
        }
    }

    async fn validate(
        &self,
        request: RegistrationRequest,
    ) -> Result<ValidatedRegistration, AppError> {
        request.validate()?;

        let company_name = request.company_name.trim().to_string();
        if company_name.is_empty() {
            return Err(AppError::InvalidInput("Company name is required".to_string()));
        }

        validate_password(&request.admin_password, self.settings.min_password_length)?;

        let admin_email = normalize_email(&request.admin_email);
        if self
            .registry
            .find_company_by_email(&admin_email)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "A company with this contact email already exists".to_string(),
            ));
        }

        let base = match request.subdomain.as_deref().map(str::trim) {
            Some(requested) if !requested.is_empty() => sanitize_subdomain(requested)?,
            _ => sanitize_subdomain(&company_name)
                .unwrap_or_else(|_| format!("company-{}", random_suffix())),
        };
        let subdomain = self.allocate_subdomain(&base).await?;

        let admin_name = request
            .admin_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| {
                admin_email
                    .split('@')
                    .next()
                    .unwrap_or(admin_email.as_str())
                    .to_string()
            });

        Ok(ValidatedRegistration {
            company_name,
            subdomain_base: base,
            subdomain,
            admin_email,
            admin_password: request.admin_password,
            admin_name,
        })
    }

    /// Take `base` if free, otherwise try suffixed variants.
    async fn allocate_subdomain(&self, base: &str) -> Result<String, AppError> {
        if !self.registry.subdomain_exists(base).await? {
            return Ok(base.to_string());
        }

        for _ in 0..SUBDOMAIN_SUFFIX_ATTEMPTS {
            let candidate = with_suffix(base, &random_suffix());
            if !self.registry.subdomain_exists(&candidate).await? {
                tracing::info!(requested = %base, assigned = %candidate, "Subdomain taken, assigned suffixed variant");
                return Ok(candidate);
            }
        }

        Err(AppError::Conflict(format!(
            "Subdomain '{}' is taken and no free variant was found",
            base
        )))
    }

    /// Insert the company row.
    ///
    /// A concurrent registration can claim the allocated subdomain between the
    /// availability check and the insert. The unique index then rejects the row and a
    /// fresh variant is allocated from the same base.
    async fn insert_company(
        &self,
        registration: &ValidatedRegistration,
        company_id: Uuid,
    ) -> Result<(Company, String), AppError> {
        let now = Utc::now();
        let mut subdomain = registration.subdomain.clone();

        for _ in 0..SUBDOMAIN_SUFFIX_ATTEMPTS {
            let result = self
                .registry
                .create_company(NewCompany {
                    id: company_id,
                    name: registration.company_name.clone(),
                    subdomain: subdomain.clone(),
                    contact_email: registration.admin_email.clone(),
                    status: CompanyStatus::Active,
                    activated_at: Some(now),
                    trial_ends_at: Some(now + Duration::days(self.settings.trial_days)),
                })
                .await;

            match result {
                Ok(company) => return Ok((company, subdomain)),
                Err(AppError::Conflict(message)) => {
                    if !self.registry.subdomain_exists(&subdomain).await? {
                        return Err(AppError::Conflict(message));
                    }
                    tracing::info!(subdomain = %subdomain, "Subdomain claimed concurrently, allocating another");
                    subdomain = self.allocate_subdomain(&registration.subdomain_base).await?;
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Conflict(format!(
            "Subdomain '{}' is taken and no free variant was found",
            registration.subdomain_base
        )))
    }

    async fn provision(
        &self,
        registration: &ValidatedRegistration,
        saga: &mut Saga,
    ) -> Result<OnboardingResult, AppError> {
        let company_id = saga.company_id;

        let (company, subdomain) = self.insert_company(registration, company_id).await?;
        saga.record(
            ProvisioningState::CompanyCreated,
            Some(Compensation::DeleteCompany(company.id)),
        );

        let database_name = tenant_database_name(company_id);
        if self.registry.database_name_exists(&database_name).await?
            || self.data_plane.database_exists(&database_name).await?
        {
            return Err(AppError::ProvisioningFailed {
                step: ProvisioningState::DatabaseCreated.step().to_string(),
                message: format!("Database {} already exists", database_name),
            });
        }
        self.data_plane.create_database(&database_name).await?;
        saga.record(
            ProvisioningState::DatabaseCreated,
            Some(Compensation::DropDatabase {
                company_id,
                database_name: database_name.clone(),
            }),
        );

        self.registry
            .create_tenant_database(NewTenantDatabase {
                company_id,
                database_name: database_name.clone(),
                host: self.settings.tenant_db_host.clone(),
                port: i32::from(self.settings.tenant_db_port),
                db_user: self.settings.tenant_db_user.clone(),
                status: TenantDatabaseStatus::Active,
            })
            .await?;
        saga.record(
            ProvisioningState::MappingRecorded,
            Some(Compensation::DeleteMapping(company_id)),
        );

        let plan = match self.registry.default_plan().await? {
            Some(plan) => plan,
            None => self.registry.create_plan(NewPlan::starter()).await?,
        };
        let subscription = self
            .registry
            .create_subscription(NewSubscription {
                company_id,
                plan_id: plan.id,
                status: SubscriptionStatus::Trial,
                trial_ends_at: company.trial_ends_at,
            })
            .await?;
        saga.record(
            ProvisioningState::SubscriptionCreated,
            Some(Compensation::DeleteSubscription(subscription.id)),
        );

        let pool = self.router.get_connection(company_id).await?;
        let version = self.data_plane.apply_schema(&pool).await?;
        tracing::debug!(company_id = %company_id, schema_version = version, "Tenant schema applied");
        saga.record(ProvisioningState::SchemaApplied, None);

        let admin = self
            .data_plane
            .create_user(
                &pool,
                NewTenantUser {
                    email: registration.admin_email.clone(),
                    password_hash: hash_password(&registration.admin_password)?,
                    full_name: registration.admin_name.clone(),
                    role: UserRole::Admin,
                },
            )
            .await?;
        saga.record(ProvisioningState::AdminCreated, None);

        let access_token = self
            .jwt
            .issue(admin.id, Some(company_id), UserRole::Admin, None)?;

        Ok(OnboardingResult {
            company_id,
            admin_user_id: admin.id,
            subdomain,
            database_name,
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: self.jwt.default_ttl().num_seconds(),
        })
    }

    /// Replay the journal in reverse. Failures are logged and never replace the
    /// error that triggered the rollback.
    async fn compensate(&self, saga: &mut Saga) {
        while let Some((state, compensation)) = saga.journal.pop() {
            let Some(compensation) = compensation else {
                continue;
            };

            if let Err(e) = self.run_compensation(&compensation).await {
                tracing::error!(
                    company_id = %saga.company_id,
                    state = ?state,
                    compensation = ?compensation,
                    error = %e,
                    "Compensation failed, manual cleanup required"
                );
            }
        }
        saga.state = ProvisioningState::RolledBack;
    }

    async fn run_compensation(&self, compensation: &Compensation) -> Result<(), AppError> {
        match compensation {
            Compensation::DeleteCompany(id) => self.registry.delete_company(*id).await,
            Compensation::DropDatabase {
                company_id,
                database_name,
            } => {
                self.router.evict(*company_id).await;
                self.data_plane.drop_database(database_name).await
            }
            Compensation::DeleteMapping(company_id) => {
                self.registry.delete_tenant_database(*company_id).await
            }
            Compensation::DeleteSubscription(id) => self.registry.delete_subscription(*id).await,
        }
    }
}
