//! Application state shared by the interceptor and the handlers.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use hirebase_core::Config;
use hirebase_db::{ConnectionRouter, DataPlane, PoolFactory, TenantRegistry};
use sqlx::postgres::PgConnectOptions;

use crate::auth::JwtService;
use crate::services::provisioning::{ProvisioningOrchestrator, ProvisioningSettings};
use crate::tenancy::TenantResolver;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub registry: Arc<dyn TenantRegistry>,
    pub router: Arc<ConnectionRouter>,
    pub data_plane: Arc<dyn DataPlane>,
    pub jwt: JwtService,
    pub resolver: TenantResolver,
    pub provisioning: ProvisioningOrchestrator,
}

impl AppState {
    /// Wire the tenancy components around the given registry, data plane and pool factory.
    pub fn new(
        config: Config,
        registry: Arc<dyn TenantRegistry>,
        data_plane: Arc<dyn DataPlane>,
        pool_factory: Arc<dyn PoolFactory>,
    ) -> Result<Self, anyhow::Error> {
        let jwt = JwtService::new(config.jwt_secret(), config.jwt_expiry_hours());
        let router = Arc::new(ConnectionRouter::new(registry.clone(), pool_factory));

        let resolver = TenantResolver::new(
            registry.clone(),
            jwt.clone(),
            config.base_domain().map(str::to_string),
            config.tenant_header(),
        );

        let provisioning = ProvisioningOrchestrator::new(
            registry.clone(),
            data_plane.clone(),
            router.clone(),
            jwt.clone(),
            provisioning_settings(&config)?,
        );

        Ok(Self {
            config,
            registry,
            router,
            data_plane,
            jwt,
            resolver,
            provisioning,
        })
    }
}

/// Tenant database coordinates default to those of `DATABASE_URL`.
fn provisioning_settings(config: &Config) -> Result<ProvisioningSettings, anyhow::Error> {
    let registry_options = PgConnectOptions::from_str(config.database_url())
        .context("DATABASE_URL is not a valid PostgreSQL connection string")?;
    let tenancy = config.tenancy();

    Ok(ProvisioningSettings {
        tenant_db_host: tenancy
            .tenant_db_host
            .clone()
            .unwrap_or_else(|| registry_options.get_host().to_string()),
        tenant_db_port: tenancy
            .tenant_db_port
            .unwrap_or(registry_options.get_port()),
        tenant_db_user: tenancy
            .tenant_db_user
            .clone()
            .or_else(|| Some(registry_options.get_username().to_string())),
        trial_days: config.trial_days(),
        min_password_length: config.min_password_length(),
    })
}
