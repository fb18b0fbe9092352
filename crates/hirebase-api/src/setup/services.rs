//! Production wiring of the registry, data plane and tenant pool factory

use anyhow::Result;
use hirebase_core::Config;
use hirebase_db::{
    DataPlane, PgDataPlane, PgPoolFactory, PgTenantRegistry, PoolFactory, TenantRegistry,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::state::AppState;

/// Build the application state on top of the registry pool.
///
/// The registry pool doubles as the administrative connection for `CREATE DATABASE`
/// and `DROP DATABASE`, so its role needs `CREATEDB`.
pub fn initialize_services(config: &Config, registry_pool: PgPool) -> Result<Arc<AppState>> {
    let registry: Arc<dyn TenantRegistry> =
        Arc::new(PgTenantRegistry::new(registry_pool.clone()));
    let data_plane: Arc<dyn DataPlane> = Arc::new(PgDataPlane::new(registry_pool));

    let tenancy = config.tenancy();
    let pool_factory: Arc<dyn PoolFactory> = Arc::new(PgPoolFactory::from_url(
        config.database_url(),
        tenancy.tenant_db_password.clone(),
        tenancy.tenant_db_max_connections,
        Duration::from_secs(config.db_timeout_seconds()),
    )?);

    let state = AppState::new(config.clone(), registry, data_plane, pool_factory)?;

    tracing::info!(
        base_domain = ?config.base_domain(),
        tenant_header = %config.tenant_header(),
        tenant_max_connections = tenancy.tenant_db_max_connections,
        "Tenancy services initialized"
    );

    Ok(Arc::new(state))
}
