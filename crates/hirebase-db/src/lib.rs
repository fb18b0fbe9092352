//! Hirebase Database Layer
//!
//! This crate provides the tenant registry repositories, the per-tenant connection
//! router, and the data plane operations used to create and seed tenant databases.

pub mod db;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exports: Registry
pub use db::registry::{PgTenantRegistry, TenantRegistry};

// Re-exports: Control repositories
pub use db::control::{
    CompanyRepository, PlanRepository, SubscriptionRepository, TenantDatabaseRepository,
};

// Re-exports: Routing
pub use db::router::{ConnectionRouter, PgPoolFactory, PoolFactory};

// Re-exports: Data plane
pub use db::admin::{DataPlane, PgDataPlane};
pub use db::tenant::{TenantUserRepository, TENANT_SCHEMA_VERSION};
