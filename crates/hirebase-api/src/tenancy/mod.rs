//! Tenant resolution and per-request database routing
//!
//! Every request passes through [`middleware::tenant_middleware`], which decides the
//! route's [`PathPolicy`], resolves the tenant with [`TenantResolver`], fetches the
//! tenant's pool from the connection router and binds a [`TenantContext`] for the rest
//! of the request.

pub mod context;
pub mod middleware;
pub mod paths;
pub mod resolver;

pub use context::{
    current_connection, current_context, current_tenant_id, TenantContext, TenantSession,
};
pub use middleware::tenant_middleware;
pub use paths::{policy_for, PathPolicy};
pub use resolver::{Resolution, ResolutionSource, TenantResolver};
