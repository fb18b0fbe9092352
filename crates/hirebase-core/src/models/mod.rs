//! Data models for the control plane
//!
//! Registry entities (companies, tenant databases, plans, subscriptions) live in the
//! shared registry database. `TenantUser` lives inside each tenant database.

mod company;
mod onboarding;
mod plan;
mod tenant_database;
mod user;

pub use company::*;
pub use onboarding::*;
pub use plan::*;
pub use tenant_database::*;
pub use user::*;
