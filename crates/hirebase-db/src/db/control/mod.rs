//! Registry repositories
//!
//! Each repository owns a clone of the registry pool and maps sqlx failures through
//! [`crate::db::errors::registry_error`].

pub mod company;
pub mod subscription;
pub mod tenant_database;

pub use company::CompanyRepository;
pub use subscription::{PlanRepository, SubscriptionRepository};
pub use tenant_database::TenantDatabaseRepository;
