//! Tables living inside each company's own database

pub mod schema;
pub mod user;

pub use schema::{apply_tenant_schema, TENANT_SCHEMA_VERSION};
pub use user::TenantUserRepository;
