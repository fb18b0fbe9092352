//! Hirebase API Library
//!
//! This crate provides the HTTP surface of the control plane: tenant resolution and
//! per-request database routing, company self-service onboarding, and the handlers
//! that run inside a resolved tenant.

// Module declarations
mod api_doc;
pub mod constants;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod setup;

// Public modules
pub mod auth;
pub mod error;
pub mod state;
pub mod tenancy;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use services::provisioning::{ProvisioningOrchestrator, ProvisioningState};
pub use tenancy::{current_connection, current_tenant_id, TenantContext, TenantSession};
