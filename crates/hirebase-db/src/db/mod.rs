//! Database repositories for data access layer
//!
//! Repositories are organized into control/ (the shared tenant registry) and tenant/
//! (tables living inside each company's own database). The router hands out pools for
//! tenant databases; the data plane creates, seeds and drops them.
//
// Registry repositories (companies, tenant databases, plans, subscriptions)
pub mod control;
//
// Registry trait consumed by the resolver, router and orchestrator
pub mod registry;
//
// Per-tenant pool cache
pub mod router;
//
// Server-level database administration and tenant seeding
pub mod admin;
//
// Tenant database schema and repositories
pub mod tenant;
//
// sqlx error classification
pub mod errors;
