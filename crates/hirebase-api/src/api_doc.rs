//! OpenAPI documentation.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::auth::{LoginRequest, TokenResponse};
use crate::error;
use crate::handlers;
use hirebase_core::models;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hirebase API",
        version = "0.1.0",
        description = "Control plane of the Hirebase recruiting platform: company self-service onboarding, tenant resolution and per-tenant database routing. Every company runs on its own database. Versioned endpoints live under /api/v1/."
    ),
    paths(
        // Health
        handlers::health::liveness_check,
        handlers::health::readiness_check,
        // Onboarding
        handlers::registration::register,
        handlers::registration::register_company,
        // Auth
        handlers::auth::login,
        // Tenant
        handlers::tenant::get_tenant,
        handlers::tenant::get_me,
        handlers::tenant::suspend_tenant,
    ),
    components(
        schemas(
            models::RegistrationRequest,
            models::OnboardingResult,
            models::Company,
            models::CompanyStatus,
            models::TenantDatabaseStatus,
            models::Subscription,
            models::SubscriptionStatus,
            models::TenantUser,
            models::UserRole,
            LoginRequest,
            TokenResponse,
            handlers::tenant::TenantResponse,
            handlers::tenant::TenantDatabaseSummary,
            handlers::tenant::SuspendResponse,
            // Error
            error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness and readiness checks"),
        (name = "onboarding", description = "Company self-service registration"),
        (name = "auth", description = "Login inside a company"),
        (name = "tenant", description = "Operations on the current company")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_versioned_paths() {
        let spec = get_openapi_spec();
        for path in [
            "/api/v1/auth/register",
            "/api/v1/companies/register",
            "/api/v1/auth/login",
            "/api/v1/tenant",
            "/api/v1/me",
            "/api/v1/admin/tenants/{id}/suspend",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
