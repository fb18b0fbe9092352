//! Company registration through the public endpoints.
//!
//! Run with: `cargo test -p hirebase-api --test onboarding_test`

mod helpers;

use helpers::auth::{register_company, TEST_PASSWORD};
use helpers::{api_path, setup_test_app};
use hirebase_api::ErrorResponse;
use hirebase_core::models::OnboardingResult;
use hirebase_core::validation::tenant_database_name;
use hirebase_db::testing::DataPlaneFault;
use hirebase_db::TENANT_SCHEMA_VERSION;
use serde_json::json;

#[tokio::test]
async fn test_register_creates_isolated_tenant() {
    let app = setup_test_app();
    let onboarded = register_company(app.client(), "Acme Recruiting", "admin@acme.com").await;

    assert_eq!(onboarded.subdomain, "acme-recruiting");
    assert_eq!(
        onboarded.database_name,
        tenant_database_name(onboarded.company_id)
    );
    assert_eq!(onboarded.token_type, "Bearer");
    assert_eq!(onboarded.expires_in, 3600);

    assert_eq!(app.registry.company_count().await, 1);
    assert_eq!(app.registry.tenant_database_count().await, 1);
    assert_eq!(app.registry.subscription_count().await, 1);
    assert_eq!(
        app.data_plane.schema_version(&onboarded.database_name).await,
        Some(TENANT_SCHEMA_VERSION)
    );
}

#[tokio::test]
async fn test_alias_endpoint_registers_too() {
    let app = setup_test_app();

    let response = app
        .client()
        .post(&api_path("/companies/register"))
        .json(&json!({
            "company_name": "Globex",
            "subdomain": "globex-hr",
            "admin_email": "hr@globex.com",
            "admin_password": TEST_PASSWORD,
        }))
        .await;

    assert_eq!(response.status_code(), 201);
    assert_eq!(response.json::<OnboardingResult>().subdomain, "globex-hr");
}

#[tokio::test]
async fn test_duplicate_contact_email_is_conflict() {
    let app = setup_test_app();
    register_company(app.client(), "Acme", "admin@acme.com").await;

    let response = app
        .client()
        .post(&api_path("/auth/register"))
        .json(&json!({
            "company_name": "Acme Again",
            "admin_email": "ADMIN@acme.com",
            "admin_password": TEST_PASSWORD,
        }))
        .await;

    assert_eq!(response.status_code(), 409);
    assert_eq!(response.json::<ErrorResponse>().code, "CONFLICT");
    assert_eq!(app.registry.company_count().await, 1);
    assert_eq!(app.registry.tenant_database_count().await, 1);
    assert_eq!(app.registry.subscription_count().await, 1);
    assert_eq!(app.data_plane.database_names().await.len(), 1);
}

#[tokio::test]
async fn test_schema_failure_leaves_nothing_behind() {
    let app = setup_test_app();
    app.data_plane.inject_fault(DataPlaneFault::ApplySchema).await;

    let response = app
        .client()
        .post(&api_path("/auth/register"))
        .json(&json!({
            "company_name": "Acme",
            "admin_email": "admin@acme.com",
            "admin_password": TEST_PASSWORD,
        }))
        .await;

    assert_eq!(response.status_code(), 500);
    assert_eq!(response.json::<ErrorResponse>().code, "PROVISIONING_FAILED");
    assert_eq!(app.registry.company_count().await, 0);
    assert_eq!(app.registry.tenant_database_count().await, 0);
    assert_eq!(app.registry.subscription_count().await, 0);
    assert!(app.data_plane.database_names().await.is_empty());
    assert_eq!(app.data_plane.dropped_databases().await.len(), 1);
    assert!(app.state.router.is_empty().await);

    app.data_plane.clear_faults().await;
    register_company(app.client(), "Acme", "admin@acme.com").await;
}

#[tokio::test]
async fn test_invalid_registration_is_bad_request() {
    let app = setup_test_app();
    let client = app.client();

    let short_password = client
        .post(&api_path("/auth/register"))
        .json(&json!({
            "company_name": "Acme",
            "admin_email": "admin@acme.com",
            "admin_password": "short",
        }))
        .await;
    assert_eq!(short_password.status_code(), 400);
    assert_eq!(short_password.json::<ErrorResponse>().code, "INVALID_INPUT");

    let bad_email = client
        .post(&api_path("/auth/register"))
        .json(&json!({
            "company_name": "Acme",
            "admin_email": "nope",
            "admin_password": TEST_PASSWORD,
        }))
        .await;
    assert_eq!(bad_email.status_code(), 400);

    let malformed = client
        .post(&api_path("/auth/register"))
        .json(&json!({ "company_name": "Acme" }))
        .await;
    assert_eq!(malformed.status_code(), 400);

    assert_eq!(app.registry.company_count().await, 0);
}

#[tokio::test]
async fn test_taken_subdomain_gets_suffixed() {
    let app = setup_test_app();
    let first = register_company(app.client(), "Acme", "one@acme.com").await;
    let second = register_company(app.client(), "Acme", "two@acme.com").await;

    assert_eq!(first.subdomain, "acme");
    assert_ne!(second.subdomain, first.subdomain);
    assert!(second.subdomain.starts_with("acme-"));
}
