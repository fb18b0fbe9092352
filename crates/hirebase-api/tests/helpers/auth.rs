use axum_test::TestServer;
use chrono::Duration;
use hirebase_api::auth::JwtService;
use hirebase_core::models::{OnboardingResult, UserRole};
use serde_json::json;
use uuid::Uuid;

use super::{api_path, TEST_JWT_SECRET};

pub const TEST_PASSWORD: &str = "TestPassword123!";

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Register a company through the public endpoint and return the onboarding result.
pub async fn register_company(
    client: &TestServer,
    company_name: &str,
    admin_email: &str,
) -> OnboardingResult {
    let response = client
        .post(&api_path("/auth/register"))
        .json(&json!({
            "company_name": company_name,
            "admin_email": admin_email,
            "admin_password": TEST_PASSWORD,
            "admin_name": "Test Admin",
        }))
        .await;

    assert_eq!(response.status_code(), 201, "{}", response.text());
    response.json::<OnboardingResult>()
}

/// Token signed with the test secret but already expired
pub fn expired_token(tenant_id: Uuid) -> String {
    JwtService::new(TEST_JWT_SECRET, 1)
        .issue(
            Uuid::new_v4(),
            Some(tenant_id),
            UserRole::Admin,
            Some(Duration::hours(-2)),
        )
        .expect("Failed to sign token")
}

pub fn token_for(tenant_id: Uuid, user_id: Uuid, role: UserRole) -> String {
    JwtService::new(TEST_JWT_SECRET, 1)
        .issue(user_id, Some(tenant_id), role, None)
        .expect("Failed to sign token")
}
