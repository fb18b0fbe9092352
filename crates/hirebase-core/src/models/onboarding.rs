use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Self-service company registration
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegistrationRequest {
    #[validate(length(min = 1, max = 255, message = "Company name is required"))]
    pub company_name: String,
    /// Requested subdomain. Derived from the company name when omitted.
    #[serde(default)]
    pub subdomain: Option<String>,
    #[validate(email(message = "Admin email must be a valid email address"))]
    pub admin_email: String,
    pub admin_password: String,
    #[serde(default)]
    pub admin_name: Option<String>,
}

/// Outcome of a successful onboarding
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OnboardingResult {
    pub company_id: Uuid,
    pub admin_user_id: Uuid,
    pub subdomain: String,
    pub database_name: String,
    pub access_token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
}
