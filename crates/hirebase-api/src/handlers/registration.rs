//! Self-service company registration

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use hirebase_core::models::{OnboardingResult, RegistrationRequest};

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

/// Register a company and its first administrator
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "onboarding",
    request_body = RegistrationRequest,
    responses(
        (status = 201, description = "Company provisioned", body = OnboardingResult),
        (status = 400, description = "Invalid registration data", body = ErrorResponse),
        (status = 409, description = "Contact email already registered", body = ErrorResponse),
        (status = 500, description = "Provisioning failed and was rolled back", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<RegistrationRequest>,
) -> Result<(StatusCode, Json<OnboardingResult>), HttpAppError> {
    onboard(&state, request).await
}

/// Register a company (alias of `/auth/register`)
#[utoipa::path(
    post,
    path = "/api/v1/companies/register",
    tag = "onboarding",
    request_body = RegistrationRequest,
    responses(
        (status = 201, description = "Company provisioned", body = OnboardingResult),
        (status = 400, description = "Invalid registration data", body = ErrorResponse),
        (status = 409, description = "Contact email already registered", body = ErrorResponse),
        (status = 500, description = "Provisioning failed and was rolled back", body = ErrorResponse)
    )
)]
pub async fn register_company(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<RegistrationRequest>,
) -> Result<(StatusCode, Json<OnboardingResult>), HttpAppError> {
    onboard(&state, request).await
}

async fn onboard(
    state: &AppState,
    request: RegistrationRequest,
) -> Result<(StatusCode, Json<OnboardingResult>), HttpAppError> {
    let result = state.provisioning.onboard_company(request).await?;
    Ok((StatusCode::CREATED, Json(result)))
}
