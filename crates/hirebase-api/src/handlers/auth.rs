//! Login inside a tenant

use std::sync::Arc;

use axum::{extract::State, Json};
use hirebase_core::AppError;
use validator::Validate;

use crate::auth::{verify_password, LoginRequest, TokenResponse};
use crate::constants::TOKEN_TYPE;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::middleware::audit;
use crate::state::AppState;
use crate::tenancy::TenantSession;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Exchange email and password for an access token.
///
/// The tenant comes from the host subdomain or the tenant header; the password is
/// checked against the users table of that tenant's database.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    params(
        ("X-Tenant-ID" = Option<String>, Header, description = "Company id or subdomain when not using a tenant subdomain")
    ),
    responses(
        (status = 200, description = "Authenticated", body = TokenResponse),
        (status = 401, description = "Unknown tenant or invalid credentials", body = ErrorResponse),
        (status = 503, description = "Tenant database unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, session, request))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Option<TenantSession>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>, HttpAppError> {
    let session = session.ok_or_else(|| {
        AppError::TenantUnresolved(
            "Sign in through your company subdomain or pass the tenant header".to_string(),
        )
    })?;
    request.validate().map_err(AppError::from)?;

    let user = state
        .data_plane
        .find_user_by_email(&session.pool, &request.email)
        .await?;

    let user = match user {
        Some(user) if user.is_active && verify_password(&request.password, &user.password_hash)? => {
            user
        }
        other => {
            audit::log_login(
                session.company_id,
                other.map(|u| u.id),
                &request.email,
                false,
                Some(INVALID_CREDENTIALS),
            );
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()).into());
        }
    };

    let access_token = state
        .jwt
        .issue(user.id, Some(session.company_id), user.role, None)?;
    audit::log_login(session.company_id, Some(user.id), &user.email, true, None);

    Ok(Json(TokenResponse {
        access_token,
        token_type: TOKEN_TYPE.to_string(),
        expires_in: state.jwt.default_ttl().num_seconds(),
    }))
}
