//! Handlers running inside a resolved tenant

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use hirebase_core::models::{
    Company, CompanyStatus, Subscription, TenantDatabaseStatus, TenantUser, UserRole,
};
use hirebase_core::AppError;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::middleware::audit;
use crate::state::AppState;
use crate::tenancy::TenantSession;

#[derive(Debug, Serialize, ToSchema)]
pub struct TenantDatabaseSummary {
    pub database_name: String,
    pub status: TenantDatabaseStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TenantResponse {
    pub company: Company,
    pub database: Option<TenantDatabaseSummary>,
    pub subscription: Option<Subscription>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SuspendResponse {
    pub company_id: Uuid,
    pub status: CompanyStatus,
    /// Whether a cached pool was closed
    pub pool_evicted: bool,
}

/// Current company with its database and subscription
#[utoipa::path(
    get,
    path = "/api/v1/tenant",
    tag = "tenant",
    responses(
        (status = 200, description = "Current tenant", body = TenantResponse),
        (status = 401, description = "No tenant resolved", body = ErrorResponse),
        (status = 404, description = "Company not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, session), fields(company_id = %session.company_id))]
pub async fn get_tenant(
    State(state): State<Arc<AppState>>,
    session: TenantSession,
) -> Result<Json<TenantResponse>, HttpAppError> {
    let company = state
        .registry
        .find_company_by_id(session.company_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;
    let database = state
        .registry
        .find_tenant_database(session.company_id)
        .await?
        .map(|db| TenantDatabaseSummary {
            database_name: db.database_name,
            status: db.status,
        });
    let subscription = state.registry.find_subscription(session.company_id).await?;

    Ok(Json(TenantResponse {
        company,
        database,
        subscription,
    }))
}

/// The authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "tenant",
    responses(
        (status = 200, description = "Current user", body = TenantUser),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    session: TenantSession,
) -> Result<Json<TenantUser>, HttpAppError> {
    let user_id = session.require_user()?;
    let user = state
        .data_plane
        .find_user_by_id(&session.pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

/// Suspend a company: registry statuses move to suspended and its pool is closed
#[utoipa::path(
    post,
    path = "/api/v1/admin/tenants/{id}/suspend",
    tag = "tenant",
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company suspended", body = SuspendResponse),
        (status = 403, description = "Not an administrator of this company", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, session))]
pub async fn suspend_tenant(
    State(state): State<Arc<AppState>>,
    session: TenantSession,
    Path(id): Path<Uuid>,
) -> Result<Json<SuspendResponse>, HttpAppError> {
    session.require_role(UserRole::Admin)?;
    session.ensure_same_tenant(id)?;

    let company = state
        .registry
        .update_company_status(id, CompanyStatus::Suspended)
        .await?;
    state
        .registry
        .update_tenant_database_status(id, TenantDatabaseStatus::Suspended)
        .await?;
    let pool_evicted = state.router.evict(id).await;

    audit::log_tenant_suspended(id, session.user_id);
    tracing::info!(company_id = %id, pool_evicted, "Tenant suspended");

    Ok(Json(SuspendResponse {
        company_id: company.id,
        status: company.status,
        pool_evicted,
    }))
}
