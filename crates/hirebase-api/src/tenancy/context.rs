//! Per-request tenant context
//!
//! The resolved tenant is bound two ways for the lifetime of one request: inserted into
//! the request extensions (read by the [`TenantSession`] extractor) and bound to a
//! task-local (read by [`current_tenant_id`] and [`current_connection`] from code that
//! has no access to the request). The task-local binding ends when the request future
//! completes, fails or is dropped.

use std::convert::Infallible;
use std::future::Future;
use std::ops::Deref;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use hirebase_core::models::UserRole;
use hirebase_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::middleware::audit;
use crate::tenancy::resolver::{Resolution, ResolutionSource};

/// Tenant context stored in request extensions and in the request's task-local scope
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub company_id: Uuid,
    /// Authenticated user, when the tenant came from a token
    pub user_id: Option<Uuid>,
    pub role: Option<UserRole>,
    pub source: ResolutionSource,
    /// Pool of the tenant's own database
    pub pool: PgPool,
}

impl TenantContext {
    pub fn new(resolution: Resolution, pool: PgPool) -> Self {
        let (user_id, role) = match &resolution.claims {
            Some(claims) => (Some(claims.sub), claims.user_role().ok()),
            None => (None, None),
        };

        Self {
            company_id: resolution.company_id,
            user_id,
            role,
            source: resolution.source,
            pool,
        }
    }
}

tokio::task_local! {
    static CURRENT_TENANT: TenantContext;
}

/// Run `future` with `ctx` bound as the current tenant.
pub async fn scope<F>(ctx: TenantContext, future: F) -> F::Output
where
    F: Future,
{
    CURRENT_TENANT.scope(ctx, future).await
}

/// Company id of the request being served, if any.
pub fn current_tenant_id() -> Option<Uuid> {
    CURRENT_TENANT.try_with(|ctx| ctx.company_id).ok()
}

/// Pool of the current tenant's database, if any.
pub fn current_connection() -> Option<PgPool> {
    CURRENT_TENANT.try_with(|ctx| ctx.pool.clone()).ok()
}

pub fn current_context() -> Option<TenantContext> {
    CURRENT_TENANT.try_with(Clone::clone).ok()
}

/// Extractor for handlers that run inside a resolved tenant.
///
/// Rejects with `TenantUnresolved` when the interceptor bound no tenant. Use
/// `Option<TenantSession>` on routes where the tenant is optional.
#[derive(Debug, Clone)]
pub struct TenantSession(pub TenantContext);

impl Deref for TenantSession {
    type Target = TenantContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TenantSession {
    /// Authenticated user id, or `Unauthorized` when the tenant came from addressing only.
    pub fn require_user(&self) -> Result<Uuid, AppError> {
        self.user_id
            .ok_or_else(|| AppError::Unauthorized("A valid access token is required".to_string()))
    }

    pub fn require_role(&self, role: UserRole) -> Result<(), AppError> {
        self.require_user()?;
        if self.role == Some(role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("Requires the {} role", role)))
        }
    }

    /// Reject access to a record owned by another company.
    pub fn ensure_same_tenant(&self, owner_company_id: Uuid) -> Result<(), AppError> {
        if owner_company_id == self.company_id {
            return Ok(());
        }

        audit::log_cross_tenant_access(
            self.company_id,
            Some(owner_company_id),
            self.user_id,
            None,
            "Record belongs to another tenant",
        );
        Err(AppError::CrossTenantAccess(format!(
            "Tenant {} cannot access resources of tenant {}",
            self.company_id, owner_company_id
        )))
    }
}

impl<S> FromRequestParts<S> for TenantSession
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .map(TenantSession)
            .ok_or_else(|| {
                HttpAppError(AppError::TenantUnresolved(
                    "Missing tenant context".to_string(),
                ))
            })
    }
}

impl<S> OptionalFromRequestParts<S> for TenantSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .map(TenantSession))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hirebase_db::testing::lazy_pool;

    fn context(company_id: Uuid, role: Option<UserRole>) -> TenantContext {
        TenantContext {
            company_id,
            user_id: role.map(|_| Uuid::new_v4()),
            role,
            source: ResolutionSource::Token,
            pool: lazy_pool(&format!("tenant_{}", company_id.simple())),
        }
    }

    #[tokio::test]
    async fn test_scope_binds_and_releases() {
        let company_id = Uuid::new_v4();
        assert!(current_tenant_id().is_none());

        let seen = scope(context(company_id, None), async { current_tenant_id() }).await;

        assert_eq!(seen, Some(company_id));
        assert!(current_tenant_id().is_none());
        assert!(current_connection().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_scopes_are_isolated() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let run = |id: Uuid| {
            tokio::spawn(scope(context(id, None), async move {
                for _ in 0..10 {
                    tokio::task::yield_now().await;
                    assert_eq!(current_tenant_id(), Some(id));
                }
                current_connection()
                    .and_then(|pool| pool.connect_options().get_database().map(str::to_string))
            }))
        };

        let (db_a, db_b) = tokio::join!(run(a), run(b));
        assert_eq!(db_a.unwrap(), Some(format!("tenant_{}", a.simple())));
        assert_eq!(db_b.unwrap(), Some(format!("tenant_{}", b.simple())));
    }

    #[tokio::test]
    async fn test_scope_released_on_cancellation() {
        let company_id = Uuid::new_v4();
        let pending = scope(context(company_id, None), std::future::pending::<()>());
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(10), pending).await;

        assert!(timed_out.is_err());
        assert!(current_tenant_id().is_none());
    }

    #[tokio::test]
    async fn test_ensure_same_tenant() {
        let company_id = Uuid::new_v4();
        let session = TenantSession(context(company_id, Some(UserRole::Admin)));

        assert!(session.ensure_same_tenant(company_id).is_ok());
        assert!(matches!(
            session.ensure_same_tenant(Uuid::new_v4()),
            Err(AppError::CrossTenantAccess(_))
        ));
    }

    #[tokio::test]
    async fn test_require_role() {
        let admin = TenantSession(context(Uuid::new_v4(), Some(UserRole::Admin)));
        let viewer = TenantSession(context(Uuid::new_v4(), Some(UserRole::Viewer)));
        let anonymous = TenantSession(context(Uuid::new_v4(), None));

        assert!(admin.require_role(UserRole::Admin).is_ok());
        assert!(matches!(
            viewer.require_role(UserRole::Admin),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            anonymous.require_role(UserRole::Admin),
            Err(AppError::Unauthorized(_))
        ));
    }
}
