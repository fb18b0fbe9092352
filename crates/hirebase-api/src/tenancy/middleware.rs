//! Request interceptor binding the tenant of each request.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::Instrument;

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::tenancy::context::{self, TenantContext};
use crate::tenancy::paths::{policy_for, PathPolicy};

/// Resolve the tenant, fetch its pool and run the rest of the stack inside its scope.
///
/// Public routes pass through untouched. Discovery routes pass through without a
/// context when nothing resolves. Rejections happen here, before any handler runs.
pub async fn tenant_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let policy = policy_for(request.method(), request.uri().path());
    if policy == PathPolicy::Public {
        return next.run(request).await;
    }

    let resolution = match state
        .resolver
        .resolve(request.headers(), request.uri(), policy)
        .await
    {
        Ok(Some(resolution)) => resolution,
        Ok(None) => return next.run(request).await,
        Err(e) => return HttpAppError(e).into_response(),
    };

    let pool = match state.router.get_connection(resolution.company_id).await {
        Ok(pool) => pool,
        Err(e) => return HttpAppError(e).into_response(),
    };

    let ctx = TenantContext::new(resolution, pool);
    let span = tracing::info_span!(
        "tenant",
        company_id = %ctx.company_id,
        source = ?ctx.source,
    );
    request.extensions_mut().insert(ctx.clone());

    context::scope(ctx, next.run(request)).instrument(span).await
}
