//! Route classification for tenant resolution.

use axum::http::Method;

use crate::constants::{API_PREFIX, OPENAPI_PATH};

/// How strictly a route requires a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPolicy {
    /// No resolution at all
    Public,
    /// Resolve when possible; failing to resolve is not an error
    Discovery,
    /// A tenant must be resolved before the handler runs
    Protected,
}

const PUBLIC_EXACT: &[&str] = &["/health", "/health/ready", OPENAPI_PATH];

const PUBLIC_API: &[&str] = &["/auth/register", "/companies/register"];

const DISCOVERY_API: &[&str] = &["/auth/login"];

pub fn policy_for(method: &Method, path: &str) -> PathPolicy {
    if method == Method::OPTIONS {
        return PathPolicy::Public;
    }

    let path = match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    };

    if PUBLIC_EXACT.contains(&path) || path == "/docs" || path.starts_with("/docs/") {
        return PathPolicy::Public;
    }

    if let Some(api_path) = path.strip_prefix(API_PREFIX) {
        if PUBLIC_API.contains(&api_path) {
            return PathPolicy::Public;
        }
        if DISCOVERY_API.contains(&api_path) {
            return PathPolicy::Discovery;
        }
    }

    PathPolicy::Protected
}
