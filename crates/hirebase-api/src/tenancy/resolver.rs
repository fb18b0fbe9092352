//! Tenant resolution from request credentials and addressing
//!
//! Order, first success wins:
//! 1. Bearer token with a `tenant_id` claim (no registry round-trip)
//! 2. Subdomain of the `Host` header under the configured base domain
//! 3. Explicit identifier: tenant header, then `tenant` query parameter

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Query;
use axum::http::{header, HeaderMap, Uri};
use hirebase_core::constants::TENANT_QUERY_PARAM;
use hirebase_core::models::Company;
use hirebase_core::validation::{is_reserved_subdomain, is_valid_subdomain};
use hirebase_core::AppError;
use hirebase_db::TenantRegistry;
use uuid::Uuid;

use crate::auth::{JwtClaims, JwtService};
use crate::middleware::audit;
use crate::tenancy::paths::PathPolicy;

/// Where the tenant of a request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Token,
    Subdomain,
    Header,
    QueryParam,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub company_id: Uuid,
    pub source: ResolutionSource,
    /// Verified claims, present only when the token named this tenant
    pub claims: Option<JwtClaims>,
}

#[derive(Clone)]
pub struct TenantResolver {
    registry: Arc<dyn TenantRegistry>,
    jwt: JwtService,
    base_domain: Option<String>,
    tenant_header: String,
}

impl TenantResolver {
    pub fn new(
        registry: Arc<dyn TenantRegistry>,
        jwt: JwtService,
        base_domain: Option<String>,
        tenant_header: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            jwt,
            base_domain: base_domain.map(|d| d.trim_start_matches('.').to_lowercase()),
            tenant_header: tenant_header.into(),
        }
    }

    /// Resolve the tenant of a request.
    ///
    /// Returns `Ok(None)` only for non-protected routes. Registry failures are
    /// propagated and never read as "no tenant".
    pub async fn resolve(
        &self,
        headers: &HeaderMap,
        uri: &Uri,
        policy: PathPolicy,
    ) -> Result<Option<Resolution>, AppError> {
        if let Some(token) = bearer_token(headers) {
            match self.jwt.decode(token) {
                Ok(claims) => {
                    if let Some(tenant_id) = claims.tenant_id {
                        self.check_explicit_matches(headers, uri, &claims, tenant_id)
                            .await?;
                        return Ok(Some(Resolution {
                            company_id: tenant_id,
                            source: ResolutionSource::Token,
                            claims: Some(claims),
                        }));
                    }
                }
                Err(e) if policy == PathPolicy::Protected => return Err(e),
                Err(e) => {
                    tracing::debug!(error = %e, "Ignoring invalid token on discovery route");
                }
            }
        }

        if let Some(label) = self.host_subdomain(headers) {
            if let Some(company) = self.registry.find_company_by_subdomain(&label).await? {
                return Ok(Some(Resolution {
                    company_id: company.id,
                    source: ResolutionSource::Subdomain,
                    claims: None,
                }));
            }
            tracing::debug!(subdomain = %label, "No active company for host subdomain");
        }

        if let Some((value, source)) = self.explicit_identifier(headers, uri) {
            if let Some(company) = self.lookup_identifier(&value).await? {
                return Ok(Some(Resolution {
                    company_id: company.id,
                    source,
                    claims: None,
                }));
            }
            tracing::debug!(identifier = %value, ?source, "No active company for identifier");
        }

        match policy {
            PathPolicy::Protected => Err(AppError::TenantUnresolved(
                "No tenant could be resolved for this request".to_string(),
            )),
            PathPolicy::Public | PathPolicy::Discovery => Ok(None),
        }
    }

    /// Reject a request whose explicit tenant identifier names a tenant other than
    /// the one in its token.
    async fn check_explicit_matches(
        &self,
        headers: &HeaderMap,
        uri: &Uri,
        claims: &JwtClaims,
        tenant_id: Uuid,
    ) -> Result<(), AppError> {
        let Some((value, _)) = self.explicit_identifier(headers, uri) else {
            return Ok(());
        };

        let requested = match Uuid::parse_str(&value) {
            Ok(id) => Some(id),
            Err(_) => self
                .registry
                .find_company_by_subdomain(&value.to_lowercase())
                .await?
                .map(|company| company.id),
        };

        if requested == Some(tenant_id) {
            return Ok(());
        }

        audit::log_cross_tenant_access(
            tenant_id,
            requested,
            Some(claims.sub),
            Some(uri.path().to_string()),
            "Explicit tenant identifier does not match token",
        );
        Err(AppError::CrossTenantAccess(format!(
            "Token for tenant {} cannot address tenant '{}'",
            tenant_id, value
        )))
    }

    /// First label of the host when it sits directly under the base domain.
    fn host_subdomain(&self, headers: &HeaderMap) -> Option<String> {
        let base_domain = self.base_domain.as_deref()?;
        let host = headers.get(header::HOST)?.to_str().ok()?;
        let host = host.split(':').next()?.trim_end_matches('.').to_lowercase();

        // Exactly one label under the base domain; `a.b.<base>` names no tenant.
        let label = host.strip_suffix(base_domain)?.strip_suffix('.')?;
        if label.contains('.') {
            return None;
        }

        if is_reserved_subdomain(label) || !is_valid_subdomain(label) {
            return None;
        }
        Some(label.to_string())
    }

    fn explicit_identifier(
        &self,
        headers: &HeaderMap,
        uri: &Uri,
    ) -> Option<(String, ResolutionSource)> {
        let from_header = headers
            .get(self.tenant_header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| (v.to_string(), ResolutionSource::Header));

        from_header.or_else(|| {
            Query::<HashMap<String, String>>::try_from_uri(uri)
                .ok()
                .and_then(|Query(mut params)| params.remove(TENANT_QUERY_PARAM))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(|v| (v, ResolutionSource::QueryParam))
        })
    }

    async fn lookup_identifier(&self, value: &str) -> Result<Option<Company>, AppError> {
        match Uuid::parse_str(value) {
            Ok(id) => self.registry.find_company_by_id(id).await,
            Err(_) => {
                self.registry
                    .find_company_by_subdomain(&value.to_lowercase())
                    .await
            }
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Duration;
    use hirebase_core::models::UserRole;
    use hirebase_db::testing::InMemoryRegistry;

    const SECRET: &str = "resolver-test-secret-0123456789abcdef";

    fn resolver(registry: Arc<InMemoryRegistry>) -> TenantResolver {
        TenantResolver::new(
            registry,
            JwtService::new(SECRET, 1),
            Some("hirebase.test".to_string()),
            "X-Tenant-ID",
        )
    }

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_token_claim_wins_without_registry_lookup() {
        let registry = Arc::new(InMemoryRegistry::new());
        let tenant = Uuid::new_v4();
        let token = JwtService::new(SECRET, 1)
            .issue(Uuid::new_v4(), Some(tenant), UserRole::Recruiter, None)
            .unwrap();
        registry.set_unavailable(true);

        let resolution = resolver(registry)
            .resolve(
                &headers(&[("authorization", &format!("Bearer {}", token))]),
                &uri("/api/v1/me"),
                PathPolicy::Protected,
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(resolution.company_id, tenant);
        assert_eq!(resolution.source, ResolutionSource::Token);
        assert!(resolution.claims.is_some());
    }

    #[tokio::test]
    async fn test_subdomain_resolves_to_owner() {
        let registry = Arc::new(InMemoryRegistry::new());
        let (acme, _) = registry.seed_tenant("Acme", "acme").await;
        let (globex, _) = registry.seed_tenant("Globex", "globex").await;
        let resolver = resolver(registry);

        for (host, expected) in [
            ("acme.hirebase.test", acme.id),
            ("Globex.hirebase.test:8080", globex.id),
        ] {
            let resolution = resolver
                .resolve(&headers(&[("host", host)]), &uri("/api/v1/me"), PathPolicy::Protected)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(resolution.company_id, expected);
            assert_eq!(resolution.source, ResolutionSource::Subdomain);
        }
    }

    #[tokio::test]
    async fn test_reserved_and_foreign_hosts_are_ignored() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.seed_tenant("Www", "www").await;
        let resolver = resolver(registry);

        for host in ["www.hirebase.test", "hirebase.test", "acme.example.com"] {
            let result = resolver
                .resolve(&headers(&[("host", host)]), &uri("/api/v1/me"), PathPolicy::Protected)
                .await;
            assert!(matches!(result, Err(AppError::TenantUnresolved(_))), "{}", host);
        }
    }

    #[tokio::test]
    async fn test_nested_subdomain_does_not_resolve() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.seed_tenant("Acme", "acme").await;
        let resolver = resolver(registry);

        for host in ["acme.eu.hirebase.test", "eu.acme.hirebase.test:8080"] {
            let result = resolver
                .resolve(&headers(&[("host", host)]), &uri("/api/v1/me"), PathPolicy::Protected)
                .await;
            assert!(matches!(result, Err(AppError::TenantUnresolved(_))), "{}", host);
        }
    }

    #[tokio::test]
    async fn test_explicit_header_and_query_param() {
        let registry = Arc::new(InMemoryRegistry::new());
        let (acme, _) = registry.seed_tenant("Acme", "acme").await;
        let resolver = resolver(registry);

        let by_id = resolver
            .resolve(
                &headers(&[("x-tenant-id", &acme.id.to_string())]),
                &uri("/api/v1/me"),
                PathPolicy::Protected,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id.company_id, acme.id);
        assert_eq!(by_id.source, ResolutionSource::Header);

        let by_query = resolver
            .resolve(&HeaderMap::new(), &uri("/api/v1/me?tenant=ACME"), PathPolicy::Protected)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_query.company_id, acme.id);
        assert_eq!(by_query.source, ResolutionSource::QueryParam);
    }

    #[tokio::test]
    async fn test_inactive_company_does_not_resolve() {
        let registry = Arc::new(InMemoryRegistry::new());
        let (acme, _) = registry.seed_tenant("Acme", "acme").await;
        registry
            .update_company_status(acme.id, hirebase_core::models::CompanyStatus::Suspended)
            .await
            .unwrap();

        let result = resolver(registry)
            .resolve(&headers(&[("host", "acme.hirebase.test")]), &uri("/api/v1/me"), PathPolicy::Protected)
            .await;
        assert!(matches!(result, Err(AppError::TenantUnresolved(_))));
    }

    #[tokio::test]
    async fn test_expired_token_on_protected_route_is_unauthorized() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.seed_tenant("Acme", "acme").await;
        let token = JwtService::new(SECRET, 1)
            .issue(Uuid::new_v4(), Some(Uuid::new_v4()), UserRole::Admin, Some(Duration::hours(-3)))
            .unwrap();

        let result = resolver(registry)
            .resolve(
                &headers(&[
                    ("authorization", &format!("Bearer {}", token)),
                    ("host", "acme.hirebase.test"),
                ]),
                &uri("/api/v1/me"),
                PathPolicy::Protected,
            )
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_invalid_token_on_discovery_falls_through_to_subdomain() {
        let registry = Arc::new(InMemoryRegistry::new());
        let (acme, _) = registry.seed_tenant("Acme", "acme").await;

        let resolution = resolver(registry)
            .resolve(
                &headers(&[("authorization", "Bearer garbage"), ("host", "acme.hirebase.test")]),
                &uri("/api/v1/auth/login"),
                PathPolicy::Discovery,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolution.company_id, acme.id);
    }

    #[tokio::test]
    async fn test_unresolved_discovery_is_none() {
        let registry = Arc::new(InMemoryRegistry::new());
        let result = resolver(registry)
            .resolve(&HeaderMap::new(), &uri("/api/v1/auth/login"), PathPolicy::Discovery)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_claim_and_header_mismatch_is_cross_tenant() {
        let registry = Arc::new(InMemoryRegistry::new());
        let (acme, _) = registry.seed_tenant("Acme", "acme").await;
        let (globex, _) = registry.seed_tenant("Globex", "globex").await;
        let token = JwtService::new(SECRET, 1)
            .issue(Uuid::new_v4(), Some(acme.id), UserRole::Admin, None)
            .unwrap();
        let resolver = resolver(registry);
        let bearer = format!("Bearer {}", token);

        let mismatch = resolver
            .resolve(
                &headers(&[("authorization", &bearer), ("x-tenant-id", &globex.id.to_string())]),
                &uri("/api/v1/me"),
                PathPolicy::Protected,
            )
            .await;
        assert!(matches!(mismatch, Err(AppError::CrossTenantAccess(_))));

        let same = resolver
            .resolve(
                &headers(&[("authorization", &bearer), ("x-tenant-id", "acme")]),
                &uri("/api/v1/me"),
                PathPolicy::Protected,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(same.company_id, acme.id);
    }

    #[tokio::test]
    async fn test_registry_outage_is_not_unresolved() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.set_unavailable(true);
        let result = resolver(registry)
            .resolve(&headers(&[("host", "acme.hirebase.test")]), &uri("/api/v1/me"), PathPolicy::Protected)
            .await;
        assert!(matches!(result, Err(AppError::RegistryUnavailable(_))));
    }
}
