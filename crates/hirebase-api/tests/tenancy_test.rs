//! Tenant resolution and routing through the HTTP stack.
//!
//! Run with: `cargo test -p hirebase-api --test tenancy_test`

mod helpers;

use helpers::auth::{bearer, expired_token, register_company, token_for, TEST_PASSWORD};
use helpers::{api_path, setup_test_app, tenant_host};
use hirebase_api::ErrorResponse;
use hirebase_api::auth::TokenResponse;
use hirebase_core::models::UserRole;
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn test_public_paths_need_no_tenant() {
    let app = setup_test_app();
    let client = app.client();

    let health = client.get("/health").await;
    assert_eq!(health.status_code(), 200);

    let spec = client.get("/api/openapi.json").await;
    assert_eq!(spec.status_code(), 200);
    assert!(spec.json::<Value>()["paths"]["/api/v1/me"].is_object());

    assert_eq!(app.registry.tenant_database_lookups(), 0);
    assert_eq!(app.pools.created(), 0);
}

#[tokio::test]
async fn test_readiness_reflects_registry() {
    let app = setup_test_app();
    let client = app.client();

    assert_eq!(client.get("/health/ready").await.status_code(), 200);

    app.registry.set_unavailable(true);
    assert_eq!(client.get("/health/ready").await.status_code(), 503);
}

#[tokio::test]
async fn test_protected_path_without_tenant_is_unresolved() {
    let app = setup_test_app();

    let response = app.client().get(&api_path("/tenant")).await;

    assert_eq!(response.status_code(), 401);
    assert_eq!(response.json::<ErrorResponse>().code, "TENANT_UNRESOLVED");
}

#[tokio::test]
async fn test_expired_token_without_subdomain_is_unauthorized() {
    let app = setup_test_app();
    let (company, _) = app.registry.seed_tenant("Acme", "acme").await;

    let response = app
        .client()
        .get(&api_path("/me"))
        .add_header("Authorization", bearer(&expired_token(company.id)))
        .await;

    assert_eq!(response.status_code(), 401);
    assert_eq!(response.json::<ErrorResponse>().code, "UNAUTHORIZED");
}

#[tokio::test]
async fn test_expired_token_is_not_rescued_by_subdomain() {
    let app = setup_test_app();
    let (company, _) = app.registry.seed_tenant("Acme", "acme").await;

    let response = app
        .client()
        .get(&api_path("/tenant"))
        .add_header("Authorization", bearer(&expired_token(company.id)))
        .add_header("Host", tenant_host("acme"))
        .await;

    assert_eq!(response.status_code(), 401);
    assert_eq!(response.json::<ErrorResponse>().code, "UNAUTHORIZED");
}

#[tokio::test]
async fn test_every_subdomain_resolves_to_its_owner() {
    let app = setup_test_app();
    let client = app.client();

    let mut companies = Vec::new();
    for subdomain in ["acme", "globex", "initech"] {
        let (company, _) = app.registry.seed_tenant(subdomain, subdomain).await;
        companies.push((subdomain, company.id));
    }

    for (subdomain, company_id) in companies {
        let response = client
            .get(&api_path("/tenant"))
            .add_header("Host", tenant_host(subdomain))
            .await;
        assert_eq!(response.status_code(), 200);
        let body = response.json::<Value>();
        assert_eq!(body["company"]["id"], json!(company_id));
        assert_eq!(body["company"]["subdomain"], json!(subdomain));
    }
}

#[tokio::test]
async fn test_provisioned_company_resolves_by_subdomain() {
    let app = setup_test_app();
    let client = app.client();
    let onboarded = register_company(client, "Acme Recruiting", "admin@acme.com").await;

    let response = client
        .get(&api_path("/tenant"))
        .add_header("Host", tenant_host(&onboarded.subdomain))
        .await;

    assert_eq!(response.status_code(), 200);
    let body = response.json::<Value>();
    assert_eq!(body["company"]["id"], json!(onboarded.company_id));
    assert_eq!(body["company"]["status"], "active");
    assert_eq!(body["database"]["status"], "active");
    assert_eq!(body["database"]["database_name"], json!(onboarded.database_name));
    assert_eq!(body["subscription"]["status"], "trial");
}

#[tokio::test]
async fn test_token_from_registration_reaches_me() {
    let app = setup_test_app();
    let client = app.client();
    let onboarded = register_company(client, "Acme", "admin@acme.com").await;

    let response = client
        .get(&api_path("/me"))
        .add_header("Authorization", bearer(&onboarded.access_token))
        .await;

    assert_eq!(response.status_code(), 200);
    let body = response.json::<Value>();
    assert_eq!(body["id"], json!(onboarded.admin_user_id));
    assert_eq!(body["email"], "admin@acme.com");
    assert_eq!(body["role"], "admin");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_me_requires_a_user() {
    let app = setup_test_app();
    app.registry.seed_tenant("Acme", "acme").await;

    let response = app
        .client()
        .get(&api_path("/me"))
        .add_header("Host", tenant_host("acme"))
        .await;

    assert_eq!(response.status_code(), 401);
    assert_eq!(response.json::<ErrorResponse>().code, "UNAUTHORIZED");
}

#[tokio::test]
async fn test_token_for_one_tenant_cannot_address_another() {
    let app = setup_test_app();
    let (acme, _) = app.registry.seed_tenant("Acme", "acme").await;
    let (globex, _) = app.registry.seed_tenant("Globex", "globex").await;
    let token = token_for(acme.id, Uuid::new_v4(), UserRole::Admin);

    let response = app
        .client()
        .get(&api_path("/tenant"))
        .add_header("Authorization", bearer(&token))
        .add_header("X-Tenant-ID", globex.id.to_string())
        .await;

    assert_eq!(response.status_code(), 403);
    assert_eq!(response.json::<ErrorResponse>().code, "CROSS_TENANT_ACCESS");
    assert_eq!(app.pools.created(), 0);
}

#[tokio::test]
async fn test_concurrent_requests_see_their_own_tenant() {
    let app = setup_test_app();
    let client = app.client();
    let (acme, _) = app.registry.seed_tenant("Acme", "acme").await;
    let (globex, _) = app.registry.seed_tenant("Globex", "globex").await;
    let acme_token = bearer(&token_for(acme.id, Uuid::new_v4(), UserRole::Viewer));
    let globex_token = bearer(&token_for(globex.id, Uuid::new_v4(), UserRole::Viewer));

    for _ in 0..5 {
        let (a, b) = tokio::join!(
            async {
                client
                    .get(&api_path("/tenant"))
                    .add_header("Authorization", acme_token.clone())
                    .await
            },
            async {
                client
                    .get(&api_path("/tenant"))
                    .add_header("Authorization", globex_token.clone())
                    .await
            },
        );
        assert_eq!(a.json::<Value>()["company"]["id"], json!(acme.id));
        assert_eq!(b.json::<Value>()["company"]["id"], json!(globex.id));
    }

    assert_eq!(app.pools.created(), 2);
    let mut cached = app.state.router.cached_tenants().await;
    cached.sort();
    let mut expected = vec![acme.id, globex.id];
    expected.sort();
    assert_eq!(cached, expected);
}

#[tokio::test]
async fn test_concurrent_first_requests_build_one_pool() {
    let app = setup_test_app();
    let client = app.client();
    let (acme, _) = app.registry.seed_tenant("Acme", "acme").await;
    app.pools.set_delay(std::time::Duration::from_millis(50));
    let id = acme.id.to_string();

    let request = || async {
        client
            .get(&api_path("/tenant"))
            .add_header("X-Tenant-ID", id.clone())
            .await
    };
    let (a, b, c, d) = tokio::join!(request(), request(), request(), request());

    for response in [a, b, c, d] {
        assert_eq!(response.status_code(), 200);
    }
    assert_eq!(app.pools.created(), 1);
}

#[tokio::test]
async fn test_registry_outage_is_service_unavailable() {
    let app = setup_test_app();
    app.registry.seed_tenant("Acme", "acme").await;
    app.registry.set_unavailable(true);

    let response = app
        .client()
        .get(&api_path("/tenant"))
        .add_header("Host", tenant_host("acme"))
        .await;

    assert_eq!(response.status_code(), 503);
    assert_eq!(response.json::<ErrorResponse>().code, "REGISTRY_UNAVAILABLE");
}

#[tokio::test]
async fn test_tenant_database_connection_failure_is_service_unavailable() {
    let app = setup_test_app();
    app.registry.seed_tenant("Acme", "acme").await;
    app.pools.set_failing(true);

    let response = app
        .client()
        .get(&api_path("/tenant"))
        .add_header("Host", tenant_host("acme"))
        .await;
    assert_eq!(response.status_code(), 503);
    assert_eq!(
        response.json::<ErrorResponse>().code,
        "TENANT_DATABASE_UNAVAILABLE"
    );

    app.pools.set_failing(false);
    let retry = app
        .client()
        .get(&api_path("/tenant"))
        .add_header("Host", tenant_host("acme"))
        .await;
    assert_eq!(retry.status_code(), 200);
}

#[tokio::test]
async fn test_login_through_subdomain() {
    let app = setup_test_app();
    let client = app.client();
    let onboarded = register_company(client, "Acme", "admin@acme.com").await;

    let response = client
        .post(&api_path("/auth/login"))
        .add_header("Host", tenant_host(&onboarded.subdomain))
        .json(&json!({ "email": "Admin@Acme.com", "password": TEST_PASSWORD }))
        .await;
    assert_eq!(response.status_code(), 200);
    let token = response.json::<TokenResponse>();
    assert_eq!(token.token_type, "Bearer");

    let claims = app.state.jwt.decode(&token.access_token).unwrap();
    assert_eq!(claims.tenant_id, Some(onboarded.company_id));
    assert_eq!(claims.sub, onboarded.admin_user_id);
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let app = setup_test_app();
    let client = app.client();
    let onboarded = register_company(client, "Acme", "admin@acme.com").await;

    let response = client
        .post(&api_path("/auth/login"))
        .add_header("X-Tenant-ID", onboarded.subdomain.clone())
        .json(&json!({ "email": "admin@acme.com", "password": "not-the-password" }))
        .await;

    assert_eq!(response.status_code(), 401);
    assert_eq!(response.json::<ErrorResponse>().code, "UNAUTHORIZED");
}

#[tokio::test]
async fn test_login_ignores_stale_token_and_needs_a_tenant() {
    let app = setup_test_app();
    let client = app.client();
    let onboarded = register_company(client, "Acme", "admin@acme.com").await;

    let without_tenant = client
        .post(&api_path("/auth/login"))
        .add_header("Authorization", bearer("stale.token.value"))
        .json(&json!({ "email": "admin@acme.com", "password": TEST_PASSWORD }))
        .await;
    assert_eq!(without_tenant.status_code(), 401);
    assert_eq!(
        without_tenant.json::<ErrorResponse>().code,
        "TENANT_UNRESOLVED"
    );

    let with_subdomain = client
        .post(&api_path("/auth/login"))
        .add_header("Authorization", bearer("stale.token.value"))
        .add_header("Host", tenant_host(&onboarded.subdomain))
        .json(&json!({ "email": "admin@acme.com", "password": TEST_PASSWORD }))
        .await;
    assert_eq!(with_subdomain.status_code(), 200);
}

#[tokio::test]
async fn test_admin_suspends_own_tenant() {
    let app = setup_test_app();
    let client = app.client();
    let onboarded = register_company(client, "Acme", "admin@acme.com").await;
    assert!(app
        .state
        .router
        .cached_tenants()
        .await
        .contains(&onboarded.company_id));

    let response = client
        .post(&api_path(&format!(
            "/admin/tenants/{}/suspend",
            onboarded.company_id
        )))
        .add_header("Authorization", bearer(&onboarded.access_token))
        .await;
    assert_eq!(response.status_code(), 200);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "suspended");
    assert_eq!(body["pool_evicted"], true);
    assert!(app.state.router.is_empty().await);

    let by_subdomain = client
        .get(&api_path("/tenant"))
        .add_header("Host", tenant_host(&onboarded.subdomain))
        .await;
    assert_eq!(by_subdomain.status_code(), 401);

    let by_token = client
        .get(&api_path("/tenant"))
        .add_header("Authorization", bearer(&onboarded.access_token))
        .await;
    assert_eq!(by_token.status_code(), 503);
    assert_eq!(
        by_token.json::<ErrorResponse>().code,
        "TENANT_DATABASE_UNAVAILABLE"
    );
}

#[tokio::test]
async fn test_suspend_requires_admin_of_same_tenant() {
    let app = setup_test_app();
    let client = app.client();
    let (acme, _) = app.registry.seed_tenant("Acme", "acme").await;
    let (globex, _) = app.registry.seed_tenant("Globex", "globex").await;

    let recruiter = token_for(acme.id, Uuid::new_v4(), UserRole::Recruiter);
    let forbidden = client
        .post(&api_path(&format!("/admin/tenants/{}/suspend", acme.id)))
        .add_header("Authorization", bearer(&recruiter))
        .await;
    assert_eq!(forbidden.status_code(), 403);
    assert_eq!(forbidden.json::<ErrorResponse>().code, "FORBIDDEN");

    let admin = token_for(acme.id, Uuid::new_v4(), UserRole::Admin);
    let cross = client
        .post(&api_path(&format!("/admin/tenants/{}/suspend", globex.id)))
        .add_header("Authorization", bearer(&admin))
        .await;
    assert_eq!(cross.status_code(), 403);
    assert_eq!(cross.json::<ErrorResponse>().code, "CROSS_TENANT_ACCESS");

    let still_active = client
        .get(&api_path("/tenant"))
        .add_header("Host", tenant_host("globex"))
        .await;
    assert_eq!(still_active.status_code(), 200);
}
