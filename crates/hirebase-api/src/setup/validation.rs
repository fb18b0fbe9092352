//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use hirebase_core::Config;

/// Validate critical configuration values
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();

    if is_production && config.cors_origins().contains(&"*".to_string()) {
        return Err(anyhow::anyhow!(
            "CORS configured to allow all origins (*) in production - this is a security risk. \
            Please set specific allowed origins via CORS_ORIGINS environment variable."
        ));
    }

    if config.db_max_connections() == 0 {
        return Err(anyhow::anyhow!("Database max connections cannot be 0"));
    }

    if config.db_timeout_seconds() == 0 {
        return Err(anyhow::anyhow!("Database timeout cannot be 0"));
    }

    if config.jwt_expiry_hours() <= 0 {
        return Err(anyhow::anyhow!("JWT_EXPIRY_HOURS must be greater than 0"));
    }

    if !is_valid_header_name(config.tenant_header()) {
        return Err(anyhow::anyhow!(
            "TENANT_HEADER '{}' is not a valid HTTP header name",
            config.tenant_header()
        ));
    }

    match config.base_domain() {
        Some(domain) => {
            if !domain.split('.').all(is_valid_domain_label) {
                return Err(anyhow::anyhow!(
                    "BASE_DOMAIN '{}' is not a valid domain",
                    domain
                ));
            }
        }
        None => {
            tracing::warn!(
                "BASE_DOMAIN not set - tenants resolve from tokens and the tenant header only"
            );
        }
    }

    if is_production && config.tenancy().tenant_db_password.is_none() {
        tracing::warn!(
            "TENANT_DB_PASSWORD not set - tenant connections reuse the DATABASE_URL credentials"
        );
    }

    Ok(())
}

fn is_valid_domain_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn is_valid_header_name(name: &str) -> bool {
    axum::http::HeaderName::from_bytes(name.as_bytes()).is_ok()
}
