//! Configuration module
//!
//! This module provides configuration structures for the API and the tenancy
//! control plane: registry database, tenant database coordinates, authentication
//! and onboarding settings.

use std::env;

use crate::constants::{DEFAULT_MIN_PASSWORD_LENGTH, DEFAULT_TENANT_HEADER, DEFAULT_TRIAL_DAYS};

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const TENANT_MAX_CONNECTIONS: u32 = 5;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const JWT_EXPIRY_HOURS: i64 = 24;

/// Base configuration shared by every binary
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub environment: String,
    pub log_format: String,
}

/// Settings for tenant routing and onboarding
#[derive(Clone, Debug)]
pub struct TenancyConfig {
    /// Host recorded for newly provisioned tenant databases. Defaults to the registry host.
    pub tenant_db_host: Option<String>,
    /// Port recorded for newly provisioned tenant databases. Defaults to the registry port.
    pub tenant_db_port: Option<u16>,
    /// Login role recorded for tenant databases. Defaults to the registry user.
    pub tenant_db_user: Option<String>,
    /// Password used for tenant connections. Never written to the registry.
    pub tenant_db_password: Option<String>,
    pub tenant_db_max_connections: u32,
    /// Domain under which tenant subdomains live, e.g. `hirebase.io`.
    pub base_domain: Option<String>,
    pub tenant_header: String,
    pub trial_days: i64,
    pub min_password_length: usize,
}

/// Full service configuration
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub base: BaseConfig,
    pub database_url: String,
    pub tenancy: TenancyConfig,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

impl Config {
    fn inner(&self) -> &ServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().base.jwt_secret
    }

    pub fn jwt_expiry_hours(&self) -> i64 {
        self.inner().base.jwt_expiry_hours
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn log_format(&self) -> &str {
        &self.inner().base.log_format
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn tenancy(&self) -> &TenancyConfig {
        &self.inner().tenancy
    }

    pub fn base_domain(&self) -> Option<&str> {
        self.inner().tenancy.base_domain.as_deref()
    }

    pub fn tenant_header(&self) -> &str {
        &self.inner().tenancy.tenant_header
    }

    pub fn trial_days(&self) -> i64 {
        self.inner().tenancy.trial_days
    }

    pub fn min_password_length(&self) -> usize {
        self.inner().tenancy.min_password_length
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: env_parse("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            jwt_expiry_hours: env_parse("JWT_EXPIRY_HOURS", JWT_EXPIRY_HOURS),
            environment,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "text".to_string())
                .to_lowercase(),
        };

        let tenancy = TenancyConfig {
            tenant_db_host: env_non_empty("TENANT_DB_HOST"),
            tenant_db_port: env_non_empty("TENANT_DB_PORT").and_then(|s| s.parse().ok()),
            tenant_db_user: env_non_empty("TENANT_DB_USER"),
            tenant_db_password: env_non_empty("TENANT_DB_PASSWORD"),
            tenant_db_max_connections: env_parse(
                "TENANT_DB_MAX_CONNECTIONS",
                TENANT_MAX_CONNECTIONS,
            ),
            base_domain: env_non_empty("BASE_DOMAIN").map(|s| s.to_lowercase()),
            tenant_header: env_non_empty("TENANT_HEADER")
                .unwrap_or_else(|| DEFAULT_TENANT_HEADER.to_string()),
            trial_days: env_parse("TRIAL_DAYS", DEFAULT_TRIAL_DAYS),
            min_password_length: env_parse("MIN_PASSWORD_LENGTH", DEFAULT_MIN_PASSWORD_LENGTH),
        };

        let config = ServiceConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            tenancy,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.tenancy.tenant_db_max_connections == 0 {
            return Err(anyhow::anyhow!(
                "TENANT_DB_MAX_CONNECTIONS must be greater than 0"
            ));
        }

        if self.tenancy.trial_days <= 0 {
            return Err(anyhow::anyhow!("TRIAL_DAYS must be greater than 0"));
        }

        if self.tenancy.min_password_length < DEFAULT_MIN_PASSWORD_LENGTH {
            return Err(anyhow::anyhow!(
                "MIN_PASSWORD_LENGTH cannot be lower than {}",
                DEFAULT_MIN_PASSWORD_LENGTH
            ));
        }

        Ok(())
    }
}
