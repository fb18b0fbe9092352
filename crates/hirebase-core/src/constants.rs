//! Constants shared by the control plane crates.

/// Length of the free trial window granted to every new company.
pub const DEFAULT_TRIAL_DAYS: i64 = 30;

/// Minimum accepted password length for the first administrator.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum length of a sanitized subdomain.
pub const MIN_SUBDOMAIN_LENGTH: usize = 3;

/// Maximum length of a DNS label.
pub const MAX_SUBDOMAIN_LENGTH: usize = 63;

/// Length of the random suffix appended to colliding subdomains.
pub const SUBDOMAIN_SUFFIX_LENGTH: usize = 4;

/// How many suffixed candidates are tried before giving up on a subdomain.
pub const SUBDOMAIN_SUFFIX_ATTEMPTS: usize = 5;

/// Postgres identifier limit (NAMEDATALEN - 1).
pub const MAX_DATABASE_NAME_LENGTH: usize = 63;

/// Prefix of every tenant database name.
pub const TENANT_DATABASE_PREFIX: &str = "tenant_";

/// Code of the lowest-tier plan created lazily during the first onboarding.
pub const DEFAULT_PLAN_CODE: &str = "starter";

/// Default header carrying an explicit tenant identifier.
pub const DEFAULT_TENANT_HEADER: &str = "X-Tenant-ID";

/// Query parameter carrying an explicit tenant identifier.
pub const TENANT_QUERY_PARAM: &str = "tenant";

/// Host labels that never name a tenant.
pub const RESERVED_SUBDOMAINS: &[&str] = &["www", "api", "app", "admin", "docs"];
