//! API constants

/// Current API version
pub const API_VERSION: &str = "v1";

/// Versioned prefix for every business route
pub const API_PREFIX: &str = "/api/v1";

/// Path of the generated OpenAPI document
pub const OPENAPI_PATH: &str = "/api/openapi.json";

/// Token type returned with every access token
pub const TOKEN_TYPE: &str = "Bearer";

/// Timeout applied to readiness dependency checks
pub const READINESS_TIMEOUT_SECS: u64 = 5;

/// Largest accepted request body; every endpoint takes small JSON documents
pub const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Server-wide cap on requests in flight
pub const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
