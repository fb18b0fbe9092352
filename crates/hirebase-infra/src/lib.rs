//! Hirebase Infrastructure Library
//!
//! Shared infrastructure components used by the Hirebase services:
//! - Middleware (request ID, security headers)
//! - Tracing initialization

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{request_id_middleware, security_headers_middleware, RequestId};

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry};
