//! Hirebase Core Library
//!
//! This crate provides the domain models, error types, configuration, and validation
//! helpers shared by the tenant registry, the connection router, and the HTTP layer.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, Config, TenancyConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
