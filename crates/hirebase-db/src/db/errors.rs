//! Classification of sqlx failures into control plane errors.

use hirebase_core::AppError;

/// Whether the error means the server could not be reached at all, as opposed to a
/// query that reached it and failed.
pub fn is_connectivity_error(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::WorkerCrashed
    )
}

/// Map a registry query failure.
///
/// Connectivity problems become `RegistryUnavailable`, unique violations become
/// `Conflict`, everything else stays a `Database` error. `action` is logged and
/// used in the conflict message.
pub fn registry_error(action: &str, e: sqlx::Error) -> AppError {
    if is_connectivity_error(&e) {
        tracing::error!(error = %e, "Tenant registry unavailable while trying to {}", action);
        return AppError::RegistryUnavailable(format!("Failed to {}", action));
    }

    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let message = match db_err.constraint() {
                Some(c) if c.contains("contact_email") => {
                    "A company with this contact email already exists".to_string()
                }
                Some(c) if c.contains("subdomain") => "Subdomain is already taken".to_string(),
                Some(c) if c.contains("database_name") => {
                    "Tenant database name is already registered".to_string()
                }
                Some(c) if c.contains("company_id") => {
                    "Company already has a tenant database".to_string()
                }
                _ => format!("Duplicate value while trying to {}", action),
            };
            tracing::debug!(constraint = ?db_err.constraint(), "Unique violation: {}", message);
            return AppError::Conflict(message);
        }
    }

    tracing::error!(error = %e, "Failed to {}", action);
    AppError::Database(e)
}

/// Map a failure of a query against a tenant database.
pub fn tenant_error(action: &str, e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::Conflict(format!("Duplicate value while trying to {}", action));
        }
    }

    tracing::error!(error = %e, "Tenant database query failed while trying to {}", action);
    AppError::Database(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hirebase_core::ErrorMetadata;

    #[test]
    fn test_connectivity_errors_map_to_registry_unavailable() {
        let err = registry_error("look up company", sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::RegistryUnavailable(_)));
        assert_eq!(err.http_status_code(), 503);

        let err = registry_error("look up company", sqlx::Error::PoolClosed);
        assert!(matches!(err, AppError::RegistryUnavailable(_)));
    }

    #[test]
    fn test_other_errors_stay_database_errors() {
        let err = registry_error("look up company", sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::Database(_)));
    }
}
