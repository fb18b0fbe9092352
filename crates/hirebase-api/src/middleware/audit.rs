//! Security audit logging
//!
//! Structured audit entries for tenancy and authentication events:
//! - Login attempts (success/failure)
//! - Cross-tenant access attempts
//! - Company registration and provisioning rollback
//! - Tenant suspension

use serde::Serialize;
use uuid::Uuid;

/// Audit event types for categorization
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    AuthenticationSuccess,
    AuthenticationFailure,
    /// A credential or session for one tenant was used against another
    CrossTenantAccess,
    CompanyRegistered,
    ProvisioningRolledBack,
    TenantSuspended,
}

/// Structured audit log entry
#[derive(Debug, Serialize)]
pub struct AuditLogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub event_type: AuditEventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_path: Option<String>,
    /// Event details (JSON object)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AuditLogEntry {
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            event_type,
            tenant_id: None,
            user_id: None,
            request_path: None,
            details: None,
            success: true,
            error_message: None,
        }
    }

    pub fn with_tenant_id(mut self, tenant_id: Option<Uuid>) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn with_user_id(mut self, user_id: Option<Uuid>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_request_path(mut self, path: Option<String>) -> Self {
        self.request_path = path;
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failure
    pub fn with_failure(mut self, error_message: impl Into<String>) -> Self {
        self.success = false;
        self.error_message = Some(error_message.into());
        self
    }

    /// Emit the entry on the `audit` target
    pub fn log(&self) {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());

        if self.success {
            tracing::event!(
                target: "audit",
                tracing::Level::INFO,
                audit_entry = %json,
                event_type = ?self.event_type,
                tenant_id = ?self.tenant_id,
                user_id = ?self.user_id,
                success = self.success,
                "Security audit log"
            );
        } else {
            tracing::event!(
                target: "audit",
                tracing::Level::WARN,
                audit_entry = %json,
                event_type = ?self.event_type,
                tenant_id = ?self.tenant_id,
                user_id = ?self.user_id,
                success = self.success,
                error = ?self.error_message,
                "Security audit log - failure"
            );
        }
    }
}

pub fn log_login(
    tenant_id: Uuid,
    user_id: Option<Uuid>,
    email: &str,
    success: bool,
    error_message: Option<&str>,
) {
    let event_type = if success {
        AuditEventType::AuthenticationSuccess
    } else {
        AuditEventType::AuthenticationFailure
    };

    let mut entry = AuditLogEntry::new(event_type)
        .with_tenant_id(Some(tenant_id))
        .with_user_id(user_id)
        .with_details(serde_json::json!({ "email": email }));

    if !success {
        entry = entry.with_failure(error_message.unwrap_or("Authentication failed"));
    }

    entry.log();
}

/// A session bound to `session_tenant` tried to reach `requested_tenant`.
pub fn log_cross_tenant_access(
    session_tenant: Uuid,
    requested_tenant: Option<Uuid>,
    user_id: Option<Uuid>,
    request_path: Option<String>,
    reason: &str,
) {
    AuditLogEntry::new(AuditEventType::CrossTenantAccess)
        .with_tenant_id(Some(session_tenant))
        .with_user_id(user_id)
        .with_request_path(request_path)
        .with_details(serde_json::json!({ "requested_tenant": requested_tenant }))
        .with_failure(reason)
        .log();
}

pub fn log_company_registered(company_id: Uuid, admin_user_id: Uuid, subdomain: &str) {
    AuditLogEntry::new(AuditEventType::CompanyRegistered)
        .with_tenant_id(Some(company_id))
        .with_user_id(Some(admin_user_id))
        .with_details(serde_json::json!({ "subdomain": subdomain }))
        .log();
}

pub fn log_provisioning_rolled_back(company_id: Uuid, step: &str, error_message: &str) {
    AuditLogEntry::new(AuditEventType::ProvisioningRolledBack)
        .with_tenant_id(Some(company_id))
        .with_details(serde_json::json!({ "failed_step": step }))
        .with_failure(error_message)
        .log();
}

pub fn log_tenant_suspended(company_id: Uuid, user_id: Option<Uuid>) {
    AuditLogEntry::new(AuditEventType::TenantSuspended)
        .with_tenant_id(Some(company_id))
        .with_user_id(user_id)
        .log();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_entry_serializes_error() {
        let tenant = Uuid::new_v4();
        let entry = AuditLogEntry::new(AuditEventType::CrossTenantAccess)
            .with_tenant_id(Some(tenant))
            .with_failure("tenant mismatch");

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["event_type"], "cross_tenant_access");
        assert_eq!(json["success"], false);
        assert_eq!(json["error_message"], "tenant mismatch");
        assert!(json.get("user_id").is_none());
    }
}
