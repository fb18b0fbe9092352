use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of a tenant's physical database
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "tenant_database_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum TenantDatabaseStatus {
    Provisioning,
    Active,
    Suspended,
    Deleted,
}

/// Mapping from a company to the database holding its data.
///
/// The password is never part of this record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TenantDatabase {
    pub id: Uuid,
    pub company_id: Uuid,
    pub database_name: String,
    pub host: String,
    pub port: i32,
    pub db_user: Option<String>,
    pub status: TenantDatabaseStatus,
    pub provisioned_at: DateTime<Utc>,
}

impl TenantDatabase {
    pub fn is_active(&self) -> bool {
        self.status == TenantDatabaseStatus::Active
    }
}

#[derive(Debug, Clone)]
pub struct NewTenantDatabase {
    pub company_id: Uuid,
    pub database_name: String,
    pub host: String,
    pub port: i32,
    pub db_user: Option<String>,
    pub status: TenantDatabaseStatus,
}
