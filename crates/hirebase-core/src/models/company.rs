use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Company status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "company_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum CompanyStatus {
    Active,
    Suspended,
    Inactive,
    Trial,
}

impl CompanyStatus {
    /// Only active companies are routable.
    pub fn is_active(&self) -> bool {
        matches!(self, CompanyStatus::Active)
    }
}

/// Company (tenant) entity stored in the registry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub custom_domain: Option<String>,
    pub subdomain: Option<String>,
    pub status: CompanyStatus,
    pub contact_email: String,
    pub created_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
    pub trial_ends_at: Option<DateTime<Utc>>,
}

/// Insert payload for a company row
#[derive(Debug, Clone)]
pub struct NewCompany {
    pub id: Uuid,
    pub name: String,
    pub subdomain: String,
    pub contact_email: String,
    pub status: CompanyStatus,
    pub activated_at: Option<DateTime<Utc>>,
    pub trial_ends_at: Option<DateTime<Utc>>,
}
