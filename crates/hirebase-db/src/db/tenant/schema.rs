//! Versioned tenant database schema
//!
//! Every tenant database carries the complete schema below. The applied version is
//! recorded in `schema_version`; applying an already-current database is a no-op.

use hirebase_core::AppError;
use sqlx::PgPool;

/// Version written to `schema_version` once the script has been applied.
pub const TENANT_SCHEMA_VERSION: i32 = 1;

const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

const TENANT_SCHEMA_V1: &str = r#"
CREATE TYPE user_role AS ENUM ('admin', 'recruiter', 'interviewer', 'viewer');

CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    email VARCHAR(255) NOT NULL,
    password_hash TEXT NOT NULL,
    full_name VARCHAR(255) NOT NULL,
    role user_role NOT NULL DEFAULT 'viewer',
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE UNIQUE INDEX users_email_key ON users (LOWER(email));

CREATE TABLE departments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TYPE job_status AS ENUM ('draft', 'open', 'closed');

CREATE TABLE jobs (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    department_id UUID REFERENCES departments(id) ON DELETE SET NULL,
    title VARCHAR(255) NOT NULL,
    description TEXT,
    location VARCHAR(255),
    status job_status NOT NULL DEFAULT 'draft',
    created_by UUID REFERENCES users(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX idx_jobs_status ON jobs (status);

CREATE TABLE candidates (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    full_name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL,
    phone VARCHAR(50),
    resume_url TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE UNIQUE INDEX candidates_email_key ON candidates (LOWER(email));

CREATE TYPE application_stage AS ENUM ('applied', 'screening', 'interview', 'offer', 'hired', 'rejected');

CREATE TABLE applications (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    job_id UUID NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
    candidate_id UUID NOT NULL REFERENCES candidates(id) ON DELETE CASCADE,
    stage application_stage NOT NULL DEFAULT 'applied',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (job_id, candidate_id)
);

CREATE TABLE interviews (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    application_id UUID NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    interviewer_id UUID REFERENCES users(id) ON DELETE SET NULL,
    scheduled_at TIMESTAMPTZ NOT NULL,
    feedback TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

/// Apply the tenant schema inside one transaction and return the resulting version.
pub async fn apply_tenant_schema(pool: &PgPool) -> Result<i32, AppError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| schema_error("begin tenant schema transaction", e))?;

    sqlx::Executor::execute(&mut *tx, sqlx::raw_sql(SCHEMA_VERSION_TABLE))
        .await
        .map_err(|e| schema_error("create schema_version table", e))?;

    let current: Option<i32> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| schema_error("read schema version", e))?;

    if let Some(version) = current.filter(|v| *v >= TENANT_SCHEMA_VERSION) {
        tx.rollback()
            .await
            .map_err(|e| schema_error("roll back tenant schema transaction", e))?;
        tracing::debug!(version, "Tenant schema already current");
        return Ok(version);
    }

    sqlx::Executor::execute(&mut *tx, sqlx::raw_sql(TENANT_SCHEMA_V1))
        .await
        .map_err(|e| schema_error("apply tenant schema", e))?;

    sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
        .bind(TENANT_SCHEMA_VERSION)
        .execute(&mut *tx)
        .await
        .map_err(|e| schema_error("record schema version", e))?;

    tx.commit()
        .await
        .map_err(|e| schema_error("commit tenant schema", e))?;
    tracing::info!(version = TENANT_SCHEMA_VERSION, "Tenant schema applied");
    Ok(TENANT_SCHEMA_VERSION)
}

fn schema_error(action: &str, e: sqlx::Error) -> AppError {
    tracing::error!(error = %e, "Failed to {}", action);
    AppError::Database(e)
}
