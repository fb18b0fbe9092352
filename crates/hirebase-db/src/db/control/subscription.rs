use hirebase_core::models::{NewPlan, NewSubscription, Plan, Subscription};
use hirebase_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::errors::registry_error;

#[derive(Clone)]
pub struct PlanRepository {
    pool: PgPool,
}

impl PlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lowest-tier plan, preferring one flagged as default
    pub async fn get_default(&self) -> Result<Option<Plan>, AppError> {
        sqlx::query_as::<_, Plan>(
            r#"
            SELECT id, code, name, tier, max_users, is_default, created_at
            FROM plans
            ORDER BY is_default DESC, tier ASC, created_at ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| registry_error("fetch default plan", e))
    }

    /// Insert a plan, returning the existing row when the code is already taken.
    pub async fn create(&self, plan: &NewPlan) -> Result<Plan, AppError> {
        let created = sqlx::query_as::<_, Plan>(
            r#"
            INSERT INTO plans (code, name, tier, max_users, is_default)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (code) DO UPDATE SET code = EXCLUDED.code
            RETURNING id, code, name, tier, max_users, is_default, created_at
            "#,
        )
        .bind(&plan.code)
        .bind(&plan.name)
        .bind(plan.tier)
        .bind(plan.max_users)
        .bind(plan.is_default)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| registry_error("create plan", e))?;

        tracing::info!(plan_id = %created.id, code = %created.code, "Ensured plan exists");
        Ok(created)
    }
}

#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, subscription: &NewSubscription) -> Result<Subscription, AppError> {
        sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (company_id, plan_id, status, trial_ends_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, company_id, plan_id, status, started_at, trial_ends_at, created_at
            "#,
        )
        .bind(subscription.company_id)
        .bind(subscription.plan_id)
        .bind(subscription.status)
        .bind(subscription.trial_ends_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| registry_error("create subscription", e))
    }

    /// Most recent subscription of a company
    pub async fn get_by_company(&self, company_id: Uuid) -> Result<Option<Subscription>, AppError> {
        sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, company_id, plan_id, status, started_at, trial_ends_at, created_at
            FROM subscriptions
            WHERE company_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| registry_error("fetch subscription", e))
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| registry_error("delete subscription", e))?;

        Ok(result.rows_affected() > 0)
    }
}
