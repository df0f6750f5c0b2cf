//! Subscription persistence. One row per user; every write is an upsert on `user_id`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::subscription::{Plan, SubscriptionRow, SubscriptionStatus};

/// Stripe-derived state written by the webhook.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionUpdate {
    pub user_id: Uuid,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<DateTime<Utc>>,
    pub trial_end: Option<DateTime<Utc>>,
    pub stripe_customer_id: String,
    pub stripe_subscription_id: String,
}

pub async fn get_subscription(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<SubscriptionRow>, sqlx::Error> {
    sqlx::query_as::<_, SubscriptionRow>("SELECT * FROM subscriptions WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Effective plan for gating: free when there is no row or the paid period lapsed.
pub async fn effective_plan(pool: &PgPool, user_id: Uuid) -> Result<Plan, sqlx::Error> {
    Ok(match get_subscription(pool, user_id).await? {
        Some(row) if row.is_pro_at(Utc::now()) => Plan::Pro,
        _ => Plan::Free,
    })
}

/// Sets the plan, inserting the row if the user has none. Never creates a second row.
pub async fn update_user_subscription_plan(
    pool: &PgPool,
    user_id: Uuid,
    plan: Plan,
) -> Result<SubscriptionRow, sqlx::Error> {
    sqlx::query_as::<_, SubscriptionRow>(
        r#"
        INSERT INTO subscriptions (user_id, subscription_plan, subscription_status)
        VALUES ($1, $2, 'active')
        -- subscriptions.user_id is UNIQUE; this conflict target is what keeps one row per user
        ON CONFLICT (user_id) DO UPDATE
            SET subscription_plan = EXCLUDED.subscription_plan,
                updated_at = now()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(plan.as_str())
    .fetch_one(pool)
    .await
}

pub async fn upsert_from_stripe(
    pool: &PgPool,
    update: &SubscriptionUpdate,
) -> Result<SubscriptionRow, sqlx::Error> {
    sqlx::query_as::<_, SubscriptionRow>(
        r#"
        INSERT INTO subscriptions
            (user_id, subscription_plan, subscription_status, current_period_end,
             trial_end, stripe_customer_id, stripe_subscription_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (user_id) DO UPDATE
            SET subscription_plan = EXCLUDED.subscription_plan,
                subscription_status = EXCLUDED.subscription_status,
                current_period_end = EXCLUDED.current_period_end,
                trial_end = EXCLUDED.trial_end,
                stripe_customer_id = EXCLUDED.stripe_customer_id,
                stripe_subscription_id = EXCLUDED.stripe_subscription_id,
                updated_at = now()
        RETURNING *
        "#,
    )
    .bind(update.user_id)
    .bind(update.plan.as_str())
    .bind(update.status.as_str())
    .bind(update.current_period_end)
    .bind(update.trial_end)
    .bind(&update.stripe_customer_id)
    .bind(&update.stripe_subscription_id)
    .fetch_one(pool)
    .await
}

/// Records the Stripe customer for a user, creating a free row if needed.
pub async fn set_stripe_customer(
    pool: &PgPool,
    user_id: Uuid,
    customer_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO subscriptions (user_id, subscription_plan, stripe_customer_id)
        VALUES ($1, 'free', $2)
        ON CONFLICT (user_id) DO UPDATE
            SET stripe_customer_id = EXCLUDED.stripe_customer_id,
                updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(customer_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_user_by_customer(
    pool: &PgPool,
    customer_id: &str,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT user_id FROM subscriptions WHERE stripe_customer_id = $1")
        .bind(customer_id)
        .fetch_optional(pool)
        .await
}

pub async fn set_status(
    pool: &PgPool,
    user_id: Uuid,
    status: SubscriptionStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE subscriptions SET subscription_status = $2, updated_at = now() WHERE user_id = $1",
    )
    .bind(user_id)
    .bind(status.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[test]
    fn test_schema_keeps_one_subscription_per_user() {
        let schema = include_str!("../../migrations/0001_initial.sql");
        let table = schema
            .split("CREATE TABLE IF NOT EXISTS subscriptions")
            .nth(1)
            .and_then(|rest| rest.split(");").next())
            .unwrap();
        assert!(table
            .lines()
            .any(|line| line.split_whitespace().collect::<Vec<_>>()
                == ["user_id", "UUID", "NOT", "NULL", "UNIQUE,"]));
    }

    /// Runs against a real database with the schema from `migrations/` applied.
    #[tokio::test]
    #[ignore = "requires DATABASE_URL with the schema applied"]
    async fn test_plan_update_upserts_single_row() {
        let url = std::env::var("DATABASE_URL").unwrap();
        let pool = PgPoolOptions::new().connect(&url).await.unwrap();
        let user_id = Uuid::new_v4();

        for plan in [Plan::Free, Plan::Pro, Plan::Pro, Plan::Free] {
            let row = update_user_subscription_plan(&pool, user_id, plan)
                .await
                .unwrap();
            assert_eq!(row.plan(), plan);
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        sqlx::query("DELETE FROM subscriptions WHERE user_id = $1")
            .bind(user_id)
            .execute(&pool)
            .await
            .unwrap();
    }
}
