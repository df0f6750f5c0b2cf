use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::PgPool;
use tracing::error;

use crate::admin::users::get_total_user_count;
use crate::supabase::UserDirectory;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DashboardStats {
    pub total_users: usize,
    pub total_resumes: i64,
    pub pro_subscribers: i64,
    pub active_subscriptions: i64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SubscriptionStats {
    /// Row count per `subscription_plan`.
    pub by_plan: BTreeMap<String, i64>,
    /// Row count per `subscription_status`; rows without one count as `none`.
    pub by_status: BTreeMap<String, i64>,
    /// Canceled but still inside the paid period.
    pub canceling: i64,
    pub trialing: i64,
}

/// Logs a failed aggregate and substitutes the default.
fn or_default<T: Default, E: std::fmt::Display>(result: Result<T, E>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        error!("Admin stats: {what} failed: {e}");
        T::default()
    })
}

async fn count(pool: &PgPool, sql: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(sql).fetch_one(pool).await
}

async fn grouped(pool: &PgPool, sql: &str) -> Result<BTreeMap<String, i64>, sqlx::Error> {
    let rows: Vec<(String, i64)> = sqlx::query_as(sql).fetch_all(pool).await?;
    Ok(rows.into_iter().collect())
}

/// Each figure is fetched independently; a failing one reads as zero.
pub async fn get_dashboard_stats(pool: &PgPool, directory: &dyn UserDirectory) -> DashboardStats {
    let (users, resumes, pro, active) = tokio::join!(
        get_total_user_count(directory),
        count(pool, "SELECT COUNT(*) FROM resumes"),
        count(
            pool,
            r#"
            SELECT COUNT(*) FROM subscriptions
            WHERE subscription_plan = 'pro'
              AND (subscription_status IS DISTINCT FROM 'canceled' OR current_period_end > now())
            "#,
        ),
        count(
            pool,
            "SELECT COUNT(*) FROM subscriptions WHERE subscription_status = 'active'",
        ),
    );

    DashboardStats {
        total_users: or_default(users, "user count"),
        total_resumes: or_default(resumes, "resume count"),
        pro_subscribers: or_default(pro, "pro subscriber count"),
        active_subscriptions: or_default(active, "active subscription count"),
    }
}

pub async fn get_subscription_stats(pool: &PgPool) -> SubscriptionStats {
    let (by_plan, by_status, canceling, trialing) = tokio::join!(
        grouped(
            pool,
            "SELECT subscription_plan, COUNT(*) FROM subscriptions GROUP BY subscription_plan",
        ),
        grouped(
            pool,
            r#"
            SELECT COALESCE(subscription_status, 'none'), COUNT(*)
            FROM subscriptions GROUP BY 1
            "#,
        ),
        count(
            pool,
            r#"
            SELECT COUNT(*) FROM subscriptions
            WHERE subscription_status = 'canceled' AND current_period_end > now()
            "#,
        ),
        count(
            pool,
            "SELECT COUNT(*) FROM subscriptions WHERE trial_end > now()",
        ),
    );

    SubscriptionStats {
        by_plan: or_default(by_plan, "plan breakdown"),
        by_status: or_default(by_status, "status breakdown"),
        canceling: or_default(canceling, "canceling count"),
        trialing: or_default(trialing, "trialing count"),
    }
}

#[cfg(test)]
mod tests {
    use sqlx::postgres::PgPoolOptions;

    use super::*;
    use crate::admin::users::tests::FakeDirectory;

    #[tokio::test]
    async fn test_unreachable_database_degrades_to_zero() {
        let pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy("postgres://postgres@127.0.0.1:9/resumeforge")
            .unwrap();
        let directory = FakeDirectory::new(Some(42));

        let stats = get_dashboard_stats(&pool, &directory).await;
        assert_eq!(stats.total_users, 42);
        assert_eq!(stats.total_resumes, 0);
        assert_eq!(stats.pro_subscribers, 0);

        let subs = get_subscription_stats(&pool).await;
        assert_eq!(subs, SubscriptionStats::default());
    }
}
