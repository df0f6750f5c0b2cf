//! Per-user fixed-window rate limiter for AI actions, backed by Redis.
//!
//! Key: `ratelimit:ai:{user_id}:{window_start}`. `INCR` then `EXPIRE` on first hit,
//! so stale windows clean themselves up.

use redis::AsyncCommands;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::subscription::Plan;

pub const WINDOW_SECS: u64 = 3600;
/// Pro subscribers get this multiple of the base limit.
pub const PRO_MULTIPLIER: u32 = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub key: String,
    pub retry_after_secs: u64,
}

pub fn window_for(user_id: Uuid, now_unix: u64) -> Window {
    let start = now_unix - now_unix % WINDOW_SECS;
    Window {
        key: format!("ratelimit:ai:{user_id}:{start}"),
        retry_after_secs: start + WINDOW_SECS - now_unix,
    }
}

pub fn limit_for(plan: Plan, base_limit: u32) -> u32 {
    match plan {
        Plan::Free => base_limit,
        Plan::Pro => base_limit.saturating_mul(PRO_MULTIPLIER),
    }
}

/// Counts one call and fails with `RateLimited` once the window's limit is exceeded.
/// Redis outages fail open so AI features stay usable.
pub async fn check_rate_limit(
    redis: &redis::Client,
    user_id: Uuid,
    plan: Plan,
    base_limit: u32,
) -> Result<(), AppError> {
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    let window = window_for(user_id, now);
    let limit = limit_for(plan, base_limit);

    let count = match increment(redis, &window.key).await {
        Ok(count) => count,
        Err(e) => {
            warn!("Rate limiter unavailable, allowing request: {e}");
            return Ok(());
        }
    };

    if count > u64::from(limit) {
        return Err(AppError::RateLimited {
            retry_after_secs: window.retry_after_secs,
        });
    }
    Ok(())
}

async fn increment(redis: &redis::Client, key: &str) -> redis::RedisResult<u64> {
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let count: u64 = conn.incr(key, 1).await?;
    if count == 1 {
        let _: () = conn.expire(key, WINDOW_SECS as i64).await?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_aligned_to_the_hour() {
        let user = Uuid::nil();
        let window = window_for(user, 7_205);
        assert_eq!(window.key, format!("ratelimit:ai:{user}:7200"));
        assert_eq!(window.retry_after_secs, 3_595);
    }

    #[test]
    fn test_same_hour_shares_window() {
        let user = Uuid::new_v4();
        assert_eq!(window_for(user, 3_600).key, window_for(user, 7_199).key);
        assert_ne!(window_for(user, 7_199).key, window_for(user, 7_200).key);
    }

    #[test]
    fn test_pro_limit_multiplier() {
        assert_eq!(limit_for(Plan::Free, 50), 50);
        assert_eq!(limit_for(Plan::Pro, 50), 200);
        assert_eq!(limit_for(Plan::Pro, u32::MAX), u32::MAX);
    }

    #[tokio::test]
    async fn test_unreachable_redis_fails_open() {
        let client = redis::Client::open("redis://127.0.0.1:9/").unwrap();
        assert!(check_rate_limit(&client, Uuid::new_v4(), Plan::Free, 1)
            .await
            .is_ok());
    }
}
