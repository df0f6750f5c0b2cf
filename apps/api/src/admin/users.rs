//! Admin user listing: pages through the auth directory and joins in profile,
//! subscription, and resume-count data from Postgres.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracing::{error, warn};
use uuid::Uuid;

use crate::models::subscription::{Plan, SubscriptionRow};
use crate::models::user::AuthUserRecord;
use crate::supabase::{SupabaseError, UserDirectory};

pub const USERS_PER_PAGE: u32 = 1000;
/// Hard stop for directory paging: 100 pages of 1000 users.
pub const MAX_PAGES: u32 = 100;

#[derive(Debug, Clone, FromRow)]
pub struct ProfileName {
    pub user_id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ResumeCount {
    pub user_id: Uuid,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub plan: Plan,
    pub subscription_status: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub resume_count: i64,
}

#[derive(Debug, Serialize)]
pub struct UserPage {
    pub users: Vec<UserSummary>,
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
}

/// Walks the directory until a short page or `MAX_PAGES`, handing each page to `visit`.
async fn walk_directory<F>(directory: &dyn UserDirectory, mut visit: F) -> Result<(), SupabaseError>
where
    F: FnMut(Vec<AuthUserRecord>),
{
    for page in 1..=MAX_PAGES {
        let users = directory.list_users(page, USERS_PER_PAGE).await?;
        let short = users.len() < USERS_PER_PAGE as usize;
        visit(users);
        if short {
            return Ok(());
        }
    }
    warn!("User directory paging stopped at the {MAX_PAGES}-page ceiling");
    Ok(())
}

pub async fn get_all_users(
    directory: &dyn UserDirectory,
) -> Result<Vec<AuthUserRecord>, SupabaseError> {
    let mut all = Vec::new();
    walk_directory(directory, |users| all.extend(users)).await?;
    Ok(all)
}

pub async fn get_total_user_count(directory: &dyn UserDirectory) -> Result<usize, SupabaseError> {
    let mut total = 0;
    walk_directory(directory, |users| total += users.len()).await?;
    Ok(total)
}

fn matches_search(user: &AuthUserRecord, needle: &str) -> bool {
    user.email
        .as_deref()
        .map(|email| email.to_lowercase().contains(needle))
        .unwrap_or(false)
}

/// One page of users. With a search term the whole directory is filtered by email,
/// then paged locally.
pub async fn list_user_page(
    directory: &dyn UserDirectory,
    page: u32,
    per_page: u32,
    search: Option<&str>,
) -> Result<(Vec<AuthUserRecord>, usize), SupabaseError> {
    let search = search.map(str::trim).filter(|s| !s.is_empty());
    match search {
        Some(term) => {
            let needle = term.to_lowercase();
            let matched: Vec<AuthUserRecord> = get_all_users(directory)
                .await?
                .into_iter()
                .filter(|u| matches_search(u, &needle))
                .collect();
            let total = matched.len();
            let skip = (page.saturating_sub(1) as usize).saturating_mul(per_page as usize);
            let users = matched.into_iter().skip(skip).take(per_page as usize).collect();
            Ok((users, total))
        }
        None => {
            let (users, total) = tokio::try_join!(
                directory.list_users(page, per_page),
                get_total_user_count(directory)
            )?;
            Ok((users, total))
        }
    }
}

pub async fn fetch_profile_names(
    pool: &PgPool,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, ProfileName>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ProfileName>(
        "SELECT user_id, first_name, last_name FROM profiles WHERE user_id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|r| (r.user_id, r)).collect())
}

pub async fn fetch_subscriptions(
    pool: &PgPool,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, SubscriptionRow>, sqlx::Error> {
    let rows = sqlx::query_as::<_, SubscriptionRow>(
        "SELECT * FROM subscriptions WHERE user_id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|r| (r.user_id, r)).collect())
}

pub async fn fetch_resume_counts(
    pool: &PgPool,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, i64>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ResumeCount>(
        r#"
        SELECT user_id, COUNT(*) AS count
        FROM resumes
        WHERE user_id = ANY($1)
        GROUP BY user_id
        "#,
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|r| (r.user_id, r.count)).collect())
}

/// Logs a failed lookup and substitutes an empty map.
fn or_empty<V>(result: Result<HashMap<Uuid, V>, sqlx::Error>, what: &str) -> HashMap<Uuid, V> {
    result.unwrap_or_else(|e| {
        error!("Admin {what} lookup failed: {e}");
        HashMap::new()
    })
}

pub fn merge_user_details(
    users: Vec<AuthUserRecord>,
    mut profiles: HashMap<Uuid, ProfileName>,
    mut subscriptions: HashMap<Uuid, SubscriptionRow>,
    resume_counts: &HashMap<Uuid, i64>,
    now: DateTime<Utc>,
) -> Vec<UserSummary> {
    users
        .into_iter()
        .map(|user| {
            let profile = profiles.remove(&user.id);
            let subscription = subscriptions.remove(&user.id);
            UserSummary {
                id: user.id,
                email: user.email,
                created_at: user.created_at,
                last_sign_in_at: user.last_sign_in_at,
                first_name: profile.as_ref().and_then(|p| p.first_name.clone()),
                last_name: profile.and_then(|p| p.last_name),
                plan: match &subscription {
                    Some(s) if s.is_pro_at(now) => Plan::Pro,
                    _ => Plan::Free,
                },
                subscription_status: subscription
                    .as_ref()
                    .and_then(|s| s.subscription_status.clone()),
                current_period_end: subscription.and_then(|s| s.current_period_end),
                resume_count: resume_counts.get(&user.id).copied().unwrap_or(0),
            }
        })
        .collect()
}

/// The page of users with profile, plan, and resume count attached. The three
/// database lookups run concurrently; any that fails contributes nothing.
pub async fn get_users_with_details(
    pool: &PgPool,
    directory: &dyn UserDirectory,
    page: u32,
    per_page: u32,
    search: Option<&str>,
) -> Result<UserPage, SupabaseError> {
    let (users, total) = list_user_page(directory, page, per_page, search).await?;
    let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();

    let (profiles, subscriptions, counts) = tokio::join!(
        fetch_profile_names(pool, &ids),
        fetch_subscriptions(pool, &ids),
        fetch_resume_counts(pool, &ids),
    );

    let users = merge_user_details(
        users,
        or_empty(profiles, "profile"),
        or_empty(subscriptions, "subscription"),
        &or_empty(counts, "resume count"),
        Utc::now(),
    );

    Ok(UserPage {
        users,
        total,
        page,
        per_page,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;

    /// Directory of `total` synthetic users, or an endless one when `total` is `None`.
    pub(crate) struct FakeDirectory {
        pub total: Option<usize>,
        pub calls: AtomicU32,
    }

    impl FakeDirectory {
        pub(crate) fn new(total: Option<usize>) -> Self {
            Self {
                total,
                calls: AtomicU32::new(0),
            }
        }
    }

    pub(crate) fn user(n: usize) -> AuthUserRecord {
        AuthUserRecord {
            id: Uuid::from_u128(n as u128 + 1),
            email: Some(format!("user{n}@example.com")),
            created_at: Utc::now(),
            last_sign_in_at: None,
        }
    }

    #[async_trait]
    impl UserDirectory for FakeDirectory {
        async fn list_users(
            &self,
            page: u32,
            per_page: u32,
        ) -> Result<Vec<AuthUserRecord>, SupabaseError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let start = (page as usize - 1) * per_page as usize;
            let end = match self.total {
                Some(total) => total.min(start + per_page as usize),
                None => start + per_page as usize,
            };
            Ok((start..end.max(start)).map(user).collect())
        }

        async fn get_user_by_id(
            &self,
            id: Uuid,
        ) -> Result<Option<AuthUserRecord>, SupabaseError> {
            let n = id.as_u128() as usize;
            if n == 0 || self.total.is_some_and(|total| n > total) {
                return Ok(None);
            }
            Ok(Some(user(n - 1)))
        }
    }

    #[tokio::test]
    async fn test_paging_stops_on_short_page() {
        let directory = FakeDirectory::new(Some(2_500));
        let users = get_all_users(&directory).await.unwrap();
        assert_eq!(users.len(), 2_500);
        assert_eq!(directory.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exact_multiple_needs_one_empty_page() {
        let directory = FakeDirectory::new(Some(2_000));
        assert_eq!(get_total_user_count(&directory).await.unwrap(), 2_000);
        assert_eq!(directory.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_paging_never_exceeds_ceiling() {
        let directory = FakeDirectory::new(None);
        let total = get_total_user_count(&directory).await.unwrap();
        assert_eq!(directory.calls.load(Ordering::SeqCst), MAX_PAGES);
        assert_eq!(total, (MAX_PAGES * USERS_PER_PAGE) as usize);
    }

    #[tokio::test]
    async fn test_search_filters_then_pages() {
        let directory = FakeDirectory::new(Some(30));
        // user1, user10..user19 match "user1"
        let (page_one, total) = list_user_page(&directory, 1, 5, Some(" USER1 "))
            .await
            .unwrap();
        assert_eq!(total, 11);
        assert_eq!(page_one.len(), 5);

        let (page_three, _) = list_user_page(&directory, 3, 5, Some("user1"))
            .await
            .unwrap();
        assert_eq!(page_three.len(), 1);
    }

    #[test]
    fn test_merge_defaults_missing_data() {
        let users = vec![user(0), user(1)];
        let first = users[0].id;
        let mut profiles = HashMap::new();
        profiles.insert(
            first,
            ProfileName {
                user_id: first,
                first_name: Some("Ada".to_string()),
                last_name: None,
            },
        );
        let mut counts = HashMap::new();
        counts.insert(first, 4);

        let merged = merge_user_details(users, profiles, HashMap::new(), &counts, Utc::now());
        assert_eq!(merged[0].first_name.as_deref(), Some("Ada"));
        assert_eq!(merged[0].resume_count, 4);
        assert_eq!(merged[1].resume_count, 0);
        assert_eq!(merged[1].plan, Plan::Free);
        assert!(merged[1].first_name.is_none());
    }
}
