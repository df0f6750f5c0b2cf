//! Axum route handlers for the Admin API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::admin::stats::{get_dashboard_stats, get_subscription_stats, DashboardStats, SubscriptionStats};
use crate::admin::users::{
    fetch_resume_counts, get_users_with_details, merge_user_details, ProfileName, UserPage,
    UserSummary,
};
use crate::auth::AdminUser;
use crate::billing::repo::get_subscription;
use crate::errors::AppError;
use crate::jobs::repo::count_jobs;
use crate::models::resume::ResumeKind;
use crate::models::subscription::SubscriptionRow;
use crate::profiles::repo::get_profile;
use crate::resumes::repo::count_resumes;
use crate::state::AppState;
use crate::supabase::SupabaseError;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserDetailResponse {
    pub user: UserSummary,
    pub subscription: Option<SubscriptionRow>,
    pub base_resumes: i64,
    pub tailored_resumes: i64,
    pub jobs: i64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub dashboard: DashboardStats,
    pub subscriptions: SubscriptionStats,
}

fn directory_err(e: SupabaseError) -> AppError {
    AppError::Internal(anyhow::anyhow!("User directory request failed: {e}"))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/admin/users?page=&per_page=&search=
pub async fn handle_list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Query(query): Query<UsersQuery>,
) -> Result<Json<UserPage>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    let result = get_users_with_details(
        &state.db,
        state.user_directory.as_ref(),
        page,
        per_page,
        query.search.as_deref(),
    )
    .await
    .map_err(directory_err)?;

    info!(
        "Admin {} listed users page {page} ({} of {})",
        admin.id,
        result.users.len(),
        result.total
    );
    Ok(Json(result))
}

/// GET /api/v1/admin/users/:id
pub async fn handle_get_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserDetailResponse>, AppError> {
    let record = state
        .user_directory
        .get_user_by_id(user_id)
        .await
        .map_err(directory_err)?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

    let ids = [user_id];
    let (profile, subscription, base, tailored, jobs, counts) = tokio::join!(
        get_profile(&state.db, user_id),
        get_subscription(&state.db, user_id),
        count_resumes(&state.db, user_id, Some(ResumeKind::Base)),
        count_resumes(&state.db, user_id, Some(ResumeKind::Tailored)),
        count_jobs(&state.db, user_id),
        fetch_resume_counts(&state.db, &ids),
    );

    let profile = degrade(profile, "profile").flatten();
    let subscription = degrade(subscription, "subscription").flatten();

    let profiles = profile
        .map(|p| {
            (
                user_id,
                ProfileName {
                    user_id,
                    first_name: p.first_name,
                    last_name: p.last_name,
                },
            )
        })
        .into_iter()
        .collect();
    let subscriptions = subscription
        .clone()
        .map(|s| (user_id, s))
        .into_iter()
        .collect();
    let counts = degrade(counts, "resume count").unwrap_or_default();

    let user = merge_user_details(
        vec![record],
        profiles,
        subscriptions,
        &counts,
        chrono::Utc::now(),
    )
    .pop()
    .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

    Ok(Json(UserDetailResponse {
        user,
        subscription,
        base_resumes: degrade(base, "base resume count").unwrap_or(0),
        tailored_resumes: degrade(tailored, "tailored resume count").unwrap_or(0),
        jobs: degrade(jobs, "job count").unwrap_or(0),
    }))
}

/// GET /api/v1/admin/stats
pub async fn handle_stats(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Json<StatsResponse> {
    let (dashboard, subscriptions) = tokio::join!(
        get_dashboard_stats(&state.db, state.user_directory.as_ref()),
        get_subscription_stats(&state.db),
    );
    Json(StatsResponse {
        dashboard,
        subscriptions,
    })
}

fn degrade<T>(result: Result<T, sqlx::Error>, what: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            error!("Admin user detail: {what} lookup failed: {e}");
            None
        }
    }
}
