//! Axum route handlers for the Subscription API.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::{ensure_admin, AuthUser};
use crate::billing::repo::{
    get_subscription, set_status, set_stripe_customer, update_user_subscription_plan,
};
use crate::billing::stripe::StripeError;
use crate::errors::{ActionResult, AppError};
use crate::models::subscription::{Plan, SubscriptionRow, SubscriptionStatus};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SubscriptionStatusResponse {
    /// What gating uses: free once a canceled period has lapsed.
    pub plan: Plan,
    pub stored_plan: Plan,
    pub status: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub trial_end: Option<DateTime<Utc>>,
    pub has_billing_account: bool,
}

impl SubscriptionStatusResponse {
    pub fn from_row(row: Option<&SubscriptionRow>, now: DateTime<Utc>) -> Self {
        match row {
            Some(row) => Self {
                plan: if row.is_pro_at(now) { Plan::Pro } else { Plan::Free },
                stored_plan: row.plan(),
                status: row.subscription_status.clone(),
                current_period_end: row.current_period_end,
                trial_end: row.trial_end,
                has_billing_account: row.stripe_customer_id.is_some(),
            },
            None => Self {
                plan: Plan::Free,
                stored_plan: Plan::Free,
                status: None,
                current_period_end: None,
                trial_end: None,
                has_billing_account: false,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlanRequest {
    pub plan: Plan,
    /// Another user's id. Admin only.
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct RedirectResponse {
    pub url: String,
}

fn stripe_err(e: StripeError) -> AppError {
    AppError::Stripe(e.to_string())
}

async fn require_subscription_id(state: &AppState, user_id: Uuid) -> Result<String, AppError> {
    get_subscription(&state.db, user_id)
        .await?
        .and_then(|row| row.stripe_subscription_id)
        .ok_or_else(|| AppError::Validation("No active Stripe subscription".to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/subscription
pub async fn handle_get_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SubscriptionStatusResponse>, AppError> {
    let row = get_subscription(&state.db, user.id).await?;
    Ok(Json(SubscriptionStatusResponse::from_row(
        row.as_ref(),
        Utc::now(),
    )))
}

/// PUT /api/v1/subscription/plan
///
/// Users may drop themselves to free. Granting pro, or touching another user, needs admin.
pub async fn handle_update_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<UpdatePlanRequest>,
) -> Result<Json<SubscriptionRow>, AppError> {
    let target = request.user_id.unwrap_or(user.id);
    if target != user.id || request.plan == Plan::Pro {
        ensure_admin(&state.db, user.id).await?;
    }
    let row = update_user_subscription_plan(&state.db, target, request.plan).await?;
    info!(
        "User {} set plan of {target} to {}",
        user.id,
        request.plan.as_str()
    );
    Ok(Json(row))
}

/// POST /api/v1/subscription/checkout
///
/// Creates the Stripe customer on first use, then a checkout session for the pro price.
pub async fn handle_create_checkout(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<RedirectResponse>, AppError> {
    let existing = get_subscription(&state.db, user.id)
        .await?
        .and_then(|row| row.stripe_customer_id);

    let customer_id = match existing {
        Some(id) => id,
        None => {
            let customer = state
                .stripe
                .create_customer(user.email.as_deref(), user.id)
                .await
                .map_err(stripe_err)?;
            set_stripe_customer(&state.db, user.id, &customer.id).await?;
            info!("Created Stripe customer {} for user {}", customer.id, user.id);
            customer.id
        }
    };

    let app_url = state.config.app_url.trim_end_matches('/');
    let session = state
        .stripe
        .create_checkout_session(
            &customer_id,
            &state.config.stripe_pro_price_id,
            user.id,
            &format!("{app_url}/subscription?checkout=success"),
            &format!("{app_url}/subscription?checkout=canceled"),
        )
        .await
        .map_err(stripe_err)?;
    info!("Created checkout session {} for user {}", session.id, user.id);

    let url = session
        .url
        .ok_or_else(|| AppError::Stripe("Checkout session has no URL".to_string()))?;
    Ok(Json(RedirectResponse { url }))
}

/// POST /api/v1/subscription/portal
pub async fn handle_create_portal(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<RedirectResponse>, AppError> {
    let customer_id = get_subscription(&state.db, user.id)
        .await?
        .and_then(|row| row.stripe_customer_id)
        .ok_or_else(|| AppError::Validation("No billing account yet".to_string()))?;

    let return_url = format!("{}/subscription", state.config.app_url.trim_end_matches('/'));
    let session = state
        .stripe
        .create_portal_session(&customer_id, &return_url)
        .await
        .map_err(stripe_err)?;
    Ok(Json(RedirectResponse { url: session.url }))
}

/// POST /api/v1/subscription/cancel
///
/// Cancels at period end. The user keeps pro until `current_period_end`.
pub async fn handle_cancel_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ActionResult>, AppError> {
    let subscription_id = require_subscription_id(&state, user.id).await?;
    state
        .stripe
        .set_cancel_at_period_end(&subscription_id, true)
        .await
        .map_err(stripe_err)?;
    set_status(&state.db, user.id, SubscriptionStatus::Canceled).await?;
    info!("User {} canceled subscription {subscription_id}", user.id);
    Ok(Json(ActionResult::ok(
        "Subscription will end at the close of the billing period",
    )))
}

/// POST /api/v1/subscription/resume
pub async fn handle_resume_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ActionResult>, AppError> {
    let subscription_id = require_subscription_id(&state, user.id).await?;
    state
        .stripe
        .set_cancel_at_period_end(&subscription_id, false)
        .await
        .map_err(stripe_err)?;
    set_status(&state.db, user.id, SubscriptionStatus::Active).await?;
    info!("User {} resumed subscription {subscription_id}", user.id);
    Ok(Json(ActionResult::ok("Subscription resumed")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn row(plan: &str, status: Option<&str>, period_end: Option<DateTime<Utc>>) -> SubscriptionRow {
        SubscriptionRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            subscription_plan: plan.to_string(),
            subscription_status: status.map(str::to_string),
            current_period_end: period_end,
            trial_end: None,
            stripe_customer_id: Some("cus_123".to_string()),
            stripe_subscription_id: Some("sub_123".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_no_row_is_free() {
        let status = SubscriptionStatusResponse::from_row(None, Utc::now());
        assert_eq!(status.plan, Plan::Free);
        assert!(!status.has_billing_account);
    }

    #[test]
    fn test_lapsed_cancellation_reports_free_but_keeps_stored_plan() {
        let now = Utc::now();
        let lapsed = row("pro", Some("canceled"), Some(now - Duration::days(1)));
        let status = SubscriptionStatusResponse::from_row(Some(&lapsed), now);
        assert_eq!(status.plan, Plan::Free);
        assert_eq!(status.stored_plan, Plan::Pro);

        let running = row("pro", Some("canceled"), Some(now + Duration::days(3)));
        let status = SubscriptionStatusResponse::from_row(Some(&running), now);
        assert_eq!(status.plan, Plan::Pro);
        assert!(status.has_billing_account);
    }
}
