//! POST /api/webhooks/stripe
//!
//! Verifies the signature, dispatches on an allow-list of event types, re-fetches the
//! subscription from Stripe, and upserts the user's row. Once the signature checks out,
//! downstream failures are logged and the endpoint still answers 200 so Stripe does not
//! retry.

use axum::{body::Bytes, extract::State, http::HeaderMap, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::billing::repo::{find_user_by_customer, upsert_from_stripe, SubscriptionUpdate};
use crate::billing::signature::{verify_signature, DEFAULT_TOLERANCE_SECS};
use crate::billing::stripe::{subscription_id_of, StripeSubscription};
use crate::errors::AppError;
use crate::models::subscription::{Plan, SubscriptionStatus};
use crate::state::AppState;

pub const HANDLED_EVENTS: &[&str] = &[
    "checkout.session.completed",
    "customer.subscription.created",
    "customer.subscription.updated",
    "customer.subscription.deleted",
    "invoice.payment_succeeded",
    "invoice.payment_failed",
];

#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: Value,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<WebhookAck>) {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok());

    if let Err(e) = verify_signature(
        &body,
        signature,
        &state.config.stripe_webhook_secret,
        chrono::Utc::now().timestamp(),
        DEFAULT_TOLERANCE_SECS,
    ) {
        warn!("Rejected Stripe webhook: {e}");
        return reject();
    }

    let event: StripeEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!("Stripe webhook body is not an event: {e}");
            return reject();
        }
    };

    if !HANDLED_EVENTS.contains(&event.event_type.as_str()) {
        info!("Ignoring Stripe event {} ({})", event.id, event.event_type);
        return accept();
    }

    if let Err(e) = process_event(&state, &event).await {
        error!(
            "Failed to process Stripe event {} ({}): {e}",
            event.id, event.event_type
        );
    }

    accept()
}

fn accept() -> (StatusCode, Json<WebhookAck>) {
    (StatusCode::OK, Json(WebhookAck { received: true }))
}

fn reject() -> (StatusCode, Json<WebhookAck>) {
    (StatusCode::BAD_REQUEST, Json(WebhookAck { received: false }))
}

async fn process_event(state: &AppState, event: &StripeEvent) -> Result<(), AppError> {
    let object = &event.data.object;
    let Some(subscription_id) = subscription_id_of(object) else {
        info!("Stripe event {} carries no subscription; nothing to sync", event.id);
        return Ok(());
    };

    let subscription = state
        .stripe
        .retrieve_subscription(&subscription_id)
        .await
        .map_err(|e| AppError::Stripe(e.to_string()))?;

    let user_id = match resolve_user(object, &subscription) {
        Some(id) => Some(id),
        None => find_user_by_customer(&state.db, &subscription.customer).await?,
    };
    let Some(user_id) = user_id else {
        warn!(
            "No user found for Stripe customer {} (event {})",
            subscription.customer, event.id
        );
        return Ok(());
    };

    let deleted = event.event_type == "customer.subscription.deleted";
    let update = subscription_update(user_id, &subscription, deleted);
    upsert_from_stripe(&state.db, &update).await?;

    info!(
        "Synced subscription {} for user {user_id}: plan={}, status={}",
        subscription.id,
        update.plan.as_str(),
        update.status.as_str()
    );
    Ok(())
}

/// User id from subscription metadata, falling back to the checkout session reference.
fn resolve_user(object: &Value, subscription: &StripeSubscription) -> Option<Uuid> {
    subscription.user_id().or_else(|| {
        object
            .get("client_reference_id")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    })
}

/// Maps a Stripe subscription to the stored plan/status pair.
pub fn map_subscription_state(
    subscription: &StripeSubscription,
    deleted: bool,
) -> (Plan, SubscriptionStatus) {
    if deleted {
        return (Plan::Free, SubscriptionStatus::Canceled);
    }
    match subscription.status.as_str() {
        "active" | "trialing" | "past_due" => {
            let status = if subscription.cancel_at_period_end {
                SubscriptionStatus::Canceled
            } else {
                SubscriptionStatus::Active
            };
            (Plan::Pro, status)
        }
        _ => (Plan::Free, SubscriptionStatus::Canceled),
    }
}

pub fn subscription_update(
    user_id: Uuid,
    subscription: &StripeSubscription,
    deleted: bool,
) -> SubscriptionUpdate {
    let (plan, status) = map_subscription_state(subscription, deleted);
    SubscriptionUpdate {
        user_id,
        plan,
        status,
        current_period_end: subscription.period_end(),
        trial_end: subscription.trial_end_at(),
        stripe_customer_id: subscription.customer.clone(),
        stripe_subscription_id: subscription.id.clone(),
    }
}
