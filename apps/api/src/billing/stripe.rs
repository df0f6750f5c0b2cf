//! Minimal Stripe REST client: the handful of v1 endpoints the billing flow needs.
//!
//! Requests are form-encoded, responses JSON. All Stripe calls go through here.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

pub const STRIPE_API_URL: &str = "https://api.stripe.com/v1";

#[derive(Debug, Error)]
pub enum StripeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Stripe API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortalSession {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub customer: String,
    pub status: String,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    /// Present on older API versions; newer ones carry it per item.
    pub current_period_end: Option<i64>,
    pub trial_end: Option<i64>,
    #[serde(default)]
    pub metadata: std::collections::HashMap<String, String>,
    #[serde(default)]
    pub items: SubscriptionItems,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionItems {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItem {
    pub current_period_end: Option<i64>,
    pub price: Option<Price>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Price {
    pub id: String,
}

impl StripeSubscription {
    pub fn period_end(&self) -> Option<DateTime<Utc>> {
        self.current_period_end
            .or_else(|| self.items.data.iter().find_map(|i| i.current_period_end))
            .and_then(unix_to_datetime)
    }

    pub fn trial_end_at(&self) -> Option<DateTime<Utc>> {
        self.trial_end.and_then(unix_to_datetime)
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.metadata.get("user_id").and_then(|v| v.parse().ok())
    }
}

fn unix_to_datetime(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    message: Option<String>,
}

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(secret_key: String) -> reqwest::Result<Self> {
        Self::with_base_url(secret_key, STRIPE_API_URL)
    }

    pub fn with_base_url(secret_key: String, base_url: &str) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key,
        })
    }

    pub async fn create_customer(
        &self,
        email: Option<&str>,
        user_id: Uuid,
    ) -> Result<Customer, StripeError> {
        let user_id = user_id.to_string();
        let mut form = vec![("metadata[user_id]", user_id.as_str())];
        if let Some(email) = email {
            form.push(("email", email));
        }
        self.post("customers", &form).await
    }

    pub async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
        user_id: Uuid,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, StripeError> {
        let user_id = user_id.to_string();
        let form = [
            ("mode", "subscription"),
            ("customer", customer_id),
            ("line_items[0][price]", price_id),
            ("line_items[0][quantity]", "1"),
            ("client_reference_id", user_id.as_str()),
            ("subscription_data[metadata][user_id]", user_id.as_str()),
            ("allow_promotion_codes", "true"),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
        ];
        self.post("checkout/sessions", &form).await
    }

    pub async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, StripeError> {
        let form = [("customer", customer_id), ("return_url", return_url)];
        self.post("billing_portal/sessions", &form).await
    }

    pub async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<StripeSubscription, StripeError> {
        let response = self
            .client
            .get(format!("{}/subscriptions/{subscription_id}", self.base_url))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;
        decode(response).await
    }

    /// Sets or clears `cancel_at_period_end`.
    pub async fn set_cancel_at_period_end(
        &self,
        subscription_id: &str,
        cancel: bool,
    ) -> Result<StripeSubscription, StripeError> {
        let form = [("cancel_at_period_end", if cancel { "true" } else { "false" })];
        self.post(&format!("subscriptions/{subscription_id}"), &form)
            .await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, StripeError> {
        debug!("Stripe POST /{path}");
        let response = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, StripeError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<StripeErrorEnvelope>(&body)
            .ok()
            .and_then(|e| e.error.message)
            .unwrap_or(body);
        warn!("Stripe returned {status}: {message}");
        return Err(StripeError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}

/// Subscription id referenced by a webhook event object, whatever its type.
pub fn subscription_id_of(object: &Value) -> Option<String> {
    if object.get("object").and_then(Value::as_str) == Some("subscription") {
        return object.get("id").and_then(Value::as_str).map(str::to_string);
    }
    object
        .get("subscription")
        .and_then(Value::as_str)
        .or_else(|| {
            object
                .pointer("/parent/subscription_details/subscription")
                .and_then(Value::as_str)
        })
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_period_end_prefers_top_level_then_items() {
        let top: StripeSubscription = serde_json::from_value(json!({
            "id": "sub_1", "customer": "cus_1", "status": "active",
            "current_period_end": 1_700_000_000
        }))
        .unwrap();
        assert_eq!(top.period_end().unwrap().timestamp(), 1_700_000_000);

        let per_item: StripeSubscription = serde_json::from_value(json!({
            "id": "sub_1", "customer": "cus_1", "status": "active",
            "items": {"data": [{"current_period_end": 1_800_000_000, "price": {"id": "price_pro"}}]}
        }))
        .unwrap();
        assert_eq!(per_item.period_end().unwrap().timestamp(), 1_800_000_000);
    }

    #[test]
    fn test_user_id_from_metadata() {
        let id = Uuid::new_v4();
        let sub: StripeSubscription = serde_json::from_value(json!({
            "id": "sub_1", "customer": "cus_1", "status": "active",
            "metadata": {"user_id": id.to_string()}
        }))
        .unwrap();
        assert_eq!(sub.user_id(), Some(id));
    }

    #[test]
    fn test_subscription_id_of_event_objects() {
        assert_eq!(
            subscription_id_of(&json!({"object": "subscription", "id": "sub_a"})).as_deref(),
            Some("sub_a")
        );
        assert_eq!(
            subscription_id_of(&json!({"object": "checkout.session", "subscription": "sub_b"}))
                .as_deref(),
            Some("sub_b")
        );
        assert_eq!(
            subscription_id_of(&json!({
                "object": "invoice",
                "parent": {"subscription_details": {"subscription": "sub_c"}}
            }))
            .as_deref(),
            Some("sub_c")
        );
        assert!(subscription_id_of(&json!({"object": "invoice"})).is_none());
    }
}
