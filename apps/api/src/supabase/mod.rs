//! Supabase auth (GoTrue) client.
//!
//! Two uses: resolving a caller's access token to a user, and paging through every
//! user with the service-role admin API. Table data is read through `sqlx` directly.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::models::user::{AuthUserRecord, AuthenticatedUser};

#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Supabase returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid or expired access token")]
    InvalidToken,
}

/// Paged access to the auth provider's user directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// `page` is 1-based.
    async fn list_users(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<AuthUserRecord>, SupabaseError>;

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<AuthUserRecord>, SupabaseError>;
}

#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_role_key: String,
}

#[derive(Debug, Deserialize)]
struct UserListResponse {
    users: Vec<AuthUserRecord>,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: Uuid,
    email: Option<String>,
}

impl SupabaseClient {
    pub fn new(base_url: &str, service_role_key: String) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_role_key,
        })
    }

    /// Resolves an access token to its user. Rejected tokens map to `InvalidToken`.
    pub async fn get_user(&self, access_token: &str) -> Result<AuthenticatedUser, SupabaseError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.service_role_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SupabaseError::InvalidToken),
            status if !status.is_success() => Err(SupabaseError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
            _ => {
                let user: TokenUser = response.json().await?;
                Ok(AuthenticatedUser {
                    id: user.id,
                    email: user.email,
                })
            }
        }
    }

    fn admin_get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}/auth/v1/admin/{path}", self.base_url))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }
}

#[async_trait]
impl UserDirectory for SupabaseClient {
    async fn list_users(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<AuthUserRecord>, SupabaseError> {
        let response = self
            .admin_get("users")
            .query(&[("page", page), ("per_page", per_page)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Supabase admin list_users returned {status}: {message}");
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: UserListResponse = response.json().await?;
        Ok(body.users)
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<AuthUserRecord>, SupabaseError> {
        let response = self.admin_get(&format!("users/{id}")).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(Some(response.json().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = SupabaseClient::new("https://x.supabase.co/", "key".to_string()).unwrap();
        assert_eq!(client.base_url, "https://x.supabase.co");
    }

    #[test]
    fn test_user_list_parses_admin_payload() {
        let body = r#"{
            "users": [{
                "id": "6f1c2a1e-8a4b-4c55-9d0e-2b1f3c4d5e6f",
                "email": "a@example.com",
                "created_at": "2024-01-02T03:04:05Z",
                "last_sign_in_at": null,
                "role": "authenticated"
            }],
            "aud": "authenticated"
        }"#;
        let parsed: UserListResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.users.len(), 1);
        assert_eq!(parsed.users[0].email.as_deref(), Some("a@example.com"));
    }
}
