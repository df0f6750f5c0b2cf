//! Request authentication.
//!
//! `AuthUser` resolves the bearer token through Supabase. `AdminUser` additionally
//! requires a row in `admins`; every admin route takes it as an extractor.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::supabase::SupabaseError;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let user = state.supabase.get_user(token).await.map_err(|e| match e {
            SupabaseError::InvalidToken => AppError::Unauthorized,
            other => AppError::Internal(anyhow::anyhow!("Token verification failed: {other}")),
        })?;
        Ok(AuthUser {
            id: user.id,
            email: user.email,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        ensure_admin(&state.db, user.id).await?;
        Ok(AdminUser(user))
    }
}

/// Fails with `Forbidden` unless `user_id` has a row in `admins`.
pub async fn ensure_admin(pool: &PgPool, user_id: Uuid) -> Result<(), AppError> {
    let is_admin: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM admins WHERE user_id = $1)")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    if !is_admin {
        warn!("Non-admin user {user_id} attempted to access the admin surface");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
