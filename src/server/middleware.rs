/// Authentication extractor for JWT-based request validation.
///
/// Extracts and validates JWT tokens from the Authorization header.
/// After validation, the authenticated principal is made available
/// to route handlers via Axum's extractor pattern.
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, DecodingKey, Validation};

use super::auth::{api_error, ApiError, Claims};
use super::AppState;
use crate::error::LedgerError;

/// Authenticated principal extracted from JWT.
///
/// Use this as an extractor in route handlers to require authentication:
/// ```ignore
/// async fn handler(user: AuthUser) -> impl IntoResponse { ... }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
}

fn unauthorized(message: impl Into<String>) -> ApiError {
    api_error(LedgerError::Unauthorized(message.into()))
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Invalid Authorization format"))?;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| unauthorized(format!("Invalid token: {e}")))?;

        if token_data.claims.sub.trim().is_empty() {
            return Err(unauthorized("Invalid user ID in token"));
        }

        Ok(AuthUser {
            user_id: token_data.claims.sub,
            email: token_data.claims.email,
        })
    }
}
