/// Session tokens and API error bodies.
///
/// The ledger core performs no authentication itself. Every `/api/proof`
/// route requires a bearer JWT (HS256) whose `sub` names the principal.
/// Registration and login belong to the intake side; `issue_token` is
/// kept for operators and tests.
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Default session lifetime.
pub const DEFAULT_TOKEN_TTL_HOURS: u64 = 8;

/// JWT claims for session tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Expiration time (Unix timestamp).
    pub exp: usize,
    /// Issued at (Unix timestamp).
    pub iat: usize,
}

/// Error detail: stable machine-readable kind plus a message.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a ledger error onto an HTTP status and structured body.
pub fn api_error(err: LedgerError) -> ApiError {
    let status = match &err {
        LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
        LedgerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        LedgerError::Io(_)
        | LedgerError::CorruptLedger(_)
        | LedgerError::Serialization(_)
        | LedgerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(kind = err.kind(), error = %err, "Request failed");
    }

    (
        status,
        Json(ErrorResponse {
            error: ErrorBody {
                kind: err.kind().to_string(),
                message: err.to_string(),
            },
        }),
    )
}

/// Issue a JWT token for a user.
pub fn issue_token(
    user_id: &str,
    email: Option<&str>,
    secret: &str,
    ttl_hours: u64,
) -> Result<String, LedgerError> {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.map(str::to_string),
        exp: now + (ttl_hours as usize) * 3600,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| LedgerError::Internal(format!("JWT encoding failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    #[test]
    fn test_issue_token_roundtrip() {
        let token = issue_token("u00001", Some("a@b.c"), "secret", 1).unwrap();
        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, "u00001");
        assert_eq!(data.claims.email.as_deref(), Some("a@b.c"));
        assert_eq!(data.claims.exp - data.claims.iat, 3600);
    }

    #[test]
    fn test_api_error_status_mapping() {
        let cases = [
            (LedgerError::NotFound("d".into()), StatusCode::NOT_FOUND, "not_found"),
            (LedgerError::Validation("v".into()), StatusCode::BAD_REQUEST, "validation"),
            (
                LedgerError::CorruptLedger("c".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "corrupt_ledger",
            ),
            (
                LedgerError::Io(std::io::Error::other("disk")),
                StatusCode::INTERNAL_SERVER_ERROR,
                "io",
            ),
        ];
        for (err, status, kind) in cases {
            let (got, Json(body)) = api_error(err);
            assert_eq!(got, status);
            assert_eq!(body.error.kind, kind);
        }
    }
}
