//! Bearer-token admin authentication.
//!
//! A bearer JWT identifies an admin session; that is the extent of the auth
//! model here. Tokens are minted out of band (ops tooling, tests) and
//! validated by the [`AdminUser`] extractor on admin-only routes.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{errors::ServiceError, AppState};

const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Subject: staff account name.
    pub sub: String,
    pub role: String,
    /// Expiry, seconds since epoch.
    pub exp: usize,
}

/// Mints an admin bearer token. Used by ops tooling and the test harness.
pub fn issue_admin_token(
    secret: &str,
    subject: &str,
    ttl_secs: usize,
) -> Result<String, ServiceError> {
    let claims = AdminClaims {
        sub: subject.to_string(),
        role: ADMIN_ROLE.to_string(),
        exp: Utc::now().timestamp() as usize + ttl_secs,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ServiceError::InternalError(format!("Failed to issue token: {}", e)))
}

fn decode_admin_token(secret: &str, token: &str) -> Result<AdminClaims, ServiceError> {
    decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| ServiceError::Unauthorized(format!("Invalid bearer token: {}", e)))
}

/// Extractor guarding admin routes: requires a valid bearer JWT carrying the
/// admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AdminClaims);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                ServiceError::Unauthorized("Missing Authorization header".to_string())
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            ServiceError::Unauthorized("Authorization header must be a bearer token".to_string())
        })?;

        let claims = decode_admin_token(&state.config.jwt_secret, token)?;

        if claims.role != ADMIN_ROLE {
            return Err(ServiceError::Forbidden(
                "Admin role required".to_string(),
            ));
        }

        Ok(AdminUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_that_is_long_enough_for_hs256_use";

    #[test]
    fn issued_tokens_decode_back_to_their_claims() {
        let token = issue_admin_token(SECRET, "somchai", 3600).unwrap();
        let claims = decode_admin_token(SECRET, &token).unwrap();
        assert_eq!(claims.sub, "somchai");
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_admin_token(SECRET, "somchai", 3600).unwrap();
        assert!(decode_admin_token("another_secret_entirely_padpadpadpad", &token).is_err());
    }
}
