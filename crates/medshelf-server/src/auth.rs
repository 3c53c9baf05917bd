//! Bearer-token verification and the request identity extractor.
//!
//! Identity is derived from the verified token only; request bodies are never
//! trusted to name the acting user.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use medshelf_core::Identity;

use crate::error::ApiError;
use crate::state::AppState;

/// JWT claims carried by a bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: String,
    pub fullname: String,
    pub email: String,
    /// Expiry, seconds since epoch
    pub exp: usize,
}

/// Verified requester identity, extracted from the Authorization header.
///
/// Routes that take this extractor reject unauthenticated requests with 401.
pub struct AuthIdentity(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AuthIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|hv| hv.to_str().ok())
            .and_then(|auth| auth.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Unauthenticated("Missing or invalid token".into()))?;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| ApiError::Unauthenticated("Invalid token".into()))?;

        let claims = token_data.claims;
        Ok(AuthIdentity(Identity {
            user_id: claims.sub,
            fullname: claims.fullname,
            email: claims.email,
        }))
    }
}

/// Mint a token for the given identity, valid for `ttl_secs` seconds.
///
/// The token issuer lives elsewhere; this helper exists for tests and local
/// tooling.
pub fn issue_token(
    secret: &str,
    identity: &Identity,
    ttl_secs: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: identity.user_id.clone(),
        fullname: identity.fullname.clone(),
        email: identity.email.clone(),
        exp: (chrono::Utc::now().timestamp() + ttl_secs) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}
