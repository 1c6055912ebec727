use std::convert::Infallible;

use axum::{
    extract::{FromRef, OptionalFromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    repository::RepositoryState,
};

/// Claims
///
/// Payload of the session JWT issued by the sign-in flow. Only `userId` and `role`
/// are consumed here; `exp` is enforced by the decoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

/// Role
///
/// Caller privilege level. `Admin` is the elevated role that may list its own
/// private comics without naming itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Maps a role claim or column value. Only the exact string `ADMIN` is elevated.
    pub fn from_claim(raw: &str) -> Self {
        match raw {
            "ADMIN" => Role::Admin,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

/// Identity
///
/// The resolved caller of a request. Handlers take `Option<Identity>`: `None` means
/// the request carried no valid session.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn is_elevated(&self) -> bool {
        self.role == Role::Admin
    }
}

/// verify_request
///
/// Pure session check: finds the token (Bearer header first, then the session
/// cookie) and validates signature and expiry. Any failure yields `None`.
pub fn verify_request(headers: &HeaderMap, config: &AppConfig) -> Option<Identity> {
    let token = bearer_token(headers).or_else(|| cookie_token(headers, &config.auth_cookie_name))?;

    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => Some(Identity {
            id: data.claims.user_id,
            role: Role::from_claim(&data.claims.role),
        }),
        Err(e) => {
            tracing::debug!(error = %e, "rejected session token");
            None
        }
    }
}

/// issue_token
///
/// Signs an HS256 session token for `user_id` valid for `ttl_secs`. The service
/// itself only verifies tokens; this is the counterpart used by tooling and tests.
pub fn issue_token(
    user_id: Uuid,
    role: Role,
    ttl_secs: i64,
    config: &AppConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        user_id,
        role: role.as_str().to_string(),
        exp: (now + ttl_secs).max(0) as usize,
        iat: now as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn cookie_token<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, token)| token)
        .filter(|token| !token.is_empty())
}

/// Identity Extractor Implementation
///
/// Lets handlers take `Option<Identity>`. Resolution order:
/// 1. Local bypass: in `Env::Local`, an `x-user-id` header naming an existing user
///    resolves to that user, with the role read from the database.
/// 2. Session token via `verify_request`.
///
/// Never rejects; an unauthenticated request simply yields `None`.
impl<S> OptionalFromRequestParts<S> for Identity
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        if config.identity_bypass_enabled() {
            if let Some(identity) = local_bypass(parts, &RepositoryState::from_ref(state)).await {
                return Ok(Some(identity));
            }
        }

        Ok(verify_request(&parts.headers, &config))
    }
}

async fn local_bypass(parts: &Parts, repo: &RepositoryState) -> Option<Identity> {
    let user_id = parts
        .headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| Uuid::parse_str(raw).ok())?;

    match repo.get_user(user_id).await {
        Ok(Some(user)) => Some(Identity {
            id: user.id,
            role: Role::from_claim(&user.role),
        }),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, %user_id, "local identity lookup failed");
            None
        }
    }
}
