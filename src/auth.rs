//! JWT bearer auth and role gating. Grounded in the teacher's
//! `agentic_server/src/auth.rs` bearer-extraction middleware pattern,
//! reworked from a static API-key store to `jsonwebtoken` claims, and in
//! `src/auth.rs`'s `Claims { sub, exp, role }` shape (the teacher's own
//! actix implementation is not reusable under axum, but its claim fields
//! are).

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::entities::user::Role;
use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// The authenticated principal, attached to request extensions by
/// [`require_auth`] and extractable by any handler.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub role: Role,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))
    }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

fn algorithm_from_name(name: &str) -> Algorithm {
    match name.to_uppercase().as_str() {
        "HS384" => Algorithm::HS384,
        "HS512" => Algorithm::HS512,
        _ => Algorithm::HS256,
    }
}

pub fn issue_token(
    secret: &str,
    algorithm: &str,
    ttl_minutes: i64,
    user_id: i32,
    email: &str,
    role: Role,
) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role: role.as_str().to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
    };

    encode(
        &Header::new(algorithm_from_name(algorithm)),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
}

pub fn decode_token(secret: &str, algorithm: &str, token: &str) -> Result<Claims, AppError> {
    let validation = Validation::new(algorithm_from_name(algorithm));
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized("invalid or expired token".to_string()))
}

fn extract_bearer(request: &Request) -> Result<String, AppError> {
    request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|s| s.to_string())
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))
}

/// Middleware: validates the bearer token and attaches [`AuthUser`] to
/// request extensions. Any handler behind this layer may extract it
/// directly; role gating is a separate, per-route concern (see
/// [`require_role`]).
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer(&request)?;
    let claims = decode_token(
        &state.config.jwt_secret_key,
        &state.config.jwt_algorithm,
        &token,
    )?;

    let role = Role::from_str(&claims.role)
        .ok_or_else(|| AppError::Unauthorized("token carries an unknown role".to_string()))?;

    request.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        email: claims.email,
        role,
    });

    Ok(next.run(request).await)
}

/// Fails `FORBIDDEN` unless the authenticated user's role is in
/// `allowed`. Call from within a handler after extracting [`AuthUser`].
pub fn require_role(user: &AuthUser, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "role {} may not perform this action",
            user.role.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_token() {
        let token = issue_token("a-secret-at-least-32-bytes-long", "HS256", 60, 7, "a@b.com", Role::Kitchen)
            .unwrap();
        let claims = decode_token("a-secret-at-least-32-bytes-long", "HS256", &token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.role, "kitchen");
    }

    #[test]
    fn rejects_tampered_secret() {
        let token = issue_token("a-secret-at-least-32-bytes-long", "HS256", 60, 7, "a@b.com", Role::Kitchen)
            .unwrap();
        assert!(decode_token("a-different-secret-at-least-32b", "HS256", &token).is_err());
    }

    #[test]
    fn password_hash_round_trips() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong password", &hash));
    }
}
