use std::sync::Arc;

use crate::{db_helpers::get_user_by_id, errors::RequestError, AppState};
use anyhow::{Context, Result};
use argon2::PasswordVerifier;
use argon2::{password_hash::SaltString, Argon2, PasswordHash};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::Extension;
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

const JWT_EXPIRY_DURATION: time::Duration = time::Duration::days(14);

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Serialize, Deserialize)]
struct AuthClaim {
    id: i64,
    exp: i64,
}

/// Where the request's token came from. Only cookie sessions need CSRF checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Header,
    Session,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub source: TokenSource,
}

pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn get_id(&self) -> Option<i64> {
        self.0.as_ref().map(|a| a.id)
    }
}

fn token_from_parts(parts: &Parts) -> Result<Option<(String, TokenSource)>, RequestError> {
    if let Some(header) = parts.headers.get("Authorization") {
        let header = header.to_str().map_err(|_| {
            tracing::debug!("authorization header is not valid utf-8");
            RequestError::NotAuthorized("Invalid token")
        })?;
        let token = header.strip_prefix("Token ").ok_or_else(|| {
            tracing::debug!("authorization header without Token prefix");
            RequestError::NotAuthorized("Invalid token")
        })?;
        return Ok(Some((token.to_string(), TokenSource::Header)));
    }
    let jar = CookieJar::from_headers(&parts.headers);
    Ok(jar
        .get(SESSION_COOKIE)
        .map(|cookie| (cookie.value().to_string(), TokenSource::Session)))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let Extension(app) = Extension::<Arc<AppState>>::from_request_parts(parts, state)
            .await
            .map_err(|_| RequestError::ServerError)?;

        let (token, source) = match token_from_parts(parts)? {
            Some(found) => found,
            None => return Ok(MaybeUser(None)),
        };

        let id = match verify_jwt_token(&app.config.jwt_secret, &token) {
            Ok(id) => id,
            // a stale session cookie just means "logged out"
            Err(_) if source == TokenSource::Session => return Ok(MaybeUser(None)),
            Err(e) => return Err(e),
        };

        let user = match get_user_by_id(&app.pool, id).await? {
            Some(user) => user,
            None => {
                tracing::debug!(user_id = id, "token refers to a deleted user");
                return Ok(MaybeUser(None));
            }
        };

        Ok(MaybeUser(Some(AuthUser {
            id: user.id,
            username: user.username,
            source,
        })))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
        match user {
            Some(user) => Ok(user),
            None => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| parts.uri.path().to_string());
                Err(RequestError::LoginRequired(next))
            }
        }
    }
}

pub fn get_jwt_token(secret: &str, id: i64) -> Result<String> {
    let expiry_date = OffsetDateTime::now_utc() + JWT_EXPIRY_DURATION;
    let claim = AuthClaim {
        id,
        exp: expiry_date.unix_timestamp(),
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claim,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_ref()),
    )
    .context("Failed to generate jwt token")
}

pub fn verify_jwt_token(secret: &str, token: &str) -> Result<i64, RequestError> {
    let token_data = jsonwebtoken::decode::<AuthClaim>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(secret.as_ref()),
        &jsonwebtoken::Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "rejected jwt token");
        RequestError::NotAuthorized("Invalid Token")
    })?;
    let claim = token_data.claims;
    if claim.exp < OffsetDateTime::now_utc().unix_timestamp() {
        return Err(RequestError::NotAuthorized("Token expired"));
    }
    Ok(claim.id)
}

pub async fn verify_password_argon2(password: String, hash: &str) -> Result<bool> {
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let hash = PasswordHash::new(hash.as_str())
            .map_err(|_| anyhow::anyhow!("Failed to verify password"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    })
    .await
    .context("Failed to verify password")?
}

pub async fn hash_password_argon2(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = PasswordHash::generate(Argon2::default(), password, salt.as_salt())
            .map_err(|_| anyhow::anyhow!("Failed to hash password"))?;
        Ok(hash.to_string())
    })
    .await
    .context("Failed to hash password")?
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn jwt_round_trips_user_id() {
        let token = get_jwt_token(SECRET, 42).unwrap();
        assert_eq!(verify_jwt_token(SECRET, &token).unwrap(), 42);
    }

    #[test]
    fn jwt_with_wrong_secret_is_rejected() {
        let token = get_jwt_token(SECRET, 42).unwrap();
        assert!(matches!(
            verify_jwt_token("other-secret", &token),
            Err(RequestError::NotAuthorized(_))
        ));
    }

    #[tokio::test]
    async fn password_hash_verifies() {
        let hash = hash_password_argon2("hunter22".into()).await.unwrap();
        assert!(verify_password_argon2("hunter22".into(), &hash)
            .await
            .unwrap());
        assert!(!verify_password_argon2("hunter23".into(), &hash)
            .await
            .unwrap());
    }
}
