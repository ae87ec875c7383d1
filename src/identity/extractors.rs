use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::Identity;
use crate::{error::AppError, state::AppState};

/// Authenticated caller. Rejects with 401 when the bearer token is missing or invalid.
pub struct AuthUser(pub Identity);

/// Optional caller for routes that anonymous users may read. A malformed or
/// expired token is still rejected rather than silently ignored.
pub struct MaybeAuthUser(pub Option<Identity>);

fn bearer(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(header) = parts.headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("invalid Authorization header".into()))?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(|t| Some(t.trim()))
        .ok_or_else(|| AppError::Unauthorized("invalid auth scheme".into()))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer(parts)?
            .ok_or_else(|| AppError::Unauthorized("please log in to continue".into()))?;
        Ok(AuthUser(state.gateway.resolve(token).await?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer(parts)? {
            Some(token) => Ok(MaybeAuthUser(Some(state.gateway.resolve(token).await?))),
            None => Ok(MaybeAuthUser(None)),
        }
    }
}
