use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::sync::Arc;

use crate::context::RequestContext;
use crate::error::Error;
use crate::services::auth::TokenKind;

/// Caller authenticated with `Authorization: Bearer <access token>`.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub RequestContext);

/// Anonymous callers pass through as `None`; a present but invalid token is
/// still rejected.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthUser(pub Option<RequestContext>);

fn bearer_token(parts: &Parts) -> Result<Option<&str>, Error> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| Error::unauthorized())?;
    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(Error::unauthorized)?;
    Ok(Some(token))
}

fn authenticate(parts: &Parts, state: &crate::AppState) -> Result<Option<RequestContext>, Error> {
    match bearer_token(parts)? {
        Some(token) => {
            let claims = state.tokens.verify(token, Some(TokenKind::Access))?;
            Ok(Some(claims.context()?))
        }
        None => Ok(None),
    }
}

impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state)?
            .map(AuthUser)
            .ok_or_else(Error::unauthorized)
    }
}

impl FromRequestParts<Arc<crate::AppState>> for MaybeAuthUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).map(MaybeAuthUser)
    }
}
