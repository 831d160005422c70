//! Request extractors that turn a bearer token into an authorized [`Scope`].

use std::marker::PhantomData;

use axum::{
    extract::{FromRequestParts, RawPathParams},
    http::{header::AUTHORIZATION, request::Parts},
};
use db::models::user::Role;
use services::services::auth::{
    ADMIN, ANY_ROLE, CLIENT, JANITOR, STAFF, Scope, SessionClaims, authorize,
};
use tracing::debug;
use utils::session::bearer_token;

use crate::{AppState, error::ApiError};

/// Roles a route group admits.
pub trait RoleSet: Send + Sync + 'static {
    const ALLOWED: &'static [Role];
}

pub struct AdminOnly;
pub struct Staff;
pub struct JanitorOnly;
pub struct ClientOnly;
pub struct AnyMember;

impl RoleSet for AdminOnly {
    const ALLOWED: &'static [Role] = ADMIN;
}
impl RoleSet for Staff {
    const ALLOWED: &'static [Role] = STAFF;
}
impl RoleSet for JanitorOnly {
    const ALLOWED: &'static [Role] = JANITOR;
}
impl RoleSet for ClientOnly {
    const ALLOWED: &'static [Role] = CLIENT;
}
impl RoleSet for AnyMember {
    const ALLOWED: &'static [Role] = ANY_ROLE;
}

fn claims_from(parts: &Parts, state: &AppState) -> Option<SessionClaims> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = bearer_token(header)?;
    match SessionClaims::decode(&state.codec, token) {
        Ok(claims) => Some(claims),
        Err(e) => {
            debug!(error = %e, "Rejected session token");
            None
        }
    }
}

/// Verified session claims.
pub struct Session(pub SessionClaims);

impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        claims_from(parts, state)
            .map(Session)
            .ok_or(ApiError::Unauthenticated)
    }
}

/// Session claims when a valid token was sent; never rejects.
pub struct MaybeSession(pub Option<SessionClaims>);

impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(claims_from(parts, state)))
    }
}

/// Caller authorized for the `{org_slug}` in the path with one of `R::ALLOWED`.
pub struct Authorized<R>(pub Scope, pub PhantomData<R>);

impl<R: RoleSet> FromRequestParts<AppState> for Authorized<R> {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Session(claims) = Session::from_request_parts(parts, state).await?;
        let params = RawPathParams::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::BadRequest("Missing organisation".to_string()))?;
        let org_slug = params
            .iter()
            .find(|(name, _)| *name == "org_slug")
            .map(|(_, value)| value.to_string())
            .ok_or_else(|| ApiError::BadRequest("Missing organisation".to_string()))?;

        let scope = authorize(&state.db.pool, &claims, &org_slug, R::ALLOWED).await?;
        Ok(Authorized(scope, PhantomData))
    }
}
