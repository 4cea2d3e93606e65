//! Request extractors: bearer-token identities, client details and envelope-aware
//! body / query / path parsing.
//!
//! Identity extractors read the bearer token up front, then validate it and resolve the
//! backing session or customer against the database.

use std::convert::Infallible;
use std::future::Future;

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;

use tabletop_auth_types::bearer::bearer_token;
use tabletop_domain::role::UserRole;

use crate::error::ApiError;
use crate::state::AppState;
use crate::usecase::auth::ClientMeta;
use crate::usecase::auth_context::{
    AuthContext, CustomerContext, MerchantScope, ResolveAuthContextUseCase,
    ResolveCustomerUseCase, ResolveMerchantScopeUseCase,
};

/// JSON body whose rejection renders as a `VALIDATION_ERROR` envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejection renders as a `VALIDATION_ERROR` envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters whose rejection renders as a `VALIDATION_ERROR` envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

async fn authenticate(state: AppState, token: Option<String>) -> Result<AuthContext, ApiError> {
    let token = token.ok_or(ApiError::Unauthorized)?;
    ResolveAuthContextUseCase {
        sessions: state.session_repo(),
        users: state.user_repo(),
        access_secret: state.tokens.access_secret.clone(),
    }
    .execute(&token)
    .await
}

/// Any signed-in console user.
#[derive(Debug, Clone)]
pub struct Authenticated(pub AuthContext);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let token = bearer_token(&parts.headers);
        let state = state.clone();
        async move { authenticate(state, token).await.map(Self) }
    }
}

/// Signed-in `SUPER_ADMIN`; other roles get 403.
#[derive(Debug, Clone)]
pub struct SuperAdmin(pub AuthContext);

impl FromRequestParts<AppState> for SuperAdmin {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let token = bearer_token(&parts.headers);
        let state = state.clone();
        async move {
            let ctx = authenticate(state, token).await?;
            if ctx.role != UserRole::SuperAdmin {
                return Err(ApiError::Forbidden);
            }
            Ok(Self(ctx))
        }
    }
}

/// Signed-in merchant owner or staff, scoped to their merchant.
#[derive(Debug, Clone)]
pub struct MerchantStaff(pub MerchantScope);

impl FromRequestParts<AppState> for MerchantStaff {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let token = bearer_token(&parts.headers);
        let state = state.clone();
        async move {
            let ctx = authenticate(state.clone(), token).await?;
            let scope = ResolveMerchantScopeUseCase {
                users: state.user_repo(),
            }
            .execute(ctx)
            .await?;
            Ok(Self(scope))
        }
    }
}

/// Storefront customer holding a customer token.
#[derive(Debug, Clone)]
pub struct CustomerIdentity(pub CustomerContext);

impl FromRequestParts<AppState> for CustomerIdentity {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let token = bearer_token(&parts.headers);
        let state = state.clone();
        async move {
            let token = token.ok_or(ApiError::Unauthorized)?;
            let customer = ResolveCustomerUseCase {
                users: state.user_repo(),
                secret: state.tokens.access_secret.clone(),
            }
            .execute(&token)
            .await?;
            Ok(Self(customer))
        }
    }
}

/// User agent and client address recorded on new sessions.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo(pub ClientMeta);

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// First `x-forwarded-for` hop, else `x-real-ip`.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_owned()))
        .filter(|ip| !ip.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let meta = ClientMeta {
            device_info: header_str(&parts.headers, "user-agent"),
            ip_address: client_ip(&parts.headers),
        };
        async move { Ok(Self(meta)) }
    }
}
