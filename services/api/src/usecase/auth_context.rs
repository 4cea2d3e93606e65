use chrono::{DateTime, Utc};

use tabletop_auth_types::token::{AccessClaims, validate_access_token, validate_customer_token};
use tabletop_domain::role::{MerchantRole, UserRole};
use tabletop_domain::session::SessionState;

use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::types::{Session, User};
use crate::error::ApiError;

/// Identity of an authenticated staff request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: i64,
    pub session_id: i64,
    pub role: UserRole,
    pub email: String,
}

/// Staff identity narrowed to the merchant the user works for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerchantScope {
    pub ctx: AuthContext,
    pub merchant_id: i64,
    pub merchant_role: MerchantRole,
}

impl MerchantScope {
    pub fn require_owner(&self) -> Result<(), ApiError> {
        if self.merchant_role == MerchantRole::Owner {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

/// Identity of an authenticated storefront customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerContext {
    pub customer_id: i64,
    pub email: String,
    pub name: String,
}

/// Check a validated access token against its backing session and user.
///
/// Order of checks:
/// 1. the session exists and belongs to the token's subject (`INVALID_SESSION`)
/// 2. the session is active and unexpired (`SESSION_REVOKED` / `SESSION_EXPIRED`)
/// 3. the session still holds this exact access token (`INVALID_SESSION`)
/// 4. the user exists and is active (`ACCOUNT_DISABLED`)
pub fn derive_auth_context(
    claims: &AccessClaims,
    token: &str,
    session: Option<&Session>,
    user: Option<&User>,
    now: DateTime<Utc>,
) -> Result<AuthContext, ApiError> {
    let user_id = claims.user_id()?;
    let session_id = claims.session_id()?;

    let session = session
        .filter(|s| s.id == session_id && s.user_id == user_id)
        .ok_or(ApiError::InvalidSession)?;

    match session.state(now) {
        SessionState::Valid => {}
        SessionState::Revoked => return Err(ApiError::SessionRevoked),
        SessionState::Expired => return Err(ApiError::SessionExpired),
    }

    if session.token != token {
        return Err(ApiError::InvalidSession);
    }

    let user = user
        .filter(|u| u.id == user_id && u.is_active)
        .ok_or(ApiError::AccountDisabled)?;

    Ok(AuthContext {
        user_id,
        session_id,
        role: user.role,
        email: user.email.clone(),
    })
}

// ── ResolveAuthContext ───────────────────────────────────────────────────────

pub struct ResolveAuthContextUseCase<S: SessionRepository, U: UserRepository> {
    pub sessions: S,
    pub users: U,
    pub access_secret: String,
}

impl<S: SessionRepository, U: UserRepository> ResolveAuthContextUseCase<S, U> {
    pub async fn execute(&self, token: &str) -> Result<AuthContext, ApiError> {
        let claims = validate_access_token(token, &self.access_secret)?;
        let now = Utc::now();

        let session = self.sessions.find_by_id(claims.session_id()?).await?;
        let user = self.users.find_by_id(claims.user_id()?).await?;
        let ctx = derive_auth_context(&claims, token, session.as_ref(), user.as_ref(), now)?;

        self.sessions.touch(ctx.session_id, now).await?;
        Ok(ctx)
    }
}

// ── ResolveMerchantScope ─────────────────────────────────────────────────────

pub struct ResolveMerchantScopeUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ResolveMerchantScopeUseCase<U> {
    pub async fn execute(&self, ctx: AuthContext) -> Result<MerchantScope, ApiError> {
        if !ctx.role.is_merchant_user() {
            return Err(ApiError::Forbidden);
        }
        let link = self
            .users
            .merchant_link(ctx.user_id)
            .await?
            .ok_or(ApiError::MerchantNotFound)?;
        Ok(MerchantScope {
            ctx,
            merchant_id: link.merchant_id,
            merchant_role: link.role,
        })
    }
}

// ── ResolveCustomer ──────────────────────────────────────────────────────────

pub struct ResolveCustomerUseCase<U: UserRepository> {
    pub users: U,
    pub secret: String,
}

impl<U: UserRepository> ResolveCustomerUseCase<U> {
    pub async fn execute(&self, token: &str) -> Result<CustomerContext, ApiError> {
        let claims = validate_customer_token(token, &self.secret)?;
        let customer_id = claims.customer_id()?;

        let user = self
            .users
            .find_by_id(customer_id)
            .await?
            .filter(|u| u.role == UserRole::Customer)
            .ok_or(ApiError::InvalidToken)?;
        if !user.is_active {
            return Err(ApiError::AccountDisabled);
        }

        Ok(CustomerContext {
            customer_id,
            email: user.email,
            name: user.name,
        })
    }
}
