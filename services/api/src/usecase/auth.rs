use chrono::{DateTime, Duration, Utc};
use tracing::info;

use tabletop_auth_types::token::{
    IssuedToken, issue_access_token, issue_refresh_token, validate_refresh_token,
};
use tabletop_domain::credentials::{is_strong_password, is_valid_email, normalize_email};
use tabletop_domain::role::UserRole;
use tabletop_domain::session::SessionState;

use crate::config::TokenSettings;
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::types::{MerchantLink, NewSession, Session, SessionTokens, User};
use crate::error::ApiError;
use crate::infra::password::{spawn_hash_password, spawn_verify_password};
use crate::usecase::auth_context::AuthContext;

/// Client details recorded on a new session.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
}

#[derive(Debug)]
pub struct TokenPair {
    pub access_token: IssuedToken,
    pub refresh_token: IssuedToken,
    /// Access-token lifetime in seconds.
    pub expires_in: i64,
}

fn sign_pair(
    tokens: &TokenSettings,
    user: &User,
    session_id: i64,
) -> Result<TokenPair, ApiError> {
    let access_token = issue_access_token(
        user.id,
        session_id,
        user.role,
        &user.email,
        &tokens.access_secret,
        tokens.access_ttl_secs,
    )?;
    let refresh_token = issue_refresh_token(
        user.id,
        session_id,
        &tokens.refresh_secret,
        tokens.refresh_ttl_secs,
    )?;
    Ok(TokenPair {
        access_token,
        refresh_token,
        expires_in: tokens.access_ttl_secs,
    })
}

/// Create a session for `user` with the signed token pair stored on it.
async fn open_session<S: SessionRepository>(
    sessions: &S,
    tokens: &TokenSettings,
    user: &User,
    client: ClientMeta,
    now: DateTime<Utc>,
) -> Result<(Session, TokenPair), ApiError> {
    let expires_at = now + Duration::seconds(tokens.refresh_ttl_secs);
    let new_session = NewSession {
        user_id: user.id,
        device_info: client.device_info,
        ip_address: client.ip_address,
        expires_at,
    };
    sessions
        .create(&new_session, |session_id| {
            let pair = sign_pair(tokens, user, session_id)?;
            let stored = SessionTokens {
                token: pair.access_token.token.clone(),
                refresh_token: pair.refresh_token.token.clone(),
            };
            Ok((stored, pair))
        })
        .await
}

fn require(value: &str, message: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::validation(message))
    } else {
        Ok(())
    }
}

// ── Login ────────────────────────────────────────────────────────────────────

pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub client: ClientMeta,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub user: User,
    pub merchant: Option<MerchantLink>,
    pub session: Session,
    pub tokens: TokenPair,
    pub must_change_password: bool,
}

pub struct LoginUseCase<U: UserRepository, S: SessionRepository> {
    pub users: U,
    pub sessions: S,
    pub tokens: TokenSettings,
}

impl<U: UserRepository, S: SessionRepository> LoginUseCase<U, S> {
    pub async fn execute(&self, input: LoginInput) -> Result<LoginOutput, ApiError> {
        require(&input.email, "email and password are required")?;
        require(&input.password, "email and password are required")?;

        let email = normalize_email(&input.email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .filter(|u| u.role.is_staff())
            .ok_or(ApiError::InvalidCredentials)?;

        if !spawn_verify_password(&input.password, user.password_hash.as_deref()).await? {
            return Err(ApiError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(ApiError::AccountDisabled);
        }

        complete_login(&self.users, &self.sessions, &self.tokens, user, input.client).await
    }
}

async fn complete_login<U: UserRepository, S: SessionRepository>(
    users: &U,
    sessions: &S,
    tokens: &TokenSettings,
    user: User,
    client: ClientMeta,
) -> Result<LoginOutput, ApiError> {
    let now = Utc::now();
    let merchant = if user.role.is_merchant_user() {
        users.merchant_link(user.id).await?
    } else {
        None
    };

    let (session, tokens) = open_session(sessions, tokens, &user, client, now).await?;
    users.touch_last_login(user.id, now).await?;

    info!(user_id = user.id, session_id = session.id, role = %user.role, "user logged in");
    Ok(LoginOutput {
        must_change_password: user.must_change_password,
        user,
        merchant,
        session,
        tokens,
    })
}

// ── Refresh ──────────────────────────────────────────────────────────────────

pub struct RefreshUseCase<U: UserRepository, S: SessionRepository> {
    pub users: U,
    pub sessions: S,
    pub tokens: TokenSettings,
}

impl<U: UserRepository, S: SessionRepository> RefreshUseCase<U, S> {
    pub async fn execute(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        require(refresh_token, "refresh token is required")?;

        let claims = validate_refresh_token(refresh_token, &self.tokens.refresh_secret)
            .map_err(|_| ApiError::InvalidRefreshToken)?;
        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::InvalidRefreshToken)?;
        let session_id = claims
            .session_id()
            .map_err(|_| ApiError::InvalidRefreshToken)?;

        let now = Utc::now();
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or(ApiError::InvalidRefreshToken)?;
        match session.state(now) {
            SessionState::Valid => {}
            SessionState::Revoked => return Err(ApiError::SessionRevoked),
            SessionState::Expired => return Err(ApiError::SessionExpired),
        }
        if session.refresh_token != refresh_token {
            return Err(ApiError::InvalidRefreshToken);
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(ApiError::AccountDisabled)?;

        let pair = sign_pair(&self.tokens, &user, session.id)?;
        self.sessions
            .set_tokens(
                session.id,
                &pair.access_token.token,
                &pair.refresh_token.token,
                now + Duration::seconds(self.tokens.refresh_ttl_secs),
            )
            .await?;
        Ok(pair)
    }
}

// ── Logout ───────────────────────────────────────────────────────────────────

pub struct LogoutUseCase<S: SessionRepository> {
    pub sessions: S,
}

impl<S: SessionRepository> LogoutUseCase<S> {
    pub async fn execute(&self, ctx: &AuthContext) -> Result<(), ApiError> {
        self.sessions.revoke(ctx.session_id).await?;
        info!(user_id = ctx.user_id, session_id = ctx.session_id, "user logged out");
        Ok(())
    }
}

pub struct LogoutAllUseCase<S: SessionRepository> {
    pub sessions: S,
}

impl<S: SessionRepository> LogoutAllUseCase<S> {
    /// Returns the number of sessions revoked.
    pub async fn execute(&self, ctx: &AuthContext) -> Result<u64, ApiError> {
        let revoked = self.sessions.revoke_all(ctx.user_id, None).await?;
        info!(user_id = ctx.user_id, revoked, "user logged out everywhere");
        Ok(revoked)
    }
}

// ── Me ───────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct MeOutput {
    pub user: User,
    pub merchant: Option<MerchantLink>,
    pub session: Session,
}

pub struct MeUseCase<U: UserRepository, S: SessionRepository> {
    pub users: U,
    pub sessions: S,
}

impl<U: UserRepository, S: SessionRepository> MeUseCase<U, S> {
    pub async fn execute(&self, ctx: &AuthContext) -> Result<MeOutput, ApiError> {
        let user = self
            .users
            .find_by_id(ctx.user_id)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        let session = self
            .sessions
            .find_by_id(ctx.session_id)
            .await?
            .ok_or(ApiError::SessionNotFound)?;
        let merchant = self.users.merchant_link(ctx.user_id).await?;
        Ok(MeOutput {
            user,
            merchant,
            session,
        })
    }
}

// ── Sessions ─────────────────────────────────────────────────────────────────

pub struct ListSessionsUseCase<S: SessionRepository> {
    pub sessions: S,
}

impl<S: SessionRepository> ListSessionsUseCase<S> {
    pub async fn execute(&self, ctx: &AuthContext) -> Result<Vec<Session>, ApiError> {
        self.sessions.list_active(ctx.user_id, Utc::now()).await
    }
}

pub struct RevokeSessionUseCase<S: SessionRepository> {
    pub sessions: S,
}

impl<S: SessionRepository> RevokeSessionUseCase<S> {
    pub async fn execute(&self, ctx: &AuthContext, session_id: i64) -> Result<(), ApiError> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .filter(|s| s.user_id == ctx.user_id)
            .ok_or(ApiError::SessionNotFound)?;
        self.sessions.revoke(session.id).await?;
        Ok(())
    }
}

// ── ChangePassword ───────────────────────────────────────────────────────────

pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

pub struct ChangePasswordUseCase<U: UserRepository, S: SessionRepository> {
    pub users: U,
    pub sessions: S,
}

impl<U: UserRepository, S: SessionRepository> ChangePasswordUseCase<U, S> {
    pub async fn execute(
        &self,
        ctx: &AuthContext,
        input: ChangePasswordInput,
    ) -> Result<(), ApiError> {
        require(
            &input.current_password,
            "current password and new password are required",
        )?;
        require(
            &input.new_password,
            "current password and new password are required",
        )?;

        let user = self
            .users
            .find_by_id(ctx.user_id)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        if !spawn_verify_password(&input.current_password, user.password_hash.as_deref()).await? {
            return Err(ApiError::InvalidCredentials);
        }
        if !is_strong_password(&input.new_password) {
            return Err(ApiError::WeakPassword);
        }

        let hash = spawn_hash_password(&input.new_password).await?;
        self.users.update_password(user.id, &hash, false).await?;
        let revoked = self
            .sessions
            .revoke_all(user.id, Some(ctx.session_id))
            .await?;
        info!(user_id = user.id, revoked, "password changed");
        Ok(())
    }
}

// ── FirstTimePassword ────────────────────────────────────────────────────────

pub struct FirstTimePasswordInput {
    pub email: String,
    pub temp_password: String,
    pub new_password: String,
    pub client: ClientMeta,
}

/// Replace a temporary password and sign the user in.
pub struct FirstTimePasswordUseCase<U: UserRepository, S: SessionRepository> {
    pub users: U,
    pub sessions: S,
    pub tokens: TokenSettings,
}

impl<U: UserRepository, S: SessionRepository> FirstTimePasswordUseCase<U, S> {
    pub async fn execute(&self, input: FirstTimePasswordInput) -> Result<LoginOutput, ApiError> {
        require(&input.email, "email, current password and new password are required")?;
        require(
            &input.temp_password,
            "email, current password and new password are required",
        )?;
        require(
            &input.new_password,
            "email, current password and new password are required",
        )?;

        let email = normalize_email(&input.email);
        if !is_valid_email(&email) {
            return Err(ApiError::InvalidEmail);
        }
        if !is_strong_password(&input.new_password) {
            return Err(ApiError::WeakPassword);
        }

        let mut user = self
            .users
            .find_by_email(&email)
            .await?
            .filter(|u| u.role != UserRole::Customer)
            .ok_or(ApiError::InvalidCredentials)?;
        if !spawn_verify_password(&input.temp_password, user.password_hash.as_deref()).await? {
            return Err(ApiError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(ApiError::AccountDisabled);
        }

        let hash = spawn_hash_password(&input.new_password).await?;
        self.users.update_password(user.id, &hash, false).await?;
        user.password_hash = Some(hash);
        user.must_change_password = false;
        info!(user_id = user.id, "temporary password replaced");

        complete_login(&self.users, &self.sessions, &self.tokens, user, input.client).await
    }
}
