use axum::extract::State;
use serde::{Deserialize, Serialize};

use tabletop_core::envelope::ApiResponse;
use tabletop_domain::role::UserRole;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, Authenticated, ClientInfo};
use crate::handlers::views::{SessionResponse, UserResponse};
use crate::state::AppState;
use crate::usecase::auth::{
    ChangePasswordInput, ChangePasswordUseCase, FirstTimePasswordInput, FirstTimePasswordUseCase,
    ListSessionsUseCase, LoginInput, LoginOutput, LoginUseCase, LogoutAllUseCase, LogoutUseCase,
    MeUseCase, RefreshUseCase, RevokeSessionUseCase, TokenPair,
};

// ── POST /api/auth/login ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUserResponse {
    #[serde(serialize_with = "tabletop_core::serde::id_to_string")]
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "tabletop_core::serde::id_to_string_opt"
    )]
    pub merchant_id: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: LoginUserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub must_change_password: bool,
}

impl From<LoginOutput> for LoginResponse {
    fn from(out: LoginOutput) -> Self {
        Self {
            user: LoginUserResponse {
                id: out.user.id,
                name: out.user.name,
                email: out.user.email,
                role: out.user.role,
                merchant_id: out.merchant.map(|m| m.merchant_id),
            },
            access_token: out.tokens.access_token.token,
            refresh_token: out.tokens.refresh_token.token,
            expires_in: out.tokens.expires_in,
            must_change_password: out.must_change_password,
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    ClientInfo(client): ClientInfo,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>, ApiError> {
    let usecase = LoginUseCase {
        users: state.user_repo(),
        sessions: state.session_repo(),
        tokens: state.tokens.clone(),
    };
    let out = usecase
        .execute(LoginInput {
            email: body.email,
            password: body.password,
            client,
        })
        .await?;
    Ok(ApiResponse::ok(out.into(), "Login successful"))
}

// ── POST /api/auth/refresh ───────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token.token,
            refresh_token: pair.refresh_token.token,
            expires_in: pair.expires_in,
        }
    }
}

pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RefreshRequest>,
) -> Result<ApiResponse<TokenPairResponse>, ApiError> {
    if body.refresh_token.trim().is_empty() {
        return Err(ApiError::validation("refreshToken is required"));
    }
    let usecase = RefreshUseCase {
        users: state.user_repo(),
        sessions: state.session_repo(),
        tokens: state.tokens.clone(),
    };
    let pair = usecase.execute(body.refresh_token.trim()).await?;
    Ok(ApiResponse::ok(pair.into(), "Token refreshed"))
}

// ── POST /api/auth/logout ────────────────────────────────────────────────────

pub async fn logout(
    Authenticated(ctx): Authenticated,
    State(state): State<AppState>,
) -> Result<ApiResponse<()>, ApiError> {
    let usecase = LogoutUseCase {
        sessions: state.session_repo(),
    };
    usecase.execute(&ctx).await?;
    Ok(ApiResponse::ok((), "Logged out"))
}

// ── POST /api/auth/logout-all ────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutAllResponse {
    pub revoked_count: u64,
}

pub async fn logout_all(
    Authenticated(ctx): Authenticated,
    State(state): State<AppState>,
) -> Result<ApiResponse<LogoutAllResponse>, ApiError> {
    let usecase = LogoutAllUseCase {
        sessions: state.session_repo(),
    };
    let revoked_count = usecase.execute(&ctx).await?;
    Ok(ApiResponse::ok(
        LogoutAllResponse { revoked_count },
        "Logged out from all sessions",
    ))
}

// ── GET /api/auth/me ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
    pub session: SessionResponse,
}

pub async fn me(
    Authenticated(ctx): Authenticated,
    State(state): State<AppState>,
) -> Result<ApiResponse<MeResponse>, ApiError> {
    let usecase = MeUseCase {
        users: state.user_repo(),
        sessions: state.session_repo(),
    };
    let out = usecase.execute(&ctx).await?;
    Ok(ApiResponse::ok(
        MeResponse {
            user: UserResponse::with_merchant(out.user, out.merchant),
            session: SessionResponse::new(out.session, ctx.session_id),
        },
        "Profile retrieved",
    ))
}

// ── GET /api/auth/sessions ───────────────────────────────────────────────────

#[derive(Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionResponse>,
}

pub async fn list_sessions(
    Authenticated(ctx): Authenticated,
    State(state): State<AppState>,
) -> Result<ApiResponse<SessionsResponse>, ApiError> {
    let usecase = ListSessionsUseCase {
        sessions: state.session_repo(),
    };
    let sessions = usecase
        .execute(&ctx)
        .await?
        .into_iter()
        .map(|s| SessionResponse::new(s, ctx.session_id))
        .collect();
    Ok(ApiResponse::ok(
        SessionsResponse { sessions },
        "Sessions retrieved",
    ))
}

// ── DELETE /api/auth/sessions/{sessionId} ────────────────────────────────────

pub async fn revoke_session(
    Authenticated(ctx): Authenticated,
    State(state): State<AppState>,
    ApiPath(session_id): ApiPath<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    let usecase = RevokeSessionUseCase {
        sessions: state.session_repo(),
    };
    usecase.execute(&ctx, session_id).await?;
    Ok(ApiResponse::ok((), "Session revoked"))
}

// ── POST /api/auth/change-password ───────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

pub async fn change_password(
    Authenticated(ctx): Authenticated,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    let usecase = ChangePasswordUseCase {
        users: state.user_repo(),
        sessions: state.session_repo(),
    };
    usecase
        .execute(
            &ctx,
            ChangePasswordInput {
                current_password: body.current_password,
                new_password: body.new_password,
            },
        )
        .await?;
    Ok(ApiResponse::ok((), "Password changed"))
}

// ── POST /api/auth/first-time-password ───────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstTimePasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

pub async fn first_time_password(
    State(state): State<AppState>,
    ClientInfo(client): ClientInfo,
    ApiJson(body): ApiJson<FirstTimePasswordRequest>,
) -> Result<ApiResponse<LoginResponse>, ApiError> {
    replace_temp_password(
        &state,
        FirstTimePasswordInput {
            email: body.email,
            temp_password: body.current_password,
            new_password: body.new_password,
            client,
        },
    )
    .await
}

// ── POST /api/auth/first-time-password-change ────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstTimePasswordChangeRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub temp_password: String,
    #[serde(default)]
    pub new_password: String,
}

pub async fn first_time_password_change(
    State(state): State<AppState>,
    ClientInfo(client): ClientInfo,
    ApiJson(body): ApiJson<FirstTimePasswordChangeRequest>,
) -> Result<ApiResponse<LoginResponse>, ApiError> {
    replace_temp_password(
        &state,
        FirstTimePasswordInput {
            email: body.email,
            temp_password: body.temp_password,
            new_password: body.new_password,
            client,
        },
    )
    .await
}

async fn replace_temp_password(
    state: &AppState,
    input: FirstTimePasswordInput,
) -> Result<ApiResponse<LoginResponse>, ApiError> {
    let usecase = FirstTimePasswordUseCase {
        users: state.user_repo(),
        sessions: state.session_repo(),
        tokens: state.tokens.clone(),
    };
    let out = usecase.execute(input).await?;
    Ok(ApiResponse::ok(
        out.into(),
        "Password changed and logged in",
    ))
}
