use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use tabletop_auth_types::token::AuthError;
use tabletop_core::envelope::error_response;

/// API error variants. Each maps to a stable `error` code in the response envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("password must be at least 8 characters and contain upper-case, lower-case and a digit")]
    WeakPassword,
    #[error("invalid email format")]
    InvalidEmail,
    #[error("merchant is not active")]
    MerchantInactive,
    #[error("merchant is currently closed")]
    MerchantClosed,
    #[error("menu {0} is not available")]
    MenuNotAvailable(i64),
    #[error("addon {0} is not available for this menu")]
    AddonNotAvailable(i64),
    #[error("invalid addon selection for {0}")]
    AddonSelectionInvalid(String),
    #[error("insufficient stock for {0}")]
    InsufficientStock(String),
    #[error("cannot change order status from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("authentication required")]
    Unauthorized,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
    #[error("invalid session")]
    InvalidSession,
    #[error("session expired")]
    SessionExpired,
    #[error("session revoked")]
    SessionRevoked,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    #[error("account is disabled")]
    AccountDisabled,
    #[error("forbidden")]
    Forbidden,

    #[error("user not found")]
    UserNotFound,
    #[error("merchant not found")]
    MerchantNotFound,
    #[error("category not found")]
    CategoryNotFound,
    #[error("menu not found")]
    MenuNotFound,
    #[error("addon category not found")]
    AddonCategoryNotFound,
    #[error("addon item not found")]
    AddonItemNotFound,
    #[error("order not found")]
    OrderNotFound,
    #[error("session not found")]
    SessionNotFound,

    #[error("email already registered")]
    EmailExists,
    #[error("merchant code already exists")]
    MerchantCodeExists,
    #[error("order number already taken")]
    OrderNumberTaken,

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::WeakPassword => "WEAK_PASSWORD",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::MerchantInactive => "MERCHANT_INACTIVE",
            Self::MerchantClosed => "MERCHANT_CLOSED",
            Self::MenuNotAvailable(_) => "MENU_NOT_AVAILABLE",
            Self::AddonNotAvailable(_) => "ADDON_NOT_AVAILABLE",
            Self::AddonSelectionInvalid(_) => "ADDON_SELECTION_INVALID",
            Self::InsufficientStock(_) => "INSUFFICIENT_STOCK",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidSession => "INVALID_SESSION",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::SessionRevoked => "SESSION_REVOKED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            Self::AccountDisabled => "ACCOUNT_DISABLED",
            Self::Forbidden => "FORBIDDEN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::MerchantNotFound => "MERCHANT_NOT_FOUND",
            Self::CategoryNotFound => "CATEGORY_NOT_FOUND",
            Self::MenuNotFound => "MENU_NOT_FOUND",
            Self::AddonCategoryNotFound => "ADDON_CATEGORY_NOT_FOUND",
            Self::AddonItemNotFound => "ADDON_ITEM_NOT_FOUND",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::EmailExists => "EMAIL_EXISTS",
            Self::MerchantCodeExists => "MERCHANT_CODE_EXISTS",
            Self::OrderNumberTaken => "ORDER_NUMBER_TAKEN",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::WeakPassword
            | Self::InvalidEmail
            | Self::MerchantInactive
            | Self::MerchantClosed
            | Self::MenuNotAvailable(_)
            | Self::AddonNotAvailable(_)
            | Self::AddonSelectionInvalid(_)
            | Self::InsufficientStock(_)
            | Self::InvalidStatusTransition { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::InvalidSession
            | Self::SessionExpired
            | Self::SessionRevoked
            | Self::InvalidCredentials
            | Self::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            Self::AccountDisabled | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UserNotFound
            | Self::MerchantNotFound
            | Self::CategoryNotFound
            | Self::MenuNotFound
            | Self::AddonCategoryNotFound
            | Self::AddonItemNotFound
            | Self::OrderNotFound
            | Self::SessionNotFound => StatusCode::NOT_FOUND,
            Self::EmailExists | Self::MerchantCodeExists | Self::OrderNumberTaken => {
                StatusCode::CONFLICT
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Expired => Self::TokenExpired,
            AuthError::InvalidSignature | AuthError::Malformed => Self::InvalidToken,
            AuthError::Signing(source) => Self::Internal(source.into()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        error_response(self.status(), self.kind(), self.to_string(), None)
    }
}
