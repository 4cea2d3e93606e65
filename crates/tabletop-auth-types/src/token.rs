//! JWT issuing and validation.
//!
//! Three token kinds share HS256 signing and are told apart by the `typ` claim:
//!
//! | Kind | Claims | Issued by |
//! |------|--------|-----------|
//! | access | `sub` user id, `sid` session id, `role`, `email` | staff login / refresh |
//! | refresh | `sub` user id, `sid` session id | staff login / refresh |
//! | customer | `sub` customer id, `email`, `name`, `role` | storefront customer login |
//!
//! Every token also carries `iat`, `exp` (seconds since UNIX epoch) and a random `jti`,
//! so two tokens minted in the same second never collide.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tabletop_domain::role::UserRole;

/// Errors returned by token issuing and validation.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
    Customer,
}

/// Staff access-token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub sid: String,
    pub role: UserRole,
    pub email: String,
    pub typ: TokenKind,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Staff refresh-token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub sid: String,
    pub typ: TokenKind,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Storefront customer-token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerClaims {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub typ: TokenKind,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

trait Typed {
    const KIND: TokenKind;
    fn typ(&self) -> TokenKind;
}

impl Typed for AccessClaims {
    const KIND: TokenKind = TokenKind::Access;
    fn typ(&self) -> TokenKind {
        self.typ
    }
}

impl Typed for RefreshClaims {
    const KIND: TokenKind = TokenKind::Refresh;
    fn typ(&self) -> TokenKind {
        self.typ
    }
}

impl Typed for CustomerClaims {
    const KIND: TokenKind = TokenKind::Customer;
    fn typ(&self) -> TokenKind {
        self.typ
    }
}

fn parse_id(raw: &str) -> Result<i64, AuthError> {
    raw.parse().map_err(|_| AuthError::Malformed)
}

impl AccessClaims {
    pub fn user_id(&self) -> Result<i64, AuthError> {
        parse_id(&self.sub)
    }

    pub fn session_id(&self) -> Result<i64, AuthError> {
        parse_id(&self.sid)
    }
}

impl RefreshClaims {
    pub fn user_id(&self) -> Result<i64, AuthError> {
        parse_id(&self.sub)
    }

    pub fn session_id(&self) -> Result<i64, AuthError> {
        parse_id(&self.sid)
    }
}

impl CustomerClaims {
    pub fn customer_id(&self) -> Result<i64, AuthError> {
        parse_id(&self.sub)
    }
}

/// A signed token and its expiry (seconds since UNIX epoch).
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String, AuthError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(AuthError::Signing)
}

/// Decode and validate a JWT, returning its claims.
///
/// Validation: HS256, exp checked (default 60s leeway), required claims `exp` + `sub`,
/// and the `typ` claim must match the expected token kind.
fn decode_jwt<T: DeserializeOwned + Typed>(token: &str, secret: &str) -> Result<T, AuthError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<T>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        _ => AuthError::Malformed,
    })?;

    if data.claims.typ() != T::KIND {
        return Err(AuthError::Malformed);
    }
    Ok(data.claims)
}

pub fn issue_access_token(
    user_id: i64,
    session_id: i64,
    role: UserRole,
    email: &str,
    secret: &str,
    ttl_secs: i64,
) -> Result<IssuedToken, AuthError> {
    let iat = Utc::now().timestamp();
    let exp = iat + ttl_secs;
    let claims = AccessClaims {
        sub: user_id.to_string(),
        sid: session_id.to_string(),
        role,
        email: email.to_owned(),
        typ: TokenKind::Access,
        jti: Uuid::new_v4().to_string(),
        iat,
        exp,
    };
    Ok(IssuedToken {
        token: sign(&claims, secret)?,
        expires_at: exp,
    })
}

pub fn issue_refresh_token(
    user_id: i64,
    session_id: i64,
    secret: &str,
    ttl_secs: i64,
) -> Result<IssuedToken, AuthError> {
    let iat = Utc::now().timestamp();
    let exp = iat + ttl_secs;
    let claims = RefreshClaims {
        sub: user_id.to_string(),
        sid: session_id.to_string(),
        typ: TokenKind::Refresh,
        jti: Uuid::new_v4().to_string(),
        iat,
        exp,
    };
    Ok(IssuedToken {
        token: sign(&claims, secret)?,
        expires_at: exp,
    })
}

pub fn issue_customer_token(
    customer_id: i64,
    email: &str,
    name: &str,
    secret: &str,
    ttl_secs: i64,
) -> Result<IssuedToken, AuthError> {
    let iat = Utc::now().timestamp();
    let exp = iat + ttl_secs;
    let claims = CustomerClaims {
        sub: customer_id.to_string(),
        email: email.to_owned(),
        name: name.to_owned(),
        role: UserRole::Customer,
        typ: TokenKind::Customer,
        jti: Uuid::new_v4().to_string(),
        iat,
        exp,
    };
    Ok(IssuedToken {
        token: sign(&claims, secret)?,
        expires_at: exp,
    })
}

pub fn validate_access_token(token: &str, secret: &str) -> Result<AccessClaims, AuthError> {
    decode_jwt(token, secret)
}

pub fn validate_refresh_token(token: &str, secret: &str) -> Result<RefreshClaims, AuthError> {
    decode_jwt(token, secret)
}

pub fn validate_customer_token(token: &str, secret: &str) -> Result<CustomerClaims, AuthError> {
    decode_jwt(token, secret)
}
