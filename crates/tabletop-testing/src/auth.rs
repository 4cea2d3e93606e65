//! Mock auth helpers for integration tests.
//!
//! Signs real JWTs with a test secret so requests pass through the same bearer-token
//! extractors as production traffic.

use axum::http::{HeaderMap, HeaderValue, header::AUTHORIZATION};

use tabletop_auth_types::token::{issue_access_token, issue_customer_token};
use tabletop_domain::role::UserRole;

/// JWT secret shared by test states and [`MockAuth`].
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-unit-tests-only";

/// Staff identity to sign an access token for.
pub struct MockAuth {
    pub user_id: i64,
    pub session_id: i64,
    pub role: UserRole,
    pub email: String,
}

impl MockAuth {
    pub fn new(user_id: i64, session_id: i64, role: UserRole, email: &str) -> Self {
        Self {
            user_id,
            session_id,
            role,
            email: email.to_owned(),
        }
    }

    pub fn super_admin() -> Self {
        Self::new(1, 1, UserRole::SuperAdmin, "admin@example.com")
    }

    /// Signed access token valid for one hour.
    pub fn token(&self) -> String {
        issue_access_token(
            self.user_id,
            self.session_id,
            self.role,
            &self.email,
            TEST_JWT_SECRET,
            3600,
        )
        .expect("sign test access token")
        .token
    }

    /// `Authorization: Bearer …` header for this identity.
    pub fn headers(&self) -> HeaderMap {
        bearer_headers(&self.token())
    }
}

/// Storefront customer identity to sign a customer token for.
pub struct MockCustomer {
    pub customer_id: i64,
    pub email: String,
    pub name: String,
}

impl MockCustomer {
    pub fn new(customer_id: i64, email: &str, name: &str) -> Self {
        Self {
            customer_id,
            email: email.to_owned(),
            name: name.to_owned(),
        }
    }

    pub fn token(&self) -> String {
        issue_customer_token(
            self.customer_id,
            &self.email,
            &self.name,
            TEST_JWT_SECRET,
            3600,
        )
        .expect("sign test customer token")
        .token
    }
}

pub fn bearer_headers(token: &str) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header value"),
    );
    map
}
