//! User and merchant membership roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ParseEnumError;

/// Platform-wide user role.
///
/// Wire format: `SCREAMING_SNAKE_CASE` string, stored verbatim in the `users.role` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    SuperAdmin,
    MerchantOwner,
    MerchantStaff,
    Customer,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        Self::SuperAdmin,
        Self::MerchantOwner,
        Self::MerchantStaff,
        Self::Customer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "SUPER_ADMIN",
            Self::MerchantOwner => "MERCHANT_OWNER",
            Self::MerchantStaff => "MERCHANT_STAFF",
            Self::Customer => "CUSTOMER",
        }
    }

    /// Super admins and merchant owners can administer other accounts.
    pub fn is_admin(self) -> bool {
        matches!(self, Self::SuperAdmin | Self::MerchantOwner)
    }

    /// Owners and staff operate a merchant dashboard.
    pub fn is_merchant_user(self) -> bool {
        matches!(self, Self::MerchantOwner | Self::MerchantStaff)
    }

    /// Every role except customers signs in with a password and a server-side session.
    pub fn is_staff(self) -> bool {
        !matches!(self, Self::Customer)
    }

    pub fn has_any(self, allowed: &[UserRole]) -> bool {
        allowed.contains(&self)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("user role", s))
    }
}

/// Role of a user inside the merchant they belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MerchantRole {
    Owner,
    Staff,
}

impl MerchantRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::Staff => "STAFF",
        }
    }
}

impl fmt::Display for MerchantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MerchantRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OWNER" => Ok(Self::Owner),
            "STAFF" => Ok(Self::Staff),
            _ => Err(ParseEnumError::new("merchant role", s)),
        }
    }
}
