use tracing::info;

use tabletop_auth_types::token::{IssuedToken, issue_customer_token};
use tabletop_domain::credentials::{is_valid_email, normalize_email};
use tabletop_domain::role::UserRole;

use crate::config::TokenSettings;
use crate::domain::repository::{OrderRepository, UserRepository};
use crate::domain::types::{NewUser, Order, User, UserPatch};
use crate::error::ApiError;

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

// ── CustomerLogin ────────────────────────────────────────────────────────────

pub struct CustomerLoginInput {
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug)]
pub struct CustomerLoginOutput {
    pub customer: User,
    pub token: IssuedToken,
    /// `true` when the email was registered by this call.
    pub created: bool,
}

/// Passwordless storefront sign-in: known customers log in, unknown emails register.
pub struct CustomerLoginUseCase<U: UserRepository> {
    pub users: U,
    pub tokens: TokenSettings,
}

impl<U: UserRepository> CustomerLoginUseCase<U> {
    pub async fn execute(&self, input: CustomerLoginInput) -> Result<CustomerLoginOutput, ApiError> {
        let email = normalize_email(&input.email);
        if email.is_empty() {
            return Err(ApiError::validation("email is required"));
        }
        if !is_valid_email(&email) {
            return Err(ApiError::InvalidEmail);
        }
        let name = non_empty(input.name);
        let phone = non_empty(input.phone);

        let (customer, created) = match self.users.find_by_email(&email).await? {
            Some(user) if user.role != UserRole::Customer => return Err(ApiError::EmailExists),
            Some(user) if !user.is_active => return Err(ApiError::AccountDisabled),
            Some(user) => {
                let refreshed = if name.is_some() || phone.is_some() {
                    self.users
                        .update(
                            user.id,
                            &UserPatch {
                                name,
                                phone,
                                ..Default::default()
                            },
                        )
                        .await?
                } else {
                    user
                };
                (refreshed, false)
            }
            None => {
                let name = name.ok_or_else(|| ApiError::validation("name is required"))?;
                let created = self
                    .users
                    .create(&NewUser {
                        name,
                        email,
                        phone,
                        password_hash: None,
                        role: UserRole::Customer,
                        must_change_password: false,
                    })
                    .await?;
                info!(customer_id = created.id, "customer registered");
                (created, true)
            }
        };

        let token = issue_customer_token(
            customer.id,
            &customer.email,
            &customer.name,
            &self.tokens.access_secret,
            self.tokens.customer_ttl_secs,
        )?;
        Ok(CustomerLoginOutput {
            customer,
            token,
            created,
        })
    }
}

/// Customer that an order is attributed to.
///
/// Existing customers are reused as-is; an email held by a console account places the
/// order as a guest. Unknown emails are registered as customers.
pub(crate) async fn find_or_register_customer<U: UserRepository>(
    users: &U,
    email: &str,
    name: &str,
    phone: Option<&str>,
) -> Result<Option<User>, ApiError> {
    match users.find_by_email(email).await? {
        Some(user) if user.role == UserRole::Customer => Ok(Some(user)),
        Some(_) => Ok(None),
        None => {
            let created = users
                .create(&NewUser {
                    name: name.to_owned(),
                    email: email.to_owned(),
                    phone: phone.map(str::to_owned),
                    password_hash: None,
                    role: UserRole::Customer,
                    must_change_password: false,
                })
                .await?;
            info!(customer_id = created.id, "customer registered at checkout");
            Ok(Some(created))
        }
    }
}

// ── CustomerOrders ───────────────────────────────────────────────────────────

pub struct CustomerOrdersUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> CustomerOrdersUseCase<O> {
    /// Newest first.
    pub async fn execute(&self, customer_id: i64) -> Result<Vec<Order>, ApiError> {
        self.orders.list_for_customer(customer_id).await
    }
}
