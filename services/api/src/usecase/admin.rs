use rust_decimal::Decimal;
use tracing::info;

use tabletop_domain::credentials::{is_valid_email, normalize_email};
use tabletop_domain::merchant::normalize_merchant_code;
use tabletop_domain::pagination::{PageRequest, Paginated};
use tabletop_domain::role::UserRole;

use crate::domain::repository::{MerchantRepository, SessionRepository, UserRepository};
use crate::domain::types::{Merchant, MerchantPatch, NewMerchant, NewUser, User, UserPatch};
use crate::error::ApiError;
use crate::infra::password::{generate_temp_password, spawn_hash_password};
use crate::usecase::auth_context::AuthContext;
use crate::usecase::merchant::{check_rate, update_merchant};

pub const DEFAULT_CURRENCY: &str = "AUD";

fn required(value: &str, message: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ApiError::validation(message))
    } else {
        Ok(trimmed.to_owned())
    }
}

// ── ListMerchants ────────────────────────────────────────────────────────────

pub struct ListMerchantsUseCase<M: MerchantRepository> {
    pub merchants: M,
}

impl<M: MerchantRepository> ListMerchantsUseCase<M> {
    pub async fn execute(&self, active_only: bool) -> Result<Vec<Merchant>, ApiError> {
        self.merchants.list(active_only).await
    }
}

// ── CreateMerchant ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct CreateMerchantInput {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub currency: Option<String>,
    pub tax_rate: Option<Decimal>,
    pub tax_included: Option<bool>,
    pub service_charge_rate: Option<Decimal>,
    pub owner_name: String,
    pub owner_email: String,
    pub owner_phone: Option<String>,
}

#[derive(Debug)]
pub struct CreateMerchantOutput {
    pub merchant: Merchant,
    pub owner: User,
    /// Shown once; the owner must replace it on first sign-in.
    pub temp_password: String,
}

pub struct CreateMerchantUseCase<M: MerchantRepository, U: UserRepository> {
    pub merchants: M,
    pub users: U,
}

impl<M: MerchantRepository, U: UserRepository> CreateMerchantUseCase<M, U> {
    pub async fn execute(&self, input: CreateMerchantInput) -> Result<CreateMerchantOutput, ApiError> {
        let name = required(&input.name, "merchant name is required")?;
        let code = normalize_merchant_code(&input.code)
            .ok_or_else(|| ApiError::validation("merchant code must be 3-20 letters or digits"))?;
        let owner_name = required(&input.owner_name, "owner name and email are required")?;
        let owner_email = normalize_email(&required(
            &input.owner_email,
            "owner name and email are required",
        )?);
        if !is_valid_email(&owner_email) {
            return Err(ApiError::InvalidEmail);
        }
        let email = match input.email.as_deref().map(normalize_email) {
            Some(e) if e.is_empty() => None,
            Some(e) if !is_valid_email(&e) => return Err(ApiError::InvalidEmail),
            other => other,
        };
        check_rate("taxRate", input.tax_rate)?;
        check_rate("serviceChargeRate", input.service_charge_rate)?;

        if self.merchants.find_by_code(&code).await?.is_some() {
            return Err(ApiError::MerchantCodeExists);
        }
        if self.users.find_by_email(&owner_email).await?.is_some() {
            return Err(ApiError::EmailExists);
        }

        let temp_password = generate_temp_password();
        let password_hash = spawn_hash_password(&temp_password).await?;

        let (merchant, owner) = self
            .merchants
            .create_with_owner(
                &NewMerchant {
                    code,
                    name,
                    description: input.description,
                    address: input.address,
                    phone: input.phone,
                    email,
                    currency: input
                        .currency
                        .map(|c| c.trim().to_uppercase())
                        .filter(|c| !c.is_empty())
                        .unwrap_or_else(|| DEFAULT_CURRENCY.to_owned()),
                    tax_rate: input.tax_rate.unwrap_or_default(),
                    tax_included: input.tax_included.unwrap_or(false),
                    service_charge_rate: input.service_charge_rate.unwrap_or_default(),
                },
                &NewUser {
                    name: owner_name,
                    email: owner_email,
                    phone: input.owner_phone,
                    password_hash: Some(password_hash),
                    role: UserRole::MerchantOwner,
                    must_change_password: true,
                },
            )
            .await?;

        info!(
            merchant_id = merchant.id,
            merchant_code = %merchant.code,
            owner_id = owner.id,
            owner_email = %owner.email,
            "merchant created; owner must set a password on first sign-in"
        );
        Ok(CreateMerchantOutput {
            merchant,
            owner,
            temp_password,
        })
    }
}

// ── GetMerchant ──────────────────────────────────────────────────────────────

pub struct GetMerchantUseCase<M: MerchantRepository> {
    pub merchants: M,
}

impl<M: MerchantRepository> GetMerchantUseCase<M> {
    pub async fn execute(&self, id: i64) -> Result<Merchant, ApiError> {
        self.merchants
            .find_by_id(id)
            .await?
            .ok_or(ApiError::MerchantNotFound)
    }
}

// ── UpdateMerchant ───────────────────────────────────────────────────────────

pub struct UpdateMerchantUseCase<M: MerchantRepository> {
    pub merchants: M,
}

impl<M: MerchantRepository> UpdateMerchantUseCase<M> {
    pub async fn execute(&self, id: i64, patch: MerchantPatch) -> Result<Merchant, ApiError> {
        let merchant = update_merchant(&self.merchants, id, patch).await?;
        info!(merchant_id = merchant.id, "merchant updated");
        Ok(merchant)
    }
}

// ── ToggleMerchant ───────────────────────────────────────────────────────────

pub struct ToggleMerchantUseCase<M: MerchantRepository> {
    pub merchants: M,
}

impl<M: MerchantRepository> ToggleMerchantUseCase<M> {
    /// Flip `is_active` and return the updated merchant.
    pub async fn execute(&self, id: i64) -> Result<Merchant, ApiError> {
        let merchant = self
            .merchants
            .find_by_id(id)
            .await?
            .ok_or(ApiError::MerchantNotFound)?;
        let updated = self.merchants.set_active(id, !merchant.is_active).await?;
        info!(merchant_id = id, is_active = updated.is_active, "merchant active state toggled");
        Ok(updated)
    }
}

// ── ListUsers ────────────────────────────────────────────────────────────────

pub struct ListUsersUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ListUsersUseCase<U> {
    pub async fn execute(
        &self,
        role: Option<UserRole>,
        page: PageRequest,
    ) -> Result<Paginated<User>, ApiError> {
        let page = page.clamped();
        let (items, total) = self.users.list(role, page).await?;
        Ok(Paginated::new(items, page, total))
    }
}

// ── GetUser ──────────────────────────────────────────────────────────────────

pub struct GetUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> GetUserUseCase<U> {
    pub async fn execute(&self, id: i64) -> Result<User, ApiError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(ApiError::UserNotFound)
    }
}

// ── UpdateUser ───────────────────────────────────────────────────────────────

pub struct UpdateUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> UpdateUserUseCase<U> {
    pub async fn execute(&self, id: i64, mut patch: UserPatch) -> Result<User, ApiError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(ApiError::UserNotFound)?;

        if let Some(name) = patch.name.take() {
            patch.name = Some(required(&name, "name must not be empty")?);
        }
        if let Some(email) = patch.email.take() {
            let email = normalize_email(&email);
            if !is_valid_email(&email) {
                return Err(ApiError::InvalidEmail);
            }
            if let Some(existing) = self.users.find_by_email(&email).await? {
                if existing.id != id {
                    return Err(ApiError::EmailExists);
                }
            }
            patch.email = Some(email);
        }

        let user = self.users.update(id, &patch).await?;
        info!(user_id = id, "user updated");
        Ok(user)
    }
}

// ── DeleteUser ───────────────────────────────────────────────────────────────

pub struct DeleteUserUseCase<U: UserRepository, S: SessionRepository> {
    pub users: U,
    pub sessions: S,
}

impl<U: UserRepository, S: SessionRepository> DeleteUserUseCase<U, S> {
    /// Deactivate the user and end every session they hold.
    pub async fn execute(&self, actor: &AuthContext, id: i64) -> Result<(), ApiError> {
        if actor.user_id == id {
            return Err(ApiError::validation("you cannot delete your own account"));
        }
        self.users
            .find_by_id(id)
            .await?
            .ok_or(ApiError::UserNotFound)?;

        self.users
            .update(
                id,
                &UserPatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await?;
        let revoked = self.sessions.revoke_all(id, None).await?;
        info!(user_id = id, actor_id = actor.user_id, revoked, "user deactivated");
        Ok(())
    }
}

// ── SeedAdmin ────────────────────────────────────────────────────────────────

pub struct SeedAdminInput {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Bootstrap a `SUPER_ADMIN`. Re-running with an existing email leaves the user untouched.
pub struct SeedAdminUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> SeedAdminUseCase<U> {
    /// Returns the admin and whether it was created by this call.
    pub async fn execute(&self, input: SeedAdminInput) -> Result<(User, bool), ApiError> {
        let email = normalize_email(&input.email);
        if !is_valid_email(&email) {
            return Err(ApiError::InvalidEmail);
        }
        if let Some(existing) = self.users.find_by_email(&email).await? {
            info!(user_id = existing.id, "super admin already present");
            return Ok((existing, false));
        }
        let name = required(&input.name, "admin name is required")?;
        required(&input.password, "admin password is required")?;

        let user = self
            .users
            .create(&NewUser {
                name,
                email,
                phone: None,
                password_hash: Some(spawn_hash_password(&input.password).await?),
                role: UserRole::SuperAdmin,
                must_change_password: false,
            })
            .await?;
        info!(user_id = user.id, "super admin created");
        Ok((user, true))
    }
}
