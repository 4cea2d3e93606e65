use rust_decimal::Decimal;
use tracing::info;

use tabletop_domain::credentials::{is_valid_email, normalize_email};
use tabletop_domain::merchant::normalize_merchant_code;

use crate::domain::repository::MerchantRepository;
use crate::domain::types::{Merchant, MerchantPatch};
use crate::error::ApiError;
use crate::usecase::auth_context::MerchantScope;

/// Percentages are accepted in `0..=100`.
pub(crate) fn check_rate(field: &str, rate: Option<Decimal>) -> Result<(), ApiError> {
    match rate {
        Some(r) if r < Decimal::ZERO || r > Decimal::ONE_HUNDRED => Err(ApiError::validation(
            format!("{field} must be between 0 and 100"),
        )),
        _ => Ok(()),
    }
}

/// Validate and normalize a merchant patch, then apply it.
pub(crate) async fn update_merchant<M: MerchantRepository>(
    merchants: &M,
    id: i64,
    mut patch: MerchantPatch,
) -> Result<Merchant, ApiError> {
    merchants
        .find_by_id(id)
        .await?
        .ok_or(ApiError::MerchantNotFound)?;

    if let Some(name) = &patch.name {
        if name.trim().is_empty() {
            return Err(ApiError::validation("name must not be empty"));
        }
    }
    if let Some(raw) = patch.code.take() {
        let code = normalize_merchant_code(&raw).ok_or_else(|| {
            ApiError::validation("merchant code must be 3-20 letters or digits")
        })?;
        if let Some(existing) = merchants.find_by_code(&code).await? {
            if existing.id != id {
                return Err(ApiError::MerchantCodeExists);
            }
        }
        patch.code = Some(code);
    }
    if let Some(email) = patch.email.take() {
        let email = normalize_email(&email);
        if !is_valid_email(&email) {
            return Err(ApiError::InvalidEmail);
        }
        patch.email = Some(email);
    }
    check_rate("taxRate", patch.tax_rate)?;
    check_rate("serviceChargeRate", patch.service_charge_rate)?;

    merchants.update(id, &patch).await
}

// ── GetProfile ───────────────────────────────────────────────────────────────

pub struct GetProfileUseCase<M: MerchantRepository> {
    pub merchants: M,
}

impl<M: MerchantRepository> GetProfileUseCase<M> {
    pub async fn execute(&self, scope: &MerchantScope) -> Result<Merchant, ApiError> {
        self.merchants
            .find_by_id(scope.merchant_id)
            .await?
            .ok_or(ApiError::MerchantNotFound)
    }
}

// ── UpdateProfile ────────────────────────────────────────────────────────────

pub struct UpdateProfileUseCase<M: MerchantRepository> {
    pub merchants: M,
}

impl<M: MerchantRepository> UpdateProfileUseCase<M> {
    /// Owners only. The merchant code is managed by super admins and is ignored here.
    pub async fn execute(
        &self,
        scope: &MerchantScope,
        mut patch: MerchantPatch,
    ) -> Result<Merchant, ApiError> {
        scope.require_owner()?;
        patch.code = None;
        let merchant = update_merchant(&self.merchants, scope.merchant_id, patch).await?;
        info!(merchant_id = merchant.id, user_id = scope.ctx.user_id, "merchant profile updated");
        Ok(merchant)
    }
}

// ── ToggleOpen ───────────────────────────────────────────────────────────────

pub struct ToggleOpenUseCase<M: MerchantRepository> {
    pub merchants: M,
}

impl<M: MerchantRepository> ToggleOpenUseCase<M> {
    pub async fn execute(&self, scope: &MerchantScope, is_open: bool) -> Result<Merchant, ApiError> {
        scope.require_owner()?;
        let merchant = self.merchants.set_open(scope.merchant_id, is_open).await?;
        info!(merchant_id = merchant.id, is_open, "store open state changed");
        Ok(merchant)
    }
}
