//! Order money arithmetic.
//!
//! All amounts are `Decimal`; each reported component is rounded half away from zero to
//! two decimal places and the total is the sum of the rounded components.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Unit price charged for a menu: the promo price while a promotion is running.
pub fn effective_unit_price(price: Decimal, promo_price: Option<Decimal>, is_promo: bool) -> Decimal {
    match promo_price {
        Some(promo) if is_promo => promo,
        _ => price,
    }
}

/// `(unit_price + sum(addon prices)) * quantity`
pub fn line_subtotal(unit_price: Decimal, addon_prices: &[Decimal], quantity: u32) -> Decimal {
    let addons: Decimal = addon_prices.iter().copied().sum();
    round_money((unit_price + addons) * Decimal::from(quantity))
}

/// Merchant tax and service charge settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargePolicy {
    /// Tax rate in percent.
    pub tax_rate: Decimal,
    /// When set, menu prices already contain the tax.
    pub tax_included: bool,
    /// Service charge in percent of the subtotal.
    pub service_charge_rate: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub service_fee_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
}

impl ChargePolicy {
    pub fn totals(&self, subtotal: Decimal) -> OrderTotals {
        let subtotal = round_money(subtotal);
        let rate = self.tax_rate / Decimal::ONE_HUNDRED;
        let tax_amount = if self.tax_included {
            round_money(subtotal - subtotal / (Decimal::ONE + rate))
        } else {
            round_money(subtotal * rate)
        };
        let service_fee_amount =
            round_money(subtotal * self.service_charge_rate / Decimal::ONE_HUNDRED);
        let total_amount = if self.tax_included {
            subtotal + service_fee_amount
        } else {
            subtotal + tax_amount + service_fee_amount
        };
        OrderTotals {
            subtotal,
            tax_amount,
            service_fee_amount,
            total_amount,
        }
    }
}
