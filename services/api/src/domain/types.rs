use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use tabletop_domain::order::{OrderStatus, OrderType};
use tabletop_domain::pricing::{ChargePolicy, OrderTotals, effective_unit_price};
use tabletop_domain::role::{MerchantRole, UserRole};
use tabletop_domain::session::{SessionState, SessionStatus, session_state};

// ── Users & sessions ─────────────────────────────────────────────────────────

/// Console user or storefront customer.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// `None` for customers, who never sign in with a password.
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub must_change_password: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub must_change_password: bool,
}

/// Partial user update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

/// The merchant a console user works for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MerchantLink {
    pub merchant_id: i64,
    pub role: MerchantRole,
}

/// Server-side record backing one access/refresh token pair.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub refresh_token: String,
    pub status: SessionStatus,
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn state(&self, now: DateTime<Utc>) -> SessionState {
        session_state(self.status, self.expires_at, now)
    }
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: i64,
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Signed tokens stored on a session row.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub token: String,
    pub refresh_token: String,
}

// ── Merchants ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Merchant {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub currency: String,
    pub tax_rate: Decimal,
    pub tax_included: bool,
    pub service_charge_rate: Decimal,
    pub is_active: bool,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Merchant {
    pub fn charge_policy(&self) -> ChargePolicy {
        ChargePolicy {
            tax_rate: self.tax_rate,
            tax_included: self.tax_included,
            service_charge_rate: self.service_charge_rate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewMerchant {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub currency: String,
    pub tax_rate: Decimal,
    pub tax_included: bool,
    pub service_charge_rate: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct MerchantPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub currency: Option<String>,
    pub tax_rate: Option<Decimal>,
    pub tax_included: Option<bool>,
    pub service_charge_rate: Option<Decimal>,
}

// ── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MenuCategory {
    pub id: i64,
    pub merchant_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Menu {
    pub id: i64,
    pub merchant_id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub promo_price: Option<Decimal>,
    pub is_promo: bool,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub track_stock: bool,
    pub stock_qty: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Menu {
    pub fn unit_price(&self) -> Decimal {
        effective_unit_price(self.price, self.promo_price, self.is_promo)
    }
}

#[derive(Debug, Clone)]
pub struct NewMenu {
    pub category_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub promo_price: Option<Decimal>,
    pub is_promo: bool,
    pub image_url: Option<String>,
    pub track_stock: bool,
    pub stock_qty: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct MenuPatch {
    pub category_id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub promo_price: Option<Decimal>,
    pub is_promo: Option<bool>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
    pub track_stock: Option<bool>,
    pub stock_qty: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct AddonCategory {
    pub id: i64,
    pub merchant_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub min_selection: i32,
    pub max_selection: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAddonCategory {
    pub name: String,
    pub description: Option<String>,
    pub min_selection: i32,
    pub max_selection: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct AddonCategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub min_selection: Option<i32>,
    /// `Some(None)` clears the limit.
    pub max_selection: Option<Option<i32>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct AddonItem {
    pub id: i64,
    pub addon_category_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_active: bool,
    pub track_stock: bool,
    pub stock_qty: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAddonItem {
    pub addon_category_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub track_stock: bool,
    pub stock_qty: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct AddonItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
    pub track_stock: Option<bool>,
    pub stock_qty: Option<i32>,
}

/// Addon category attached to a menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuAddonLink {
    pub menu_id: i64,
    pub addon_category_id: i64,
    pub is_required: bool,
    pub display_order: i32,
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Order {
    pub id: i64,
    pub merchant_id: i64,
    pub customer_id: Option<i64>,
    pub order_number: String,
    pub order_type: OrderType,
    pub table_number: Option<String>,
    pub status: OrderStatus,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub service_fee_amount: Decimal,
    pub total_amount: Decimal,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_id: i64,
    pub menu_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
    pub notes: Option<String>,
    pub stock_taken: bool,
    pub addons: Vec<OrderItemAddon>,
}

#[derive(Debug, Clone)]
pub struct OrderItemAddon {
    pub id: i64,
    pub order_item_id: i64,
    pub addon_item_id: i64,
    pub addon_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
    pub stock_taken: bool,
}

#[derive(Debug, Clone)]
pub struct StatusChange {
    pub id: i64,
    pub order_id: i64,
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub note: Option<String>,
    pub changed_by_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Order with its lines and status history.
#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub history: Vec<StatusChange>,
}

/// Fully priced order ready to persist.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub merchant_id: i64,
    pub customer_id: Option<i64>,
    pub order_number: String,
    pub order_type: OrderType,
    pub table_number: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    pub totals: OrderTotals,
    pub items: Vec<NewOrderItem>,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub menu_id: i64,
    pub menu_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub subtotal: Decimal,
    pub notes: Option<String>,
    pub track_stock: bool,
    pub addons: Vec<NewOrderItemAddon>,
}

#[derive(Debug, Clone)]
pub struct NewOrderItemAddon {
    pub addon_item_id: i64,
    pub addon_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub subtotal: Decimal,
    pub track_stock: bool,
}

/// A validated status change to apply.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub order_id: i64,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub note: Option<String>,
    pub changed_by: i64,
    pub at: DateTime<Utc>,
}

/// One completed order counted towards revenue.
#[derive(Debug, Clone, Copy)]
pub struct RevenueEntry {
    pub placed_at: DateTime<Utc>,
    pub total_amount: Decimal,
}
