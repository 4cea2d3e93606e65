//! JSON shapes shared by several handler modules.
//!
//! Ids are rendered as strings, timestamps as RFC 3339 with milliseconds and money as
//! JSON numbers.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use tabletop_domain::order::{OrderStatus, OrderType};
use tabletop_domain::pagination::{PageMeta, Paginated};
use tabletop_domain::role::{MerchantRole, UserRole};
use tabletop_domain::session::SessionStatus;

use crate::domain::types::{
    AddonCategory, AddonItem, Menu, MenuAddonLink, MenuCategory, MerchantLink, Merchant, Order,
    OrderDetail, OrderItem, OrderItemAddon, Session, StatusChange, User,
};
use crate::usecase::catalog::{AddonCategoryView, MenuView};

// ── Users ────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(serialize_with = "tabletop_core::serde::id_to_string")]
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub must_change_password: bool,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "tabletop_core::serde::id_to_string_opt"
    )]
    pub merchant_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_role: Option<MerchantRole>,
    #[serde(serialize_with = "tabletop_core::serde::to_rfc3339_ms_opt")]
    pub last_login_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "tabletop_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "tabletop_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn with_merchant(user: User, link: Option<MerchantLink>) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            is_active: user.is_active,
            must_change_password: user.must_change_password,
            merchant_id: link.map(|l| l.merchant_id),
            merchant_role: link.map(|l| l.role),
            last_login_at: user.last_login_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self::with_merchant(user, None)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[serde(serialize_with = "tabletop_core::serde::id_to_string")]
    pub id: i64,
    pub status: SessionStatus,
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
    pub is_current: bool,
    #[serde(serialize_with = "tabletop_core::serde::to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
    #[serde(serialize_with = "tabletop_core::serde::to_rfc3339_ms")]
    pub last_activity_at: DateTime<Utc>,
    #[serde(serialize_with = "tabletop_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl SessionResponse {
    pub fn new(session: Session, current_session_id: i64) -> Self {
        Self {
            id: session.id,
            status: session.status,
            device_info: session.device_info,
            ip_address: session.ip_address,
            is_current: session.id == current_session_id,
            expires_at: session.expires_at,
            last_activity_at: session.last_activity_at,
            created_at: session.created_at,
        }
    }
}

/// Page metadata rendered next to a list.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl From<PageMeta> for PaginationResponse {
    fn from(meta: PageMeta) -> Self {
        Self {
            page: meta.page,
            limit: meta.limit,
            total: meta.total,
            total_pages: meta.total_pages,
        }
    }
}

/// Split a page into rendered items and its metadata.
pub fn page_parts<T, U>(page: Paginated<T>, f: impl FnMut(T) -> U) -> (Vec<U>, PaginationResponse) {
    let page = page.map(f);
    (page.items, page.meta.into())
}

// ── Merchants ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantResponse {
    #[serde(serialize_with = "tabletop_core::serde::id_to_string")]
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_rate: Decimal,
    pub tax_included: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub service_charge_rate: Decimal,
    pub is_active: bool,
    pub is_open: bool,
    #[serde(serialize_with = "tabletop_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "tabletop_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<Merchant> for MerchantResponse {
    fn from(m: Merchant) -> Self {
        Self {
            id: m.id,
            code: m.code,
            name: m.name,
            description: m.description,
            address: m.address,
            phone: m.phone,
            email: m.email,
            currency: m.currency,
            tax_rate: m.tax_rate,
            tax_included: m.tax_included,
            service_charge_rate: m.service_charge_rate,
            is_active: m.is_active,
            is_open: m.is_open,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

// ── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    #[serde(serialize_with = "tabletop_core::serde::id_to_string")]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    #[serde(serialize_with = "tabletop_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "tabletop_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<MenuCategory> for CategoryResponse {
    fn from(c: MenuCategory) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            sort_order: c.sort_order,
            is_active: c.is_active,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuResponse {
    #[serde(serialize_with = "tabletop_core::serde::id_to_string")]
    pub id: i64,
    #[serde(serialize_with = "tabletop_core::serde::id_to_string_opt")]
    pub category_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub promo_price: Option<Decimal>,
    pub is_promo: bool,
    /// Price a customer pays right now.
    #[serde(with = "rust_decimal::serde::float")]
    pub effective_price: Decimal,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub track_stock: bool,
    pub stock_qty: Option<i32>,
    #[serde(serialize_with = "tabletop_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "tabletop_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<Menu> for MenuResponse {
    fn from(m: Menu) -> Self {
        Self {
            id: m.id,
            category_id: m.category_id,
            effective_price: m.unit_price(),
            name: m.name,
            description: m.description,
            price: m.price,
            promo_price: m.promo_price,
            is_promo: m.is_promo,
            image_url: m.image_url,
            is_active: m.is_active,
            track_stock: m.track_stock,
            stock_qty: m.stock_qty,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonLinkResponse {
    #[serde(serialize_with = "tabletop_core::serde::id_to_string")]
    pub menu_id: i64,
    #[serde(serialize_with = "tabletop_core::serde::id_to_string")]
    pub addon_category_id: i64,
    pub is_required: bool,
    pub display_order: i32,
}

impl From<MenuAddonLink> for AddonLinkResponse {
    fn from(l: MenuAddonLink) -> Self {
        Self {
            menu_id: l.menu_id,
            addon_category_id: l.addon_category_id,
            is_required: l.is_required,
            display_order: l.display_order,
        }
    }
}

/// Dashboard menu with its category set and addon links.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuDetailResponse {
    #[serde(flatten)]
    pub menu: MenuResponse,
    #[serde(serialize_with = "tabletop_core::serde::ids_to_strings")]
    pub category_ids: Vec<i64>,
    pub addon_categories: Vec<AddonLinkResponse>,
}

impl From<MenuView> for MenuDetailResponse {
    fn from(v: MenuView) -> Self {
        Self {
            menu: v.menu.into(),
            category_ids: v.category_ids,
            addon_categories: v.addon_links.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonItemResponse {
    #[serde(serialize_with = "tabletop_core::serde::id_to_string")]
    pub id: i64,
    #[serde(serialize_with = "tabletop_core::serde::id_to_string")]
    pub addon_category_id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub is_active: bool,
    pub track_stock: bool,
    pub stock_qty: Option<i32>,
    #[serde(serialize_with = "tabletop_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "tabletop_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<AddonItem> for AddonItemResponse {
    fn from(i: AddonItem) -> Self {
        Self {
            id: i.id,
            addon_category_id: i.addon_category_id,
            name: i.name,
            description: i.description,
            price: i.price,
            is_active: i.is_active,
            track_stock: i.track_stock,
            stock_qty: i.stock_qty,
            created_at: i.created_at,
            updated_at: i.updated_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonCategoryResponse {
    #[serde(serialize_with = "tabletop_core::serde::id_to_string")]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub min_selection: i32,
    pub max_selection: Option<i32>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<AddonItemResponse>>,
    #[serde(serialize_with = "tabletop_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "tabletop_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl AddonCategoryResponse {
    pub fn with_items(c: AddonCategory, items: Option<Vec<AddonItem>>) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            min_selection: c.min_selection,
            max_selection: c.max_selection,
            is_active: c.is_active,
            items: items.map(|items| items.into_iter().map(Into::into).collect()),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

impl From<AddonCategory> for AddonCategoryResponse {
    fn from(c: AddonCategory) -> Self {
        Self::with_items(c, None)
    }
}

impl From<AddonCategoryView> for AddonCategoryResponse {
    fn from(v: AddonCategoryView) -> Self {
        Self::with_items(v.category, Some(v.items))
    }
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(serialize_with = "tabletop_core::serde::id_to_string")]
    pub id: i64,
    #[serde(serialize_with = "tabletop_core::serde::id_to_string")]
    pub merchant_id: i64,
    #[serde(serialize_with = "tabletop_core::serde::id_to_string_opt")]
    pub customer_id: Option<i64>,
    pub order_number: String,
    pub order_type: OrderType,
    pub table_number: Option<String>,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub service_fee_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(serialize_with = "tabletop_core::serde::to_rfc3339_ms")]
    pub placed_at: DateTime<Utc>,
    #[serde(serialize_with = "tabletop_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
    #[serde(serialize_with = "tabletop_core::serde::to_rfc3339_ms_opt")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            merchant_id: o.merchant_id,
            customer_id: o.customer_id,
            order_number: o.order_number,
            order_type: o.order_type,
            table_number: o.table_number,
            status: o.status,
            status_label: o.status.label(),
            customer_name: o.customer_name,
            customer_email: o.customer_email,
            customer_phone: o.customer_phone,
            notes: o.notes,
            subtotal: o.subtotal,
            tax_amount: o.tax_amount,
            service_fee_amount: o.service_fee_amount,
            total_amount: o.total_amount,
            placed_at: o.placed_at,
            updated_at: o.updated_at,
            completed_at: o.completed_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemAddonResponse {
    #[serde(serialize_with = "tabletop_core::serde::id_to_string")]
    pub id: i64,
    #[serde(serialize_with = "tabletop_core::serde::id_to_string")]
    pub addon_item_id: i64,
    pub addon_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
}

impl From<OrderItemAddon> for OrderItemAddonResponse {
    fn from(a: OrderItemAddon) -> Self {
        Self {
            id: a.id,
            addon_item_id: a.addon_item_id,
            addon_name: a.addon_name,
            unit_price: a.unit_price,
            quantity: a.quantity,
            subtotal: a.subtotal,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    #[serde(serialize_with = "tabletop_core::serde::id_to_string")]
    pub id: i64,
    #[serde(serialize_with = "tabletop_core::serde::id_to_string")]
    pub menu_id: i64,
    pub menu_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    pub notes: Option<String>,
    pub addons: Vec<OrderItemAddonResponse>,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(i: OrderItem) -> Self {
        Self {
            id: i.id,
            menu_id: i.menu_id,
            menu_name: i.menu_name,
            unit_price: i.unit_price,
            quantity: i.quantity,
            subtotal: i.subtotal,
            notes: i.notes,
            addons: i.addons.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeResponse {
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub note: Option<String>,
    #[serde(serialize_with = "tabletop_core::serde::id_to_string_opt")]
    pub changed_by_user_id: Option<i64>,
    #[serde(serialize_with = "tabletop_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<StatusChange> for StatusChangeResponse {
    fn from(c: StatusChange) -> Self {
        Self {
            from_status: c.from_status,
            to_status: c.to_status,
            note: c.note,
            changed_by_user_id: c.changed_by_user_id,
            created_at: c.created_at,
        }
    }
}

/// Order with its lines and status history.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub order_type_label: &'static str,
    pub items: Vec<OrderItemResponse>,
    pub status_history: Vec<StatusChangeResponse>,
}

impl From<OrderDetail> for OrderDetailResponse {
    fn from(d: OrderDetail) -> Self {
        Self {
            order_type_label: d.order.order_type.label(),
            order: d.order.into(),
            items: d.items.into_iter().map(Into::into).collect(),
            status_history: d.history.into_iter().map(Into::into).collect(),
        }
    }
}

/// Serialize a calendar date as `YYYY-MM-DD`.
pub fn date_string<S: serde::Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&date.format("%Y-%m-%d"))
}
