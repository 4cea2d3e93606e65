#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};

use tabletop_domain::order::OrderStatus;
use tabletop_domain::pagination::PageRequest;
use tabletop_domain::role::UserRole;

use crate::domain::types::{
    AddonCategory, AddonCategoryPatch, AddonItem, AddonItemPatch, CategoryPatch, Menu,
    MenuAddonLink, MenuCategory, MenuPatch, Merchant, MerchantLink, MerchantPatch, NewAddonCategory,
    NewAddonItem, NewCategory, NewMenu, NewMerchant, NewOrder, NewSession, NewUser, Order,
    OrderDetail, RevenueEntry, Session, SessionTokens, StatusUpdate, User, UserPatch,
};
use crate::error::ApiError;

/// Repository for console users and storefront customers.
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, ApiError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;
    async fn create(&self, user: &NewUser) -> Result<User, ApiError>;
    async fn update(&self, id: i64, patch: &UserPatch) -> Result<User, ApiError>;
    async fn update_password(
        &self,
        id: i64,
        password_hash: &str,
        must_change_password: bool,
    ) -> Result<(), ApiError>;
    async fn touch_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), ApiError>;
    /// One page of users, newest first, plus the total count.
    async fn list(
        &self,
        role: Option<UserRole>,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64), ApiError>;
    async fn merchant_link(&self, user_id: i64) -> Result<Option<MerchantLink>, ApiError>;
}

/// Repository for staff sessions.
pub trait SessionRepository: Send + Sync {
    /// Insert an `ACTIVE` session, sign its tokens with `sign` once the id is known, and
    /// store them. All of it commits together: if `sign` or the token write fails, no row
    /// is left behind.
    async fn create<T, F>(&self, session: &NewSession, sign: F) -> Result<(Session, T), ApiError>
    where
        T: Send,
        F: FnOnce(i64) -> Result<(SessionTokens, T), ApiError> + Send;
    async fn set_tokens(
        &self,
        id: i64,
        token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), ApiError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Session>, ApiError>;
    async fn touch(&self, id: i64, at: DateTime<Utc>) -> Result<(), ApiError>;
    /// `ACTIVE`, unexpired sessions of a user, most recent activity first.
    async fn list_active(&self, user_id: i64, now: DateTime<Utc>)
    -> Result<Vec<Session>, ApiError>;
    /// Returns `true` if an active session was revoked.
    async fn revoke(&self, id: i64) -> Result<bool, ApiError>;
    /// Revoke every active session of a user except `keep`. Returns the count revoked.
    async fn revoke_all(&self, user_id: i64, keep: Option<i64>) -> Result<u64, ApiError>;
}

/// Repository for merchants (tenants).
pub trait MerchantRepository: Send + Sync {
    async fn list(&self, active_only: bool) -> Result<Vec<Merchant>, ApiError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Merchant>, ApiError>;
    async fn find_by_code(&self, code: &str) -> Result<Option<Merchant>, ApiError>;
    /// Create the merchant, its owner user and the `OWNER` link atomically.
    async fn create_with_owner(
        &self,
        merchant: &NewMerchant,
        owner: &NewUser,
    ) -> Result<(Merchant, User), ApiError>;
    async fn update(&self, id: i64, patch: &MerchantPatch) -> Result<Merchant, ApiError>;
    async fn set_active(&self, id: i64, is_active: bool) -> Result<Merchant, ApiError>;
    async fn set_open(&self, id: i64, is_open: bool) -> Result<Merchant, ApiError>;
}

/// Repository for menu categories. Soft-deleted rows are never returned.
pub trait CategoryRepository: Send + Sync {
    /// Categories ordered by `sort_order`, then name.
    async fn list(&self, merchant_id: i64, active_only: bool)
    -> Result<Vec<MenuCategory>, ApiError>;
    async fn find(&self, merchant_id: i64, id: i64) -> Result<Option<MenuCategory>, ApiError>;
    async fn find_many(&self, merchant_id: i64, ids: &[i64])
    -> Result<Vec<MenuCategory>, ApiError>;
    async fn create(&self, merchant_id: i64, category: &NewCategory)
    -> Result<MenuCategory, ApiError>;
    async fn update(&self, id: i64, patch: &CategoryPatch) -> Result<MenuCategory, ApiError>;
    async fn soft_delete(&self, id: i64, at: DateTime<Utc>) -> Result<(), ApiError>;
}

/// Repository for menus and their category / addon-category links.
pub trait MenuRepository: Send + Sync {
    async fn list(&self, merchant_id: i64, active_only: bool) -> Result<Vec<Menu>, ApiError>;
    async fn find(&self, merchant_id: i64, id: i64) -> Result<Option<Menu>, ApiError>;
    async fn find_many(&self, merchant_id: i64, ids: &[i64]) -> Result<Vec<Menu>, ApiError>;
    async fn create(&self, merchant_id: i64, menu: &NewMenu) -> Result<Menu, ApiError>;
    async fn update(&self, id: i64, patch: &MenuPatch) -> Result<Menu, ApiError>;
    async fn soft_delete(&self, id: i64, at: DateTime<Utc>) -> Result<(), ApiError>;
    /// `(menu_id, category_id)` pairs from the many-to-many table.
    async fn category_links(&self, menu_ids: &[i64]) -> Result<Vec<(i64, i64)>, ApiError>;
    /// Replace a menu's category set in one transaction.
    async fn replace_categories(&self, menu_id: i64, category_ids: &[i64])
    -> Result<(), ApiError>;
    /// Addon links of the given menus, ordered by `display_order`.
    async fn addon_links(&self, menu_ids: &[i64]) -> Result<Vec<MenuAddonLink>, ApiError>;
    /// Menus using an addon category, ordered by `display_order`.
    async fn addon_category_links(
        &self,
        addon_category_id: i64,
    ) -> Result<Vec<MenuAddonLink>, ApiError>;
    /// Insert or update a menu / addon-category link.
    async fn link_addon_category(&self, link: &MenuAddonLink) -> Result<(), ApiError>;
    /// Returns `true` if a link was removed.
    async fn unlink_addon_category(
        &self,
        menu_id: i64,
        addon_category_id: i64,
    ) -> Result<bool, ApiError>;
}

/// Repository for addon categories and items. Soft-deleted rows are never returned.
pub trait AddonRepository: Send + Sync {
    async fn list_categories(&self, merchant_id: i64) -> Result<Vec<AddonCategory>, ApiError>;
    async fn find_category(
        &self,
        merchant_id: i64,
        id: i64,
    ) -> Result<Option<AddonCategory>, ApiError>;
    async fn find_categories(
        &self,
        merchant_id: i64,
        ids: &[i64],
    ) -> Result<Vec<AddonCategory>, ApiError>;
    async fn create_category(
        &self,
        merchant_id: i64,
        category: &NewAddonCategory,
    ) -> Result<AddonCategory, ApiError>;
    async fn update_category(
        &self,
        id: i64,
        patch: &AddonCategoryPatch,
    ) -> Result<AddonCategory, ApiError>;
    async fn soft_delete_category(&self, id: i64, at: DateTime<Utc>) -> Result<(), ApiError>;
    /// Items of the given categories, ordered by name.
    async fn items_by_categories(&self, category_ids: &[i64])
    -> Result<Vec<AddonItem>, ApiError>;
    async fn find_item(&self, id: i64) -> Result<Option<AddonItem>, ApiError>;
    async fn create_item(&self, item: &NewAddonItem) -> Result<AddonItem, ApiError>;
    async fn update_item(&self, id: i64, patch: &AddonItemPatch) -> Result<AddonItem, ApiError>;
    async fn soft_delete_item(&self, id: i64, at: DateTime<Utc>) -> Result<(), ApiError>;
}

/// Repository for orders.
pub trait OrderRepository: Send + Sync {
    /// Persist the order, its lines, the initial history row and the stock decrements
    /// in one transaction. Fails with [`ApiError::InsufficientStock`] when a tracked
    /// menu or addon runs out, leaving nothing written.
    async fn create(&self, order: &NewOrder) -> Result<Order, ApiError>;
    async fn find_by_number(&self, order_number: &str) -> Result<Option<OrderDetail>, ApiError>;
    async fn find_for_merchant(
        &self,
        merchant_id: i64,
        id: i64,
    ) -> Result<Option<OrderDetail>, ApiError>;
    /// One page of a merchant's orders, newest first, plus the total count.
    async fn list_for_merchant(
        &self,
        merchant_id: i64,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<(Vec<Order>, u64), ApiError>;
    async fn list_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, ApiError>;
    /// Apply a status change with its history row. Cancelling restores tracked stock.
    async fn update_status(&self, update: &StatusUpdate) -> Result<Order, ApiError>;
    /// `COMPLETED` orders placed within `[from, to]`.
    async fn completed_between(
        &self,
        merchant_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<RevenueEntry>, ApiError>;
}
