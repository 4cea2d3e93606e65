use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use tabletop_api::domain::repository::{
    AddonRepository, CategoryRepository, MenuRepository, MerchantRepository, OrderRepository,
    SessionRepository, UserRepository,
};
use tabletop_api::domain::types::{
    AddonCategory, AddonCategoryPatch, AddonItem, AddonItemPatch, CategoryPatch, Menu,
    MenuAddonLink, MenuCategory, MenuPatch, Merchant, MerchantLink, MerchantPatch,
    NewAddonCategory, NewAddonItem, NewCategory, NewMenu, NewMerchant, NewOrder, NewSession,
    NewUser, Order, OrderDetail, OrderItem, OrderItemAddon, RevenueEntry, Session, SessionTokens,
    StatusChange, StatusUpdate, User, UserPatch,
};
use tabletop_api::error::ApiError;
use tabletop_api::infra::password::hash_password;
use tabletop_api::usecase::auth_context::{AuthContext, MerchantScope};
use tabletop_domain::order::OrderStatus;
use tabletop_domain::pagination::PageRequest;
use tabletop_domain::role::{MerchantRole, UserRole};
use tabletop_domain::session::SessionStatus;

pub const STRONG_PASSWORD: &str = "Secret123";

pub fn money(raw: &str) -> Decimal {
    raw.parse().unwrap()
}

// ── MemoryStore ──────────────────────────────────────────────────────────────

/// Rows held by [`MemoryStore`]. Soft-deleted catalog rows are removed outright.
#[derive(Default)]
pub struct Tables {
    next_id: i64,
    pub users: Vec<User>,
    pub merchant_links: Vec<(i64, MerchantLink)>,
    pub sessions: Vec<Session>,
    pub merchants: Vec<Merchant>,
    pub categories: Vec<MenuCategory>,
    pub menus: Vec<Menu>,
    pub menu_categories: Vec<(i64, i64)>,
    pub addon_links: Vec<MenuAddonLink>,
    pub addon_categories: Vec<AddonCategory>,
    pub addon_items: Vec<AddonItem>,
    pub orders: Vec<OrderDetail>,
    /// The next N order inserts fail as if their number were already taken.
    pub order_number_collisions: usize,
    /// Storing tokens on a new session fails, as a dropped connection would.
    pub fail_session_tokens: bool,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory implementation of every repository trait, shared through clones.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    // ── seeding ──

    pub fn seed_user(&self, name: &str, email: &str, role: UserRole, password: Option<&str>) -> User {
        let now = Utc::now();
        let mut t = self.tables();
        let user = User {
            id: t.next_id(),
            name: name.to_owned(),
            email: email.to_owned(),
            phone: None,
            password_hash: password.map(|p| hash_password(p).unwrap()),
            role,
            is_active: true,
            must_change_password: false,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        t.users.push(user.clone());
        user
    }

    pub fn seed_merchant(&self, code: &str) -> Merchant {
        let now = Utc::now();
        let mut t = self.tables();
        let merchant = Merchant {
            id: t.next_id(),
            code: code.to_owned(),
            name: format!("{code} Kitchen"),
            description: None,
            address: None,
            phone: None,
            email: None,
            currency: "AUD".to_owned(),
            tax_rate: Decimal::ZERO,
            tax_included: false,
            service_charge_rate: Decimal::ZERO,
            is_active: true,
            is_open: true,
            created_at: now,
            updated_at: now,
        };
        t.merchants.push(merchant.clone());
        merchant
    }

    pub fn update_merchant_row(&self, id: i64, f: impl FnOnce(&mut Merchant)) {
        let mut t = self.tables();
        if let Some(m) = t.merchants.iter_mut().find(|m| m.id == id) {
            f(m);
        }
    }

    pub fn link_user(&self, user_id: i64, merchant_id: i64, role: MerchantRole) {
        self.tables()
            .merchant_links
            .push((user_id, MerchantLink { merchant_id, role }));
    }

    pub fn seed_category(&self, merchant_id: i64, name: &str, sort_order: i32) -> MenuCategory {
        let now = Utc::now();
        let mut t = self.tables();
        let category = MenuCategory {
            id: t.next_id(),
            merchant_id,
            name: name.to_owned(),
            description: None,
            sort_order,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        t.categories.push(category.clone());
        category
    }

    pub fn seed_menu(&self, merchant_id: i64, name: &str, price: &str) -> Menu {
        let now = Utc::now();
        let mut t = self.tables();
        let menu = Menu {
            id: t.next_id(),
            merchant_id,
            category_id: None,
            name: name.to_owned(),
            description: None,
            price: money(price),
            promo_price: None,
            is_promo: false,
            image_url: None,
            is_active: true,
            track_stock: false,
            stock_qty: None,
            created_at: now,
            updated_at: now,
        };
        t.menus.push(menu.clone());
        menu
    }

    pub fn update_menu_row(&self, id: i64, f: impl FnOnce(&mut Menu)) {
        let mut t = self.tables();
        if let Some(m) = t.menus.iter_mut().find(|m| m.id == id) {
            f(m);
        }
    }

    pub fn seed_addon_category(
        &self,
        merchant_id: i64,
        name: &str,
        min_selection: i32,
        max_selection: Option<i32>,
    ) -> AddonCategory {
        let now = Utc::now();
        let mut t = self.tables();
        let category = AddonCategory {
            id: t.next_id(),
            merchant_id,
            name: name.to_owned(),
            description: None,
            min_selection,
            max_selection,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        t.addon_categories.push(category.clone());
        category
    }

    pub fn seed_addon_item(&self, addon_category_id: i64, name: &str, price: &str) -> AddonItem {
        let now = Utc::now();
        let mut t = self.tables();
        let item = AddonItem {
            id: t.next_id(),
            addon_category_id,
            name: name.to_owned(),
            description: None,
            price: money(price),
            is_active: true,
            track_stock: false,
            stock_qty: None,
            created_at: now,
            updated_at: now,
        };
        t.addon_items.push(item.clone());
        item
    }

    pub fn update_addon_item_row(&self, id: i64, f: impl FnOnce(&mut AddonItem)) {
        let mut t = self.tables();
        if let Some(i) = t.addon_items.iter_mut().find(|i| i.id == id) {
            f(i);
        }
    }

    pub fn seed_link(&self, menu_id: i64, addon_category_id: i64, is_required: bool) {
        self.tables().addon_links.push(MenuAddonLink {
            menu_id,
            addon_category_id,
            is_required,
            display_order: 0,
        });
    }

    // ── inspection ──

    pub fn user(&self, id: i64) -> User {
        self.tables().users.iter().find(|u| u.id == id).cloned().unwrap()
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        self.tables().users.iter().find(|u| u.email == email).cloned()
    }

    pub fn session(&self, id: i64) -> Session {
        self.tables().sessions.iter().find(|s| s.id == id).cloned().unwrap()
    }

    pub fn menu(&self, id: i64) -> Menu {
        self.tables().menus.iter().find(|m| m.id == id).cloned().unwrap()
    }

    pub fn addon_item(&self, id: i64) -> AddonItem {
        self.tables().addon_items.iter().find(|i| i.id == id).cloned().unwrap()
    }

    pub fn merchant(&self, id: i64) -> Merchant {
        self.tables().merchants.iter().find(|m| m.id == id).cloned().unwrap()
    }

    pub fn order_count(&self) -> usize {
        self.tables().orders.len()
    }
}

// ── UserRepository ───────────────────────────────────────────────────────────

impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, ApiError> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(self.user_by_email(email))
    }

    async fn create(&self, user: &NewUser) -> Result<User, ApiError> {
        let now = Utc::now();
        let mut t = self.tables();
        if t.users.iter().any(|u| u.email == user.email) {
            return Err(ApiError::EmailExists);
        }
        let user = User {
            id: t.next_id(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role,
            is_active: true,
            must_change_password: user.must_change_password,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: i64, patch: &UserPatch) -> Result<User, ApiError> {
        let mut t = self.tables();
        if let Some(email) = &patch.email {
            if t.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(ApiError::EmailExists);
            }
        }
        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(ApiError::UserNotFound)?;
        if let Some(name) = &patch.name {
            user.name = name.clone();
        }
        if let Some(email) = &patch.email {
            user.email = email.clone();
        }
        if let Some(phone) = &patch.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(is_active) = patch.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_password(
        &self,
        id: i64,
        password_hash: &str,
        must_change_password: bool,
    ) -> Result<(), ApiError> {
        let mut t = self.tables();
        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(ApiError::UserNotFound)?;
        user.password_hash = Some(password_hash.to_owned());
        user.must_change_password = must_change_password;
        Ok(())
    }

    async fn touch_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), ApiError> {
        let mut t = self.tables();
        if let Some(user) = t.users.iter_mut().find(|u| u.id == id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn list(
        &self,
        role: Option<UserRole>,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64), ApiError> {
        let t = self.tables();
        let mut users: Vec<User> = t
            .users
            .iter()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .cloned()
            .collect();
        users.sort_by(|a, b| b.id.cmp(&a.id));
        let total = users.len() as u64;
        let items = users
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Ok((items, total))
    }

    async fn merchant_link(&self, user_id: i64) -> Result<Option<MerchantLink>, ApiError> {
        Ok(self
            .tables()
            .merchant_links
            .iter()
            .find(|(uid, _)| *uid == user_id)
            .map(|(_, link)| *link))
    }
}

// ── SessionRepository ────────────────────────────────────────────────────────

impl SessionRepository for MemoryStore {
    async fn create<T, F>(&self, session: &NewSession, sign: F) -> Result<(Session, T), ApiError>
    where
        T: Send,
        F: FnOnce(i64) -> Result<(SessionTokens, T), ApiError> + Send,
    {
        let now = Utc::now();
        let id = self.tables().next_id();
        let (tokens, issued) = sign(id)?;
        let mut t = self.tables();
        if t.fail_session_tokens {
            return Err(anyhow::anyhow!("store session tokens: connection closed").into());
        }
        let session = Session {
            id,
            user_id: session.user_id,
            token: tokens.token,
            refresh_token: tokens.refresh_token,
            status: SessionStatus::Active,
            device_info: session.device_info.clone(),
            ip_address: session.ip_address.clone(),
            expires_at: session.expires_at,
            last_activity_at: now,
            created_at: now,
        };
        t.sessions.push(session.clone());
        Ok((session, issued))
    }

    async fn set_tokens(
        &self,
        id: i64,
        token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        let mut t = self.tables();
        let session = t
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(ApiError::SessionNotFound)?;
        session.token = token.to_owned();
        session.refresh_token = refresh_token.to_owned();
        session.expires_at = expires_at;
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Session>, ApiError> {
        Ok(self.tables().sessions.iter().find(|s| s.id == id).cloned())
    }

    async fn touch(&self, id: i64, at: DateTime<Utc>) -> Result<(), ApiError> {
        let mut t = self.tables();
        if let Some(session) = t.sessions.iter_mut().find(|s| s.id == id) {
            session.last_activity_at = at;
        }
        Ok(())
    }

    async fn list_active(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Session>, ApiError> {
        let t = self.tables();
        let mut sessions: Vec<Session> = t
            .sessions
            .iter()
            .filter(|s| {
                s.user_id == user_id && s.status == SessionStatus::Active && s.expires_at > now
            })
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
        Ok(sessions)
    }

    async fn revoke(&self, id: i64) -> Result<bool, ApiError> {
        let mut t = self.tables();
        match t
            .sessions
            .iter_mut()
            .find(|s| s.id == id && s.status == SessionStatus::Active)
        {
            Some(session) => {
                session.status = SessionStatus::Revoked;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_all(&self, user_id: i64, keep: Option<i64>) -> Result<u64, ApiError> {
        let mut t = self.tables();
        let mut count = 0;
        for session in t.sessions.iter_mut().filter(|s| {
            s.user_id == user_id && s.status == SessionStatus::Active && Some(s.id) != keep
        }) {
            session.status = SessionStatus::Revoked;
            count += 1;
        }
        Ok(count)
    }
}

// ── MerchantRepository ───────────────────────────────────────────────────────

impl MerchantRepository for MemoryStore {
    async fn list(&self, active_only: bool) -> Result<Vec<Merchant>, ApiError> {
        Ok(self
            .tables()
            .merchants
            .iter()
            .filter(|m| !active_only || m.is_active)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Merchant>, ApiError> {
        Ok(self.tables().merchants.iter().find(|m| m.id == id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Merchant>, ApiError> {
        Ok(self.tables().merchants.iter().find(|m| m.code == code).cloned())
    }

    async fn create_with_owner(
        &self,
        merchant: &NewMerchant,
        owner: &NewUser,
    ) -> Result<(Merchant, User), ApiError> {
        let now = Utc::now();
        let mut t = self.tables();
        if t.merchants.iter().any(|m| m.code == merchant.code) {
            return Err(ApiError::MerchantCodeExists);
        }
        if t.users.iter().any(|u| u.email == owner.email) {
            return Err(ApiError::EmailExists);
        }
        let merchant = Merchant {
            id: t.next_id(),
            code: merchant.code.clone(),
            name: merchant.name.clone(),
            description: merchant.description.clone(),
            address: merchant.address.clone(),
            phone: merchant.phone.clone(),
            email: merchant.email.clone(),
            currency: merchant.currency.clone(),
            tax_rate: merchant.tax_rate,
            tax_included: merchant.tax_included,
            service_charge_rate: merchant.service_charge_rate,
            is_active: true,
            is_open: true,
            created_at: now,
            updated_at: now,
        };
        let user = User {
            id: t.next_id(),
            name: owner.name.clone(),
            email: owner.email.clone(),
            phone: owner.phone.clone(),
            password_hash: owner.password_hash.clone(),
            role: owner.role,
            is_active: true,
            must_change_password: owner.must_change_password,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        t.merchants.push(merchant.clone());
        t.users.push(user.clone());
        t.merchant_links.push((
            user.id,
            MerchantLink {
                merchant_id: merchant.id,
                role: MerchantRole::Owner,
            },
        ));
        Ok((merchant, user))
    }

    async fn update(&self, id: i64, patch: &MerchantPatch) -> Result<Merchant, ApiError> {
        let mut t = self.tables();
        if let Some(code) = &patch.code {
            if t.merchants.iter().any(|m| m.id != id && &m.code == code) {
                return Err(ApiError::MerchantCodeExists);
            }
        }
        let m = t
            .merchants
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(ApiError::MerchantNotFound)?;
        if let Some(v) = &patch.code {
            m.code = v.clone();
        }
        if let Some(v) = &patch.name {
            m.name = v.clone();
        }
        if let Some(v) = &patch.description {
            m.description = Some(v.clone());
        }
        if let Some(v) = &patch.address {
            m.address = Some(v.clone());
        }
        if let Some(v) = &patch.phone {
            m.phone = Some(v.clone());
        }
        if let Some(v) = &patch.email {
            m.email = Some(v.clone());
        }
        if let Some(v) = &patch.currency {
            m.currency = v.clone();
        }
        if let Some(v) = patch.tax_rate {
            m.tax_rate = v;
        }
        if let Some(v) = patch.tax_included {
            m.tax_included = v;
        }
        if let Some(v) = patch.service_charge_rate {
            m.service_charge_rate = v;
        }
        m.updated_at = Utc::now();
        Ok(m.clone())
    }

    async fn set_active(&self, id: i64, is_active: bool) -> Result<Merchant, ApiError> {
        let mut t = self.tables();
        let m = t
            .merchants
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(ApiError::MerchantNotFound)?;
        m.is_active = is_active;
        Ok(m.clone())
    }

    async fn set_open(&self, id: i64, is_open: bool) -> Result<Merchant, ApiError> {
        let mut t = self.tables();
        let m = t
            .merchants
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(ApiError::MerchantNotFound)?;
        m.is_open = is_open;
        Ok(m.clone())
    }
}

// ── CategoryRepository ───────────────────────────────────────────────────────

impl CategoryRepository for MemoryStore {
    async fn list(
        &self,
        merchant_id: i64,
        active_only: bool,
    ) -> Result<Vec<MenuCategory>, ApiError> {
        let mut categories: Vec<MenuCategory> = self
            .tables()
            .categories
            .iter()
            .filter(|c| c.merchant_id == merchant_id && (!active_only || c.is_active))
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.name.cmp(&b.name)));
        Ok(categories)
    }

    async fn find(&self, merchant_id: i64, id: i64) -> Result<Option<MenuCategory>, ApiError> {
        Ok(self
            .tables()
            .categories
            .iter()
            .find(|c| c.id == id && c.merchant_id == merchant_id)
            .cloned())
    }

    async fn find_many(
        &self,
        merchant_id: i64,
        ids: &[i64],
    ) -> Result<Vec<MenuCategory>, ApiError> {
        Ok(self
            .tables()
            .categories
            .iter()
            .filter(|c| c.merchant_id == merchant_id && ids.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn create(
        &self,
        merchant_id: i64,
        category: &NewCategory,
    ) -> Result<MenuCategory, ApiError> {
        let now = Utc::now();
        let mut t = self.tables();
        let category = MenuCategory {
            id: t.next_id(),
            merchant_id,
            name: category.name.clone(),
            description: category.description.clone(),
            sort_order: category.sort_order,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        t.categories.push(category.clone());
        Ok(category)
    }

    async fn update(&self, id: i64, patch: &CategoryPatch) -> Result<MenuCategory, ApiError> {
        let mut t = self.tables();
        let c = t
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(ApiError::CategoryNotFound)?;
        if let Some(v) = &patch.name {
            c.name = v.clone();
        }
        if let Some(v) = &patch.description {
            c.description = Some(v.clone());
        }
        if let Some(v) = patch.sort_order {
            c.sort_order = v;
        }
        if let Some(v) = patch.is_active {
            c.is_active = v;
        }
        Ok(c.clone())
    }

    async fn soft_delete(&self, id: i64, _at: DateTime<Utc>) -> Result<(), ApiError> {
        self.tables().categories.retain(|c| c.id != id);
        Ok(())
    }
}

// ── MenuRepository ───────────────────────────────────────────────────────────

impl MenuRepository for MemoryStore {
    async fn list(&self, merchant_id: i64, active_only: bool) -> Result<Vec<Menu>, ApiError> {
        Ok(self
            .tables()
            .menus
            .iter()
            .filter(|m| m.merchant_id == merchant_id && (!active_only || m.is_active))
            .cloned()
            .collect())
    }

    async fn find(&self, merchant_id: i64, id: i64) -> Result<Option<Menu>, ApiError> {
        Ok(self
            .tables()
            .menus
            .iter()
            .find(|m| m.id == id && m.merchant_id == merchant_id)
            .cloned())
    }

    async fn find_many(&self, merchant_id: i64, ids: &[i64]) -> Result<Vec<Menu>, ApiError> {
        Ok(self
            .tables()
            .menus
            .iter()
            .filter(|m| m.merchant_id == merchant_id && ids.contains(&m.id))
            .cloned()
            .collect())
    }

    async fn create(&self, merchant_id: i64, menu: &NewMenu) -> Result<Menu, ApiError> {
        let now = Utc::now();
        let mut t = self.tables();
        let menu = Menu {
            id: t.next_id(),
            merchant_id,
            category_id: menu.category_id,
            name: menu.name.clone(),
            description: menu.description.clone(),
            price: menu.price,
            promo_price: menu.promo_price,
            is_promo: menu.is_promo,
            image_url: menu.image_url.clone(),
            is_active: true,
            track_stock: menu.track_stock,
            stock_qty: menu.stock_qty,
            created_at: now,
            updated_at: now,
        };
        t.menus.push(menu.clone());
        Ok(menu)
    }

    async fn update(&self, id: i64, patch: &MenuPatch) -> Result<Menu, ApiError> {
        let mut t = self.tables();
        let m = t
            .menus
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(ApiError::MenuNotFound)?;
        if let Some(v) = patch.category_id {
            m.category_id = Some(v);
        }
        if let Some(v) = &patch.name {
            m.name = v.clone();
        }
        if let Some(v) = &patch.description {
            m.description = Some(v.clone());
        }
        if let Some(v) = patch.price {
            m.price = v;
        }
        if let Some(v) = patch.promo_price {
            m.promo_price = Some(v);
        }
        if let Some(v) = patch.is_promo {
            m.is_promo = v;
        }
        if let Some(v) = &patch.image_url {
            m.image_url = Some(v.clone());
        }
        if let Some(v) = patch.is_active {
            m.is_active = v;
        }
        if let Some(v) = patch.track_stock {
            m.track_stock = v;
        }
        if let Some(v) = patch.stock_qty {
            m.stock_qty = Some(v);
        }
        Ok(m.clone())
    }

    async fn soft_delete(&self, id: i64, _at: DateTime<Utc>) -> Result<(), ApiError> {
        self.tables().menus.retain(|m| m.id != id);
        Ok(())
    }

    async fn category_links(&self, menu_ids: &[i64]) -> Result<Vec<(i64, i64)>, ApiError> {
        Ok(self
            .tables()
            .menu_categories
            .iter()
            .filter(|(menu_id, _)| menu_ids.contains(menu_id))
            .copied()
            .collect())
    }

    async fn replace_categories(
        &self,
        menu_id: i64,
        category_ids: &[i64],
    ) -> Result<(), ApiError> {
        let mut t = self.tables();
        t.menu_categories.retain(|(m, _)| *m != menu_id);
        t.menu_categories
            .extend(category_ids.iter().map(|c| (menu_id, *c)));
        Ok(())
    }

    async fn addon_links(&self, menu_ids: &[i64]) -> Result<Vec<MenuAddonLink>, ApiError> {
        let mut links: Vec<MenuAddonLink> = self
            .tables()
            .addon_links
            .iter()
            .filter(|l| menu_ids.contains(&l.menu_id))
            .copied()
            .collect();
        links.sort_by_key(|l| l.display_order);
        Ok(links)
    }

    async fn addon_category_links(
        &self,
        addon_category_id: i64,
    ) -> Result<Vec<MenuAddonLink>, ApiError> {
        let mut links: Vec<MenuAddonLink> = self
            .tables()
            .addon_links
            .iter()
            .filter(|l| l.addon_category_id == addon_category_id)
            .copied()
            .collect();
        links.sort_by_key(|l| l.display_order);
        Ok(links)
    }

    async fn link_addon_category(&self, link: &MenuAddonLink) -> Result<(), ApiError> {
        let mut t = self.tables();
        t.addon_links.retain(|l| {
            !(l.menu_id == link.menu_id && l.addon_category_id == link.addon_category_id)
        });
        t.addon_links.push(*link);
        Ok(())
    }

    async fn unlink_addon_category(
        &self,
        menu_id: i64,
        addon_category_id: i64,
    ) -> Result<bool, ApiError> {
        let mut t = self.tables();
        let before = t.addon_links.len();
        t.addon_links
            .retain(|l| !(l.menu_id == menu_id && l.addon_category_id == addon_category_id));
        Ok(t.addon_links.len() != before)
    }
}

// ── AddonRepository ──────────────────────────────────────────────────────────

impl AddonRepository for MemoryStore {
    async fn list_categories(&self, merchant_id: i64) -> Result<Vec<AddonCategory>, ApiError> {
        Ok(self
            .tables()
            .addon_categories
            .iter()
            .filter(|c| c.merchant_id == merchant_id)
            .cloned()
            .collect())
    }

    async fn find_category(
        &self,
        merchant_id: i64,
        id: i64,
    ) -> Result<Option<AddonCategory>, ApiError> {
        Ok(self
            .tables()
            .addon_categories
            .iter()
            .find(|c| c.id == id && c.merchant_id == merchant_id)
            .cloned())
    }

    async fn find_categories(
        &self,
        merchant_id: i64,
        ids: &[i64],
    ) -> Result<Vec<AddonCategory>, ApiError> {
        Ok(self
            .tables()
            .addon_categories
            .iter()
            .filter(|c| c.merchant_id == merchant_id && ids.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn create_category(
        &self,
        merchant_id: i64,
        category: &NewAddonCategory,
    ) -> Result<AddonCategory, ApiError> {
        let now = Utc::now();
        let mut t = self.tables();
        let category = AddonCategory {
            id: t.next_id(),
            merchant_id,
            name: category.name.clone(),
            description: category.description.clone(),
            min_selection: category.min_selection,
            max_selection: category.max_selection,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        t.addon_categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: i64,
        patch: &AddonCategoryPatch,
    ) -> Result<AddonCategory, ApiError> {
        let mut t = self.tables();
        let c = t
            .addon_categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(ApiError::AddonCategoryNotFound)?;
        if let Some(v) = &patch.name {
            c.name = v.clone();
        }
        if let Some(v) = &patch.description {
            c.description = Some(v.clone());
        }
        if let Some(v) = patch.min_selection {
            c.min_selection = v;
        }
        if let Some(v) = patch.max_selection {
            c.max_selection = v;
        }
        if let Some(v) = patch.is_active {
            c.is_active = v;
        }
        Ok(c.clone())
    }

    async fn soft_delete_category(&self, id: i64, _at: DateTime<Utc>) -> Result<(), ApiError> {
        self.tables().addon_categories.retain(|c| c.id != id);
        Ok(())
    }

    async fn items_by_categories(
        &self,
        category_ids: &[i64],
    ) -> Result<Vec<AddonItem>, ApiError> {
        let mut items: Vec<AddonItem> = self
            .tables()
            .addon_items
            .iter()
            .filter(|i| category_ids.contains(&i.addon_category_id))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn find_item(&self, id: i64) -> Result<Option<AddonItem>, ApiError> {
        Ok(self.tables().addon_items.iter().find(|i| i.id == id).cloned())
    }

    async fn create_item(&self, item: &NewAddonItem) -> Result<AddonItem, ApiError> {
        let now = Utc::now();
        let mut t = self.tables();
        let item = AddonItem {
            id: t.next_id(),
            addon_category_id: item.addon_category_id,
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price,
            is_active: true,
            track_stock: item.track_stock,
            stock_qty: item.stock_qty,
            created_at: now,
            updated_at: now,
        };
        t.addon_items.push(item.clone());
        Ok(item)
    }

    async fn update_item(&self, id: i64, patch: &AddonItemPatch) -> Result<AddonItem, ApiError> {
        let mut t = self.tables();
        let i = t
            .addon_items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(ApiError::AddonItemNotFound)?;
        if let Some(v) = &patch.name {
            i.name = v.clone();
        }
        if let Some(v) = &patch.description {
            i.description = Some(v.clone());
        }
        if let Some(v) = patch.price {
            i.price = v;
        }
        if let Some(v) = patch.is_active {
            i.is_active = v;
        }
        if let Some(v) = patch.track_stock {
            i.track_stock = v;
        }
        if let Some(v) = patch.stock_qty {
            i.stock_qty = Some(v);
        }
        Ok(i.clone())
    }

    async fn soft_delete_item(&self, id: i64, _at: DateTime<Utc>) -> Result<(), ApiError> {
        self.tables().addon_items.retain(|i| i.id != id);
        Ok(())
    }
}

// ── OrderRepository ──────────────────────────────────────────────────────────

fn take_stock(stock: &mut Option<i32>, quantity: i32) -> bool {
    match stock {
        Some(qty) if *qty >= quantity => {
            *qty -= quantity;
            true
        }
        _ => false,
    }
}

impl OrderRepository for MemoryStore {
    async fn create(&self, order: &NewOrder) -> Result<Order, ApiError> {
        let mut t = self.tables();
        if t.order_number_collisions > 0 {
            t.order_number_collisions -= 1;
            return Err(ApiError::OrderNumberTaken);
        }
        if t.orders.iter().any(|o| o.order.order_number == order.order_number) {
            return Err(ApiError::OrderNumberTaken);
        }

        // Stock is checked against a scratch copy so a failure leaves nothing written.
        let mut menus = t.menus.clone();
        let mut addon_items = t.addon_items.clone();
        for item in &order.items {
            let quantity = item.quantity as i32;
            if item.track_stock {
                let menu = menus.iter_mut().find(|m| m.id == item.menu_id);
                if !menu.is_some_and(|m| take_stock(&mut m.stock_qty, quantity)) {
                    return Err(ApiError::InsufficientStock(item.menu_name.clone()));
                }
            }
            for addon in item.addons.iter().filter(|a| a.track_stock) {
                let row = addon_items.iter_mut().find(|i| i.id == addon.addon_item_id);
                if !row.is_some_and(|i| take_stock(&mut i.stock_qty, addon.quantity as i32)) {
                    return Err(ApiError::InsufficientStock(addon.addon_name.clone()));
                }
            }
        }
        t.menus = menus;
        t.addon_items = addon_items;

        let order_id = t.next_id();
        let row = Order {
            id: order_id,
            merchant_id: order.merchant_id,
            customer_id: order.customer_id,
            order_number: order.order_number.clone(),
            order_type: order.order_type,
            table_number: order.table_number.clone(),
            status: OrderStatus::Pending,
            customer_name: order.customer_name.clone(),
            customer_email: order.customer_email.clone(),
            customer_phone: order.customer_phone.clone(),
            notes: order.notes.clone(),
            subtotal: order.totals.subtotal,
            tax_amount: order.totals.tax_amount,
            service_fee_amount: order.totals.service_fee_amount,
            total_amount: order.totals.total_amount,
            placed_at: order.placed_at,
            updated_at: order.placed_at,
            completed_at: None,
        };
        let mut items = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let item_id = t.next_id();
            let mut addons = Vec::with_capacity(item.addons.len());
            for addon in &item.addons {
                addons.push(OrderItemAddon {
                    id: t.next_id(),
                    order_item_id: item_id,
                    addon_item_id: addon.addon_item_id,
                    addon_name: addon.addon_name.clone(),
                    unit_price: addon.unit_price,
                    quantity: addon.quantity as i32,
                    subtotal: addon.subtotal,
                    stock_taken: addon.track_stock,
                });
            }
            items.push(OrderItem {
                id: item_id,
                order_id,
                menu_id: item.menu_id,
                menu_name: item.menu_name.clone(),
                unit_price: item.unit_price,
                quantity: item.quantity as i32,
                subtotal: item.subtotal,
                notes: item.notes.clone(),
                stock_taken: item.track_stock,
                addons,
            });
        }
        let history = vec![StatusChange {
            id: t.next_id(),
            order_id,
            from_status: None,
            to_status: OrderStatus::Pending,
            note: Some("Order placed".to_owned()),
            changed_by_user_id: None,
            created_at: order.placed_at,
        }];
        t.orders.push(OrderDetail {
            order: row.clone(),
            items,
            history,
        });
        Ok(row)
    }

    async fn find_by_number(&self, order_number: &str) -> Result<Option<OrderDetail>, ApiError> {
        Ok(self
            .tables()
            .orders
            .iter()
            .find(|o| o.order.order_number == order_number)
            .cloned())
    }

    async fn find_for_merchant(
        &self,
        merchant_id: i64,
        id: i64,
    ) -> Result<Option<OrderDetail>, ApiError> {
        Ok(self
            .tables()
            .orders
            .iter()
            .find(|o| o.order.id == id && o.order.merchant_id == merchant_id)
            .cloned())
    }

    async fn list_for_merchant(
        &self,
        merchant_id: i64,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<(Vec<Order>, u64), ApiError> {
        let mut orders: Vec<Order> = self
            .tables()
            .orders
            .iter()
            .map(|o| o.order.clone())
            .filter(|o| o.merchant_id == merchant_id && status.is_none_or(|s| o.status == s))
            .collect();
        orders.sort_by(|a, b| b.placed_at.cmp(&a.placed_at).then(b.id.cmp(&a.id)));
        let total = orders.len() as u64;
        let items = orders
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Ok((items, total))
    }

    async fn list_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, ApiError> {
        let mut orders: Vec<Order> = self
            .tables()
            .orders
            .iter()
            .map(|o| o.order.clone())
            .filter(|o| o.customer_id == Some(customer_id))
            .collect();
        orders.sort_by(|a, b| b.placed_at.cmp(&a.placed_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<Order, ApiError> {
        let mut t = self.tables();
        let history_id = t.next_id();
        let detail = t
            .orders
            .iter_mut()
            .find(|o| o.order.id == update.order_id)
            .ok_or(ApiError::OrderNotFound)?;
        if detail.order.status != update.from {
            return Err(ApiError::InvalidStatusTransition {
                from: detail.order.status.to_string(),
                to: update.to.to_string(),
            });
        }
        detail.order.status = update.to;
        detail.order.updated_at = update.at;
        if update.to == OrderStatus::Completed {
            detail.order.completed_at = Some(update.at);
        }
        detail.history.push(StatusChange {
            id: history_id,
            order_id: update.order_id,
            from_status: Some(update.from),
            to_status: update.to,
            note: update.note.clone(),
            changed_by_user_id: Some(update.changed_by),
            created_at: update.at,
        });
        let order = detail.order.clone();
        let items = detail.items.clone();

        if update.to == OrderStatus::Cancelled {
            for item in &items {
                if item.stock_taken {
                    if let Some(menu) = t.menus.iter_mut().find(|m| m.id == item.menu_id) {
                        if let Some(qty) = menu.stock_qty.as_mut() {
                            *qty += item.quantity;
                        }
                    }
                }
                for addon in item.addons.iter().filter(|a| a.stock_taken) {
                    if let Some(row) = t
                        .addon_items
                        .iter_mut()
                        .find(|i| i.id == addon.addon_item_id)
                    {
                        if let Some(qty) = row.stock_qty.as_mut() {
                            *qty += addon.quantity;
                        }
                    }
                }
            }
        }
        Ok(order)
    }

    async fn completed_between(
        &self,
        merchant_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<RevenueEntry>, ApiError> {
        Ok(self
            .tables()
            .orders
            .iter()
            .map(|o| &o.order)
            .filter(|o| {
                o.merchant_id == merchant_id
                    && o.status == OrderStatus::Completed
                    && o.placed_at >= from
                    && o.placed_at <= to
            })
            .map(|o| RevenueEntry {
                placed_at: o.placed_at,
                total_amount: o.total_amount,
            })
            .collect())
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn auth_context(user: &User, session_id: i64) -> AuthContext {
    AuthContext {
        user_id: user.id,
        session_id,
        role: user.role,
        email: user.email.clone(),
    }
}

/// A merchant with a linked owner, ready for dashboard calls.
pub struct MerchantFixture {
    pub merchant: Merchant,
    pub owner: User,
    pub scope: MerchantScope,
}

pub fn merchant_fixture(store: &MemoryStore, code: &str) -> MerchantFixture {
    let merchant = store.seed_merchant(code);
    let owner = store.seed_user(
        "Owner",
        &format!("owner@{}.example.com", code.to_lowercase()),
        UserRole::MerchantOwner,
        None,
    );
    store.link_user(owner.id, merchant.id, MerchantRole::Owner);
    let scope = MerchantScope {
        ctx: auth_context(&owner, 1),
        merchant_id: merchant.id,
        merchant_role: MerchantRole::Owner,
    };
    MerchantFixture {
        merchant,
        owner,
        scope,
    }
}

pub fn staff_scope(store: &MemoryStore, merchant_id: i64) -> MerchantScope {
    let staff = store.seed_user(
        "Staff",
        &format!("staff{merchant_id}@example.com"),
        UserRole::MerchantStaff,
        None,
    );
    store.link_user(staff.id, merchant_id, MerchantRole::Staff);
    MerchantScope {
        ctx: auth_context(&staff, 1),
        merchant_id,
        merchant_role: MerchantRole::Staff,
    }
}
