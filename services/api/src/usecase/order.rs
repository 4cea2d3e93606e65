use chrono::{DateTime, Utc};
use rand::RngExt;
use rust_decimal::Decimal;
use tracing::{info, warn};

use tabletop_domain::catalog::AddonSelectionRule;
use tabletop_domain::credentials::{is_valid_email, normalize_email};
use tabletop_domain::merchant::normalize_merchant_code;
use tabletop_domain::order::{OrderStatus, OrderType};
use tabletop_domain::pagination::{PageRequest, Paginated};
use tabletop_domain::pricing::{line_subtotal, round_money};

use crate::domain::repository::{
    AddonRepository, MenuRepository, MerchantRepository, OrderRepository, UserRepository,
};
use crate::domain::types::{
    AddonCategory, AddonItem, Menu, MenuAddonLink, NewOrder, NewOrderItem, NewOrderItemAddon,
    Order, OrderDetail, StatusUpdate,
};
use crate::error::ApiError;
use crate::usecase::auth_context::MerchantScope;
use crate::usecase::customer::find_or_register_customer;

pub const MAX_LINE_QUANTITY: i64 = 99;
const ORDER_SUFFIX_LEN: usize = 6;
const ORDER_SUFFIX_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ORDER_NUMBER_ATTEMPTS: usize = 3;

/// `<CODE>-<YYMMDD>-<6 random upper-case letters or digits>`
pub fn generate_order_number(merchant_code: &str, at: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ORDER_SUFFIX_LEN)
        .map(|_| char::from(ORDER_SUFFIX_CHARS[rng.random_range(0..ORDER_SUFFIX_CHARS.len())]))
        .collect();
    format!("{merchant_code}-{}-{suffix}", at.format("%y%m%d"))
}

// ── PlaceOrder ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OrderLineInput {
    pub menu_id: i64,
    pub quantity: i64,
    pub selected_addons: Vec<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PlaceOrderInput {
    pub merchant_code: String,
    pub order_type: String,
    pub table_number: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderLineInput>,
}

/// Catalog rows an order draws from, loaded once per order.
#[derive(Debug, Default)]
pub(crate) struct CatalogSnapshot {
    pub menus: Vec<Menu>,
    pub links: Vec<MenuAddonLink>,
    pub addon_categories: Vec<AddonCategory>,
    pub addon_items: Vec<AddonItem>,
}

/// Resolve and price every order line against the catalog.
pub(crate) fn price_lines(
    catalog: &CatalogSnapshot,
    lines: &[OrderLineInput],
) -> Result<Vec<NewOrderItem>, ApiError> {
    lines.iter().map(|line| price_line(catalog, line)).collect()
}

fn price_line(catalog: &CatalogSnapshot, line: &OrderLineInput) -> Result<NewOrderItem, ApiError> {
    let menu = catalog
        .menus
        .iter()
        .find(|m| m.id == line.menu_id && m.is_active)
        .ok_or(ApiError::MenuNotAvailable(line.menu_id))?;
    let quantity = u32::try_from(line.quantity)
        .map_err(|_| ApiError::validation("quantity must be between 1 and 99"))?;

    let links: Vec<&MenuAddonLink> = catalog
        .links
        .iter()
        .filter(|l| l.menu_id == menu.id)
        .collect();
    let offered = |category_id: i64| {
        links.iter().any(|l| l.addon_category_id == category_id)
            && catalog
                .addon_categories
                .iter()
                .any(|c| c.id == category_id && c.is_active)
    };

    let mut selected: Vec<&AddonItem> = Vec::with_capacity(line.selected_addons.len());
    for addon_id in &line.selected_addons {
        if selected.iter().any(|a| a.id == *addon_id) {
            continue;
        }
        let item = catalog
            .addon_items
            .iter()
            .find(|i| i.id == *addon_id && i.is_active && offered(i.addon_category_id))
            .ok_or(ApiError::AddonNotAvailable(*addon_id))?;
        selected.push(item);
    }

    for link in &links {
        let Some(category) = catalog
            .addon_categories
            .iter()
            .find(|c| c.id == link.addon_category_id && c.is_active)
        else {
            continue;
        };
        let count = selected
            .iter()
            .filter(|i| i.addon_category_id == category.id)
            .count();
        let rule = AddonSelectionRule::new(
            category.min_selection,
            category.max_selection,
            link.is_required,
        );
        if !rule.allows(u32::try_from(count).unwrap_or(u32::MAX)) {
            return Err(ApiError::AddonSelectionInvalid(category.name.clone()));
        }
    }

    let unit_price = menu.unit_price();
    let addon_prices: Vec<Decimal> = selected.iter().map(|i| i.price).collect();
    Ok(NewOrderItem {
        menu_id: menu.id,
        menu_name: menu.name.clone(),
        unit_price,
        quantity,
        subtotal: line_subtotal(unit_price, &addon_prices, quantity),
        notes: line.notes.clone().filter(|n| !n.trim().is_empty()),
        track_stock: menu.track_stock,
        addons: selected
            .iter()
            .map(|item| NewOrderItemAddon {
                addon_item_id: item.id,
                addon_name: item.name.clone(),
                unit_price: item.price,
                quantity,
                subtotal: round_money(item.price * Decimal::from(quantity)),
                track_stock: item.track_stock,
            })
            .collect(),
    })
}

fn validate_lines(lines: &[OrderLineInput]) -> Result<(), ApiError> {
    if lines.is_empty() {
        return Err(ApiError::validation("order must contain at least one item"));
    }
    if lines
        .iter()
        .any(|l| !(1..=MAX_LINE_QUANTITY).contains(&l.quantity))
    {
        return Err(ApiError::validation("quantity must be between 1 and 99"));
    }
    Ok(())
}

pub struct PlaceOrderUseCase<M, R, A, U, O>
where
    M: MerchantRepository,
    R: MenuRepository,
    A: AddonRepository,
    U: UserRepository,
    O: OrderRepository,
{
    pub merchants: M,
    pub menus: R,
    pub addons: A,
    pub users: U,
    pub orders: O,
}

impl<M, R, A, U, O> PlaceOrderUseCase<M, R, A, U, O>
where
    M: MerchantRepository,
    R: MenuRepository,
    A: AddonRepository,
    U: UserRepository,
    O: OrderRepository,
{
    pub async fn execute(&self, input: PlaceOrderInput) -> Result<OrderDetail, ApiError> {
        if input.merchant_code.trim().is_empty() {
            return Err(ApiError::validation("merchant code is required"));
        }
        let merchant = match normalize_merchant_code(&input.merchant_code) {
            Some(code) => self.merchants.find_by_code(&code).await?,
            None => None,
        }
        .filter(|m| m.is_active)
        .ok_or(ApiError::MerchantInactive)?;
        if !merchant.is_open {
            return Err(ApiError::MerchantClosed);
        }

        let customer_name = input.customer_name.trim().to_owned();
        let customer_email = normalize_email(&input.customer_email);
        if customer_name.is_empty() || customer_email.is_empty() {
            return Err(ApiError::validation("customer name and email are required"));
        }
        if !is_valid_email(&customer_email) {
            return Err(ApiError::InvalidEmail);
        }
        let order_type: OrderType = input.order_type.parse().map_err(|_| {
            ApiError::validation("valid order type is required (DINE_IN or TAKEAWAY)")
        })?;
        validate_lines(&input.items)?;

        let catalog = self.load_catalog(merchant.id, &input.items).await?;
        let items = price_lines(&catalog, &input.items)?;
        let subtotal: Decimal = items.iter().map(|i| i.subtotal).sum();
        let totals = merchant.charge_policy().totals(subtotal);

        let customer_phone = input
            .customer_phone
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty());
        let customer = find_or_register_customer(
            &self.users,
            &customer_email,
            &customer_name,
            customer_phone.as_deref(),
        )
        .await?;

        let now = Utc::now();
        let mut new_order = NewOrder {
            merchant_id: merchant.id,
            customer_id: customer.map(|c| c.id),
            order_number: String::new(),
            order_type,
            table_number: input
                .table_number
                .map(|t| t.trim().to_owned())
                .filter(|t| !t.is_empty()),
            customer_name,
            customer_email,
            customer_phone,
            notes: input.notes.filter(|n| !n.trim().is_empty()),
            totals,
            items,
            placed_at: now,
        };
        let order = self.create_with_fresh_number(&mut new_order, &merchant.code).await?;

        info!(
            merchant_id = merchant.id,
            order_id = order.id,
            order_number = %order.order_number,
            total = %order.total_amount,
            "order placed"
        );
        self.orders
            .find_by_number(&order.order_number)
            .await?
            .ok_or(ApiError::OrderNotFound)
    }

    async fn load_catalog(
        &self,
        merchant_id: i64,
        lines: &[OrderLineInput],
    ) -> Result<CatalogSnapshot, ApiError> {
        let mut menu_ids: Vec<i64> = lines.iter().map(|l| l.menu_id).collect();
        menu_ids.sort_unstable();
        menu_ids.dedup();

        let menus = self.menus.find_many(merchant_id, &menu_ids).await?;
        let found: Vec<i64> = menus.iter().map(|m| m.id).collect();
        if found.is_empty() {
            return Ok(CatalogSnapshot {
                menus,
                ..Default::default()
            });
        }
        let links = self.menus.addon_links(&found).await?;

        let mut category_ids: Vec<i64> = links.iter().map(|l| l.addon_category_id).collect();
        category_ids.sort_unstable();
        category_ids.dedup();
        if category_ids.is_empty() {
            return Ok(CatalogSnapshot {
                menus,
                links,
                ..Default::default()
            });
        }
        let addon_categories = self
            .addons
            .find_categories(merchant_id, &category_ids)
            .await?;
        let addon_items = self.addons.items_by_categories(&category_ids).await?;

        Ok(CatalogSnapshot {
            menus,
            links,
            addon_categories,
            addon_items,
        })
    }

    /// Insert with a new random number, retrying when the unique index rejects it.
    async fn create_with_fresh_number(
        &self,
        order: &mut NewOrder,
        merchant_code: &str,
    ) -> Result<Order, ApiError> {
        for attempt in 1..=ORDER_NUMBER_ATTEMPTS {
            order.order_number = generate_order_number(merchant_code, order.placed_at);
            match self.orders.create(order).await {
                Err(ApiError::OrderNumberTaken) => {
                    warn!(attempt, order_number = %order.order_number, "order number collision");
                }
                result => return result,
            }
        }
        Err(anyhow::anyhow!("could not allocate a unique order number").into())
    }
}

// ── GetOrderByNumber ─────────────────────────────────────────────────────────

pub struct GetOrderByNumberUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> GetOrderByNumberUseCase<O> {
    pub async fn execute(&self, order_number: &str) -> Result<OrderDetail, ApiError> {
        self.orders
            .find_by_number(order_number.trim())
            .await?
            .ok_or(ApiError::OrderNotFound)
    }
}

// ── Merchant orders ──────────────────────────────────────────────────────────

pub struct ListMerchantOrdersUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> ListMerchantOrdersUseCase<O> {
    pub async fn execute(
        &self,
        scope: &MerchantScope,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Paginated<Order>, ApiError> {
        let page = page.clamped();
        let (items, total) = self
            .orders
            .list_for_merchant(scope.merchant_id, status, page)
            .await?;
        Ok(Paginated::new(items, page, total))
    }
}

pub struct GetMerchantOrderUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> GetMerchantOrderUseCase<O> {
    pub async fn execute(&self, scope: &MerchantScope, id: i64) -> Result<OrderDetail, ApiError> {
        self.orders
            .find_for_merchant(scope.merchant_id, id)
            .await?
            .ok_or(ApiError::OrderNotFound)
    }
}

pub struct UpdateOrderStatusUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> UpdateOrderStatusUseCase<O> {
    pub async fn execute(
        &self,
        scope: &MerchantScope,
        id: i64,
        status: OrderStatus,
        note: Option<String>,
    ) -> Result<Order, ApiError> {
        let detail = self
            .orders
            .find_for_merchant(scope.merchant_id, id)
            .await?
            .ok_or(ApiError::OrderNotFound)?;
        let from = detail.order.status;
        if !from.can_transition_to(status) {
            return Err(ApiError::InvalidStatusTransition {
                from: from.to_string(),
                to: status.to_string(),
            });
        }

        let order = self
            .orders
            .update_status(&StatusUpdate {
                order_id: id,
                from,
                to: status,
                note: note.filter(|n| !n.trim().is_empty()),
                changed_by: scope.ctx.user_id,
                at: Utc::now(),
            })
            .await?;
        info!(
            merchant_id = scope.merchant_id,
            order_id = id,
            from = %from,
            to = %status,
            user_id = scope.ctx.user_id,
            "order status changed"
        );
        Ok(order)
    }
}
