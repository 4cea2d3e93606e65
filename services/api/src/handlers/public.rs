use axum::extract::State;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tabletop_core::envelope::ApiResponse;
use tabletop_domain::role::UserRole;

use crate::domain::types::Merchant;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CustomerIdentity};
use crate::handlers::catalog::CategoriesResponse;
use crate::handlers::views::{
    AddonCategoryResponse, MenuResponse, OrderDetailResponse, OrderResponse,
};
use crate::state::AppState;
use crate::usecase::catalog::{
    PublicAddonGroup, PublicCategoriesUseCase, PublicMenu, PublicMenusUseCase,
    PublicMerchantUseCase,
};
use crate::usecase::customer::{CustomerLoginInput, CustomerLoginUseCase, CustomerOrdersUseCase};
use crate::usecase::order::{
    GetOrderByNumberUseCase, OrderLineInput, PlaceOrderInput, PlaceOrderUseCase,
};

// ── POST /api/public/auth/customer-login ─────────────────────────────────────

#[derive(Deserialize)]
pub struct CustomerLoginRequest {
    #[serde(default)]
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Serialize)]
pub struct CustomerResponse {
    #[serde(serialize_with = "tabletop_core::serde::id_to_string")]
    pub id: i64,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerLoginResponse {
    pub access_token: String,
    /// Milliseconds since the UNIX epoch.
    pub expires_at: i64,
    pub user: CustomerResponse,
}

pub async fn customer_login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CustomerLoginRequest>,
) -> Result<ApiResponse<CustomerLoginResponse>, ApiError> {
    let usecase = CustomerLoginUseCase {
        users: state.user_repo(),
        tokens: state.tokens.clone(),
    };
    let out = usecase
        .execute(CustomerLoginInput {
            email: body.email,
            name: body.name,
            phone: body.phone,
        })
        .await?;
    let message = if out.created {
        "Customer registered"
    } else {
        "Login successful"
    };
    let customer = out.customer;
    Ok(ApiResponse::ok(
        CustomerLoginResponse {
            access_token: out.token.token,
            expires_at: out.token.expires_at * 1000,
            user: CustomerResponse {
                id: customer.id,
                email: customer.email,
                name: customer.name,
                phone: customer.phone,
                role: customer.role,
            },
        },
        message,
    ))
}

// ── GET /api/public/merchants/{code} ─────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicMerchantResponse {
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
    pub is_open: bool,
}

impl From<Merchant> for PublicMerchantResponse {
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
            is_open: m.is_open,
        }
    }
}

pub async fn public_merchant(
    State(state): State<AppState>,
    ApiPath(code): ApiPath<String>,
) -> Result<ApiResponse<PublicMerchantResponse>, ApiError> {
    let usecase = PublicMerchantUseCase {
        merchants: state.merchant_repo(),
    };
    let merchant = usecase.execute(&code).await?;
    Ok(ApiResponse::ok(merchant.into(), "Merchant retrieved"))
}

// ── GET /api/public/merchants/{code}/categories ──────────────────────────────

pub async fn public_categories(
    State(state): State<AppState>,
    ApiPath(code): ApiPath<String>,
) -> Result<ApiResponse<CategoriesResponse>, ApiError> {
    let usecase = PublicCategoriesUseCase {
        merchants: state.merchant_repo(),
        categories: state.category_repo(),
    };
    let categories = usecase
        .execute(&code)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(ApiResponse::ok(
        CategoriesResponse { categories },
        "Categories retrieved",
    ))
}

// ── GET /api/public/merchants/{code}/menus ───────────────────────────────────

#[derive(Deserialize)]
pub struct PublicMenusQuery {
    pub category: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonGroupResponse {
    #[serde(flatten)]
    pub category: AddonCategoryResponse,
    pub is_required: bool,
    pub display_order: i32,
}

impl From<PublicAddonGroup> for AddonGroupResponse {
    fn from(g: PublicAddonGroup) -> Self {
        Self {
            category: AddonCategoryResponse::with_items(g.category, Some(g.items)),
            is_required: g.link.is_required,
            display_order: g.link.display_order,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicMenuResponse {
    #[serde(flatten)]
    pub menu: MenuResponse,
    #[serde(serialize_with = "tabletop_core::serde::ids_to_strings")]
    pub category_ids: Vec<i64>,
    pub addon_categories: Vec<AddonGroupResponse>,
}

impl From<PublicMenu> for PublicMenuResponse {
    fn from(m: PublicMenu) -> Self {
        Self {
            menu: m.menu.into(),
            category_ids: m.category_ids,
            addon_categories: m.addon_groups.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize)]
pub struct PublicMenusResponse {
    pub menus: Vec<PublicMenuResponse>,
}

pub async fn public_menus(
    State(state): State<AppState>,
    ApiPath(code): ApiPath<String>,
    ApiQuery(query): ApiQuery<PublicMenusQuery>,
) -> Result<ApiResponse<PublicMenusResponse>, ApiError> {
    let usecase = PublicMenusUseCase {
        merchants: state.merchant_repo(),
        menus: state.menu_repo(),
        addons: state.addon_repo(),
    };
    let menus = usecase
        .execute(&code, query.category)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(ApiResponse::ok(
        PublicMenusResponse { menus },
        "Menus retrieved",
    ))
}

// ── POST /api/public/orders ──────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    #[serde(deserialize_with = "tabletop_core::serde::id_from_str_or_int")]
    pub menu_id: i64,
    pub quantity: i64,
    #[serde(default, deserialize_with = "tabletop_core::serde::ids_from_str_or_int")]
    pub selected_addons: Vec<i64>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub merchant_code: String,
    #[serde(default)]
    pub order_type: String,
    pub table_number: Option<String>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderLineRequest>,
}

impl From<PlaceOrderRequest> for PlaceOrderInput {
    fn from(r: PlaceOrderRequest) -> Self {
        Self {
            merchant_code: r.merchant_code,
            order_type: r.order_type,
            table_number: r.table_number,
            customer_name: r.customer_name,
            customer_email: r.customer_email,
            customer_phone: r.customer_phone,
            notes: r.notes,
            items: r
                .items
                .into_iter()
                .map(|line| OrderLineInput {
                    menu_id: line.menu_id,
                    quantity: line.quantity,
                    selected_addons: line.selected_addons,
                    notes: line.notes,
                })
                .collect(),
        }
    }
}

pub async fn place_order(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PlaceOrderRequest>,
) -> Result<ApiResponse<OrderDetailResponse>, ApiError> {
    let usecase = PlaceOrderUseCase {
        merchants: state.merchant_repo(),
        menus: state.menu_repo(),
        addons: state.addon_repo(),
        users: state.user_repo(),
        orders: state.order_repo(),
    };
    let detail = usecase.execute(body.into()).await?;
    Ok(ApiResponse::created(detail.into(), "Order placed"))
}

// ── GET /api/public/orders/{orderNumber} ─────────────────────────────────────

pub async fn order_by_number(
    State(state): State<AppState>,
    ApiPath(order_number): ApiPath<String>,
) -> Result<ApiResponse<OrderDetailResponse>, ApiError> {
    let usecase = GetOrderByNumberUseCase {
        orders: state.order_repo(),
    };
    let detail = usecase.execute(&order_number).await?;
    Ok(ApiResponse::ok(detail.into(), "Order retrieved"))
}

// ── GET /api/customer/orders ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct CustomerOrdersResponse {
    pub orders: Vec<OrderResponse>,
}

pub async fn customer_orders(
    CustomerIdentity(customer): CustomerIdentity,
    State(state): State<AppState>,
) -> Result<ApiResponse<CustomerOrdersResponse>, ApiError> {
    let usecase = CustomerOrdersUseCase {
        orders: state.order_repo(),
    };
    let orders = usecase
        .execute(customer.customer_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(ApiResponse::ok(
        CustomerOrdersResponse { orders },
        "Orders retrieved",
    ))
}
