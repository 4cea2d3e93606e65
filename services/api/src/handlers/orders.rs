use axum::extract::State;
use serde::{Deserialize, Serialize};

use tabletop_core::envelope::ApiResponse;
use tabletop_domain::order::OrderStatus;
use tabletop_domain::pagination::PageRequest;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, MerchantStaff};
use crate::handlers::views::{OrderDetailResponse, OrderResponse, PaginationResponse, page_parts};
use crate::state::AppState;
use crate::usecase::order::{
    GetMerchantOrderUseCase, ListMerchantOrdersUseCase, UpdateOrderStatusUseCase,
};

// ── GET /api/merchant/orders ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct OrdersPageResponse {
    pub orders: Vec<OrderResponse>,
    pub pagination: PaginationResponse,
}

pub async fn list_orders(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListOrdersQuery>,
) -> Result<ApiResponse<OrdersPageResponse>, ApiError> {
    let usecase = ListMerchantOrdersUseCase {
        orders: state.order_repo(),
    };
    let page = usecase
        .execute(&scope, query.status, PageRequest::new(query.page, query.limit))
        .await?;
    let (orders, pagination) = page_parts(page, OrderResponse::from);
    Ok(ApiResponse::ok(
        OrdersPageResponse { orders, pagination },
        "Orders retrieved",
    ))
}

// ── GET /api/merchant/orders/{id} ────────────────────────────────────────────

pub async fn get_order(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<OrderDetailResponse>, ApiError> {
    let usecase = GetMerchantOrderUseCase {
        orders: state.order_repo(),
    };
    let detail = usecase.execute(&scope, id).await?;
    Ok(ApiResponse::ok(detail.into(), "Order retrieved"))
}

// ── PUT /api/merchant/orders/{id}/status ─────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
    pub note: Option<String>,
}

pub async fn update_order_status(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateStatusRequest>,
) -> Result<ApiResponse<OrderResponse>, ApiError> {
    let status: OrderStatus = body
        .status
        .trim()
        .parse()
        .map_err(|_| ApiError::validation("status must be a valid order status"))?;
    let usecase = UpdateOrderStatusUseCase {
        orders: state.order_repo(),
    };
    let order = usecase.execute(&scope, id, status, body.note).await?;
    let message = format!("Order status updated to {}", order.status.label());
    Ok(ApiResponse::ok(order.into(), message))
}
