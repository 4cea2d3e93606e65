use axum::extract::State;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tabletop_core::envelope::ApiResponse;
use tabletop_domain::pagination::PageRequest;
use tabletop_domain::role::UserRole;

use crate::domain::types::{MerchantPatch, UserPatch};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, SuperAdmin};
use crate::handlers::views::{MerchantResponse, PaginationResponse, UserResponse, page_parts};
use crate::state::AppState;
use crate::usecase::admin::{
    CreateMerchantInput, CreateMerchantUseCase, DeleteUserUseCase, GetMerchantUseCase,
    GetUserUseCase, ListMerchantsUseCase, ListUsersUseCase, ToggleMerchantUseCase,
    UpdateMerchantUseCase, UpdateUserUseCase,
};

// ── GET /api/admin/merchants ─────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMerchantsQuery {
    pub active_only: Option<bool>,
}

#[derive(Serialize)]
pub struct MerchantsResponse {
    pub merchants: Vec<MerchantResponse>,
}

pub async fn list_merchants(
    _admin: SuperAdmin,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListMerchantsQuery>,
) -> Result<ApiResponse<MerchantsResponse>, ApiError> {
    let usecase = ListMerchantsUseCase {
        merchants: state.merchant_repo(),
    };
    let merchants = usecase
        .execute(query.active_only.unwrap_or(false))
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(ApiResponse::ok(
        MerchantsResponse { merchants },
        "Merchants retrieved",
    ))
}

// ── POST /api/admin/merchants ────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMerchantRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub currency: Option<String>,
    pub tax_rate: Option<Decimal>,
    pub tax_included: Option<bool>,
    pub service_charge_rate: Option<Decimal>,
    #[serde(default)]
    pub owner_name: String,
    #[serde(default)]
    pub owner_email: String,
    pub owner_phone: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMerchantResponse {
    pub merchant: MerchantResponse,
    pub owner: UserResponse,
    pub temp_password: String,
}

pub async fn create_merchant(
    _admin: SuperAdmin,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateMerchantRequest>,
) -> Result<ApiResponse<CreateMerchantResponse>, ApiError> {
    let usecase = CreateMerchantUseCase {
        merchants: state.merchant_repo(),
        users: state.user_repo(),
    };
    let out = usecase
        .execute(CreateMerchantInput {
            code: body.code,
            name: body.name,
            description: body.description,
            address: body.address,
            phone: body.phone,
            email: body.email,
            currency: body.currency,
            tax_rate: body.tax_rate,
            tax_included: body.tax_included,
            service_charge_rate: body.service_charge_rate,
            owner_name: body.owner_name,
            owner_email: body.owner_email,
            owner_phone: body.owner_phone,
        })
        .await?;
    Ok(ApiResponse::created(
        CreateMerchantResponse {
            merchant: out.merchant.into(),
            owner: out.owner.into(),
            temp_password: out.temp_password,
        },
        "Merchant created",
    ))
}

// ── GET /api/admin/merchants/{id} ────────────────────────────────────────────

pub async fn get_merchant(
    _admin: SuperAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<MerchantResponse>, ApiError> {
    let usecase = GetMerchantUseCase {
        merchants: state.merchant_repo(),
    };
    let merchant = usecase.execute(id).await?;
    Ok(ApiResponse::ok(merchant.into(), "Merchant retrieved"))
}

// ── PUT /api/admin/merchants/{id} ────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMerchantRequest {
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

impl From<UpdateMerchantRequest> for MerchantPatch {
    fn from(r: UpdateMerchantRequest) -> Self {
        Self {
            code: r.code,
            name: r.name,
            description: r.description,
            address: r.address,
            phone: r.phone,
            email: r.email,
            currency: r.currency,
            tax_rate: r.tax_rate,
            tax_included: r.tax_included,
            service_charge_rate: r.service_charge_rate,
        }
    }
}

pub async fn update_merchant(
    _admin: SuperAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateMerchantRequest>,
) -> Result<ApiResponse<MerchantResponse>, ApiError> {
    let usecase = UpdateMerchantUseCase {
        merchants: state.merchant_repo(),
    };
    let merchant = usecase.execute(id, body.into()).await?;
    Ok(ApiResponse::ok(merchant.into(), "Merchant updated"))
}

// ── POST /api/admin/merchants/{id}/toggle ────────────────────────────────────

pub async fn toggle_merchant(
    _admin: SuperAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<MerchantResponse>, ApiError> {
    let usecase = ToggleMerchantUseCase {
        merchants: state.merchant_repo(),
    };
    let merchant = usecase.execute(id).await?;
    let message = if merchant.is_active {
        "Merchant activated"
    } else {
        "Merchant deactivated"
    };
    Ok(ApiResponse::ok(merchant.into(), message))
}

// ── GET /api/admin/users ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<UserRole>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserResponse>,
    pub pagination: PaginationResponse,
}

pub async fn list_users(
    _admin: SuperAdmin,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListUsersQuery>,
) -> Result<ApiResponse<UsersResponse>, ApiError> {
    let usecase = ListUsersUseCase {
        users: state.user_repo(),
    };
    let page = usecase
        .execute(query.role, PageRequest::new(query.page, query.limit))
        .await?;
    let (users, pagination) = page_parts(page, UserResponse::from);
    Ok(ApiResponse::ok(
        UsersResponse { users, pagination },
        "Users retrieved",
    ))
}

// ── GET /api/admin/users/{id} ────────────────────────────────────────────────

pub async fn get_user(
    _admin: SuperAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let usecase = GetUserUseCase {
        users: state.user_repo(),
    };
    let user = usecase.execute(id).await?;
    Ok(ApiResponse::ok(user.into(), "User retrieved"))
}

// ── PUT /api/admin/users/{id} ────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

pub async fn update_user(
    _admin: SuperAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let usecase = UpdateUserUseCase {
        users: state.user_repo(),
    };
    let user = usecase
        .execute(
            id,
            UserPatch {
                name: body.name,
                email: body.email,
                phone: body.phone,
                role: body.role,
                is_active: body.is_active,
            },
        )
        .await?;
    Ok(ApiResponse::ok(user.into(), "User updated"))
}

// ── DELETE /api/admin/users/{id} ─────────────────────────────────────────────

pub async fn delete_user(
    SuperAdmin(admin): SuperAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    let usecase = DeleteUserUseCase {
        users: state.user_repo(),
        sessions: state.session_repo(),
    };
    usecase.execute(&admin, id).await?;
    Ok(ApiResponse::ok((), "User deactivated"))
}
