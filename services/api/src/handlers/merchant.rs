use axum::extract::State;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tabletop_core::envelope::ApiResponse;

use crate::domain::types::MerchantPatch;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, MerchantStaff};
use crate::handlers::views::{MerchantResponse, date_string};
use crate::state::AppState;
use crate::usecase::merchant::{GetProfileUseCase, ToggleOpenUseCase, UpdateProfileUseCase};
use crate::usecase::revenue::{
    DailyRevenue, RevenueData, RevenueKind, RevenueQuery, RevenueUseCase, parse_date,
};

// ── GET /api/merchant/profile ────────────────────────────────────────────────

pub async fn get_profile(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
) -> Result<ApiResponse<MerchantResponse>, ApiError> {
    let usecase = GetProfileUseCase {
        merchants: state.merchant_repo(),
    };
    let merchant = usecase.execute(&scope).await?;
    Ok(ApiResponse::ok(merchant.into(), "Merchant profile retrieved"))
}

// ── PUT /api/merchant/profile ────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
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

pub async fn update_profile(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UpdateProfileRequest>,
) -> Result<ApiResponse<MerchantResponse>, ApiError> {
    let usecase = UpdateProfileUseCase {
        merchants: state.merchant_repo(),
    };
    let patch = MerchantPatch {
        code: None,
        name: body.name,
        description: body.description,
        address: body.address,
        phone: body.phone,
        email: body.email,
        currency: body.currency,
        tax_rate: body.tax_rate,
        tax_included: body.tax_included,
        service_charge_rate: body.service_charge_rate,
    };
    let merchant = usecase.execute(&scope, patch).await?;
    Ok(ApiResponse::ok(merchant.into(), "Merchant profile updated"))
}

// ── PUT /api/merchant/toggle-open ────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOpenRequest {
    pub is_open: Option<bool>,
}

pub async fn toggle_open(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ToggleOpenRequest>,
) -> Result<ApiResponse<MerchantResponse>, ApiError> {
    let is_open = body
        .is_open
        .ok_or_else(|| ApiError::validation("isOpen must be a boolean"))?;
    let usecase = ToggleOpenUseCase {
        merchants: state.merchant_repo(),
    };
    let merchant = usecase.execute(&scope, is_open).await?;
    let message = if merchant.is_open {
        "Store opened"
    } else {
        "Store closed"
    };
    Ok(ApiResponse::ok(merchant.into(), message))
}

// ── GET /api/merchant/revenue ────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl RevenueParams {
    fn into_query(self) -> Result<RevenueQuery, ApiError> {
        let start_date = self
            .start_date
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_date("startDate", &s))
            .transpose()?;
        let end_date = self
            .end_date
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_date("endDate", &s))
            .transpose()?;
        let kind = match self.kind.as_deref().map(str::trim) {
            None | Some("") => RevenueKind::default(),
            Some(raw) => raw.parse()?,
        };
        Ok(RevenueQuery {
            start_date,
            end_date,
            kind,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenueResponse {
    #[serde(serialize_with = "date_string")]
    pub date: NaiveDate,
    pub total_orders: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
}

impl From<DailyRevenue> for DailyRevenueResponse {
    fn from(d: DailyRevenue) -> Self {
        Self {
            date: d.date,
            total_orders: d.total_orders,
            total_revenue: d.total_revenue,
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RevenueResponse {
    #[serde(rename_all = "camelCase")]
    Daily {
        #[serde(serialize_with = "date_string")]
        start_date: NaiveDate,
        #[serde(serialize_with = "date_string")]
        end_date: NaiveDate,
        report: Vec<DailyRevenueResponse>,
    },
    #[serde(rename_all = "camelCase")]
    Total {
        #[serde(serialize_with = "date_string")]
        start_date: NaiveDate,
        #[serde(serialize_with = "date_string")]
        end_date: NaiveDate,
        total_orders: u64,
        #[serde(with = "rust_decimal::serde::float")]
        total_revenue: Decimal,
        #[serde(with = "rust_decimal::serde::float")]
        average_order_value: Decimal,
    },
}

pub async fn revenue(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<RevenueParams>,
) -> Result<ApiResponse<RevenueResponse>, ApiError> {
    let usecase = RevenueUseCase {
        orders: state.order_repo(),
    };
    let report = usecase.execute(&scope, params.into_query()?).await?;
    let body = match report.data {
        RevenueData::Daily(days) => RevenueResponse::Daily {
            start_date: report.start_date,
            end_date: report.end_date,
            report: days.into_iter().map(Into::into).collect(),
        },
        RevenueData::Total(totals) => RevenueResponse::Total {
            start_date: report.start_date,
            end_date: report.end_date,
            total_orders: totals.total_orders,
            total_revenue: totals.total_revenue,
            average_order_value: totals.average_order_value,
        },
    };
    Ok(ApiResponse::ok(body, "Revenue report retrieved"))
}
