use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;

use tabletop_domain::pricing::round_money;

use crate::domain::repository::OrderRepository;
use crate::domain::types::RevenueEntry;
use crate::error::ApiError;
use crate::usecase::auth_context::MerchantScope;

/// Days covered when no start date is given.
pub const DEFAULT_RANGE_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevenueKind {
    Daily,
    #[default]
    Total,
}

impl RevenueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Total => "total",
        }
    }
}

impl FromStr for RevenueKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "total" => Ok(Self::Total),
            _ => Err(ApiError::validation("type must be daily or total")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevenueTotals {
    pub total_orders: u64,
    pub total_revenue: Decimal,
    pub average_order_value: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub total_orders: u64,
    pub total_revenue: Decimal,
}

pub fn total_revenue(entries: &[RevenueEntry]) -> RevenueTotals {
    let total_orders = entries.len() as u64;
    let total_revenue: Decimal = entries.iter().map(|e| e.total_amount).sum();
    let average_order_value = if total_orders == 0 {
        Decimal::ZERO
    } else {
        round_money(total_revenue / Decimal::from(total_orders))
    };
    RevenueTotals {
        total_orders,
        total_revenue,
        average_order_value,
    }
}

/// One row per UTC day that has orders, ascending.
pub fn daily_revenue(entries: &[RevenueEntry]) -> Vec<DailyRevenue> {
    let mut days: BTreeMap<NaiveDate, (u64, Decimal)> = BTreeMap::new();
    for entry in entries {
        let day = days.entry(entry.placed_at.date_naive()).or_default();
        day.0 += 1;
        day.1 += entry.total_amount;
    }
    days.into_iter()
        .map(|(date, (total_orders, total_revenue))| DailyRevenue {
            date,
            total_orders,
            total_revenue,
        })
        .collect()
}

pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("{field} must be a date (YYYY-MM-DD)")))
}

/// Inclusive date range resolved to `[start 00:00, end 23:59:59.999]` UTC.
pub fn resolve_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate, DateTime<Utc>, DateTime<Utc>), ApiError> {
    let end = end.unwrap_or(today);
    let start = start.unwrap_or(end - Duration::days(DEFAULT_RANGE_DAYS));
    if start > end {
        return Err(ApiError::validation("startDate must not be after endDate"));
    }
    let from = start.and_time(NaiveTime::MIN).and_utc();
    let to = (end + Duration::days(1)).and_time(NaiveTime::MIN).and_utc() - Duration::milliseconds(1);
    Ok((start, end, from, to))
}

#[derive(Debug, Clone, Default)]
pub struct RevenueQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub kind: RevenueKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevenueData {
    Daily(Vec<DailyRevenue>),
    Total(RevenueTotals),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevenueReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub data: RevenueData,
}

pub struct RevenueUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> RevenueUseCase<O> {
    pub async fn execute(
        &self,
        scope: &MerchantScope,
        query: RevenueQuery,
    ) -> Result<RevenueReport, ApiError> {
        let today = Utc::now().date_naive();
        let (start_date, end_date, from, to) =
            resolve_range(query.start_date, query.end_date, today)?;
        let entries = self
            .orders
            .completed_between(scope.merchant_id, from, to)
            .await?;
        let data = match query.kind {
            RevenueKind::Daily => RevenueData::Daily(daily_revenue(&entries)),
            RevenueKind::Total => RevenueData::Total(total_revenue(&entries)),
        };
        Ok(RevenueReport {
            start_date,
            end_date,
            data,
        })
    }
}
