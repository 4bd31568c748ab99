//! Balance, sales and dashboard handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use service_core::error::AppError;

use crate::{
    dtos::{ActivityQuery, BalanceQuery, DailySalesQuery, DashboardQuery, SeriesQuery},
    models::{ActivityItem, BalanceSummary, DailySales, DashboardSummary, SeriesPoint, UnitBalance},
    AppState,
};

fn today_or(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Utc::now().date_naive())
}

/// Balance of one unit, or of every active unit when none is given.
pub async fn get_balance(
    State(state): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceSummary>, AppError> {
    let summary = match query.business_unit_id {
        Some(id) => state.aggregation.get_balance(id, query.from, query.to).await?,
        None => {
            state
                .aggregation
                .get_global_balance(query.from, query.to)
                .await?
        }
    };
    Ok(Json(summary))
}

pub async fn unit_balances(
    State(state): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<Vec<UnitBalance>>, AppError> {
    Ok(Json(
        state.aggregation.unit_balances(query.from, query.to).await?,
    ))
}

pub async fn daily_sales(
    State(state): State<AppState>,
    Query(query): Query<DailySalesQuery>,
) -> Result<Json<Vec<DailySales>>, AppError> {
    let sales = state
        .aggregation
        .daily_sales(
            query.business_unit_id,
            query.days.unwrap_or(7),
            today_or(query.date),
        )
        .await?;
    Ok(Json(sales))
}

pub async fn sales_series(
    State(state): State<AppState>,
    Query(query): Query<SeriesQuery>,
) -> Result<Json<Vec<SeriesPoint>>, AppError> {
    let series = state
        .aggregation
        .sales_series(
            query.business_unit_id,
            query.granularity.unwrap_or_default(),
            today_or(query.date),
        )
        .await?;
    Ok(Json(series))
}

pub async fn activity_feed(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<ActivityItem>>, AppError> {
    let items = state
        .aggregation
        .activity_feed(query.business_unit_id, query.limit)
        .await?;
    Ok(Json(items))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardSummary>, AppError> {
    Ok(Json(
        state.aggregation.dashboard(today_or(query.date)).await?,
    ))
}
