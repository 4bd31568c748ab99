//! Business unit and point-of-sale handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        ClosePeriodRequest, CreateBusinessUnitRequest, CreatePointOfSaleRequest, ListQuery,
        ReorderBusinessUnitsRequest, UpdateBusinessUnitRequest,
    },
    middleware::Actor,
    models::{BusinessUnit, ClosedPeriod, PointOfSale},
    AppState,
};

pub async fn list_business_units(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<BusinessUnit>>, AppError> {
    let units = state
        .ledger
        .list_business_units(query.include_inactive.unwrap_or(false))
        .await?;
    Ok(Json(units))
}

pub async fn create_business_unit(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreateBusinessUnitRequest>,
) -> Result<(StatusCode, Json<BusinessUnit>), AppError> {
    let unit = state
        .ledger
        .create_business_unit(payload, actor.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(unit)))
}

pub async fn get_business_unit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BusinessUnit>, AppError> {
    Ok(Json(state.ledger.get_business_unit(id).await?))
}

pub async fn update_business_unit(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBusinessUnitRequest>,
) -> Result<Json<BusinessUnit>, AppError> {
    let unit = state
        .ledger
        .update_business_unit(id, payload, actor.as_deref())
        .await?;
    Ok(Json(unit))
}

pub async fn deactivate_business_unit(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<BusinessUnit>, AppError> {
    let unit = state
        .ledger
        .deactivate_business_unit(id, actor.as_deref())
        .await?;
    Ok(Json(unit))
}

pub async fn reorder_business_units(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<ReorderBusinessUnitsRequest>,
) -> Result<Json<Vec<BusinessUnit>>, AppError> {
    payload.validate()?;
    let units = state
        .ledger
        .reorder_business_units(&payload.ids, actor.as_deref())
        .await?;
    Ok(Json(units))
}

pub async fn list_points_of_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PointOfSale>>, AppError> {
    let points = state
        .ledger
        .list_points_of_sale(id, query.include_inactive.unwrap_or(false))
        .await?;
    Ok(Json(points))
}

pub async fn create_point_of_sale(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreatePointOfSaleRequest>,
) -> Result<(StatusCode, Json<PointOfSale>), AppError> {
    let point = state
        .ledger
        .create_point_of_sale(id, payload, actor.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(point)))
}

pub async fn deactivate_point_of_sale(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<PointOfSale>, AppError> {
    let point = state
        .ledger
        .deactivate_point_of_sale(id, actor.as_deref())
        .await?;
    Ok(Json(point))
}

pub async fn close_period(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClosePeriodRequest>,
) -> Result<Json<ClosedPeriod>, AppError> {
    tracing::info!(business_unit_id = %id, label = %payload.label, "Closing period");
    let closed = state
        .ledger
        .close_period(id, payload, actor.as_deref())
        .await?;
    Ok(Json(closed))
}
