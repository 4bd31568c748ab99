//! Cash movement handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{MovementListResponse, MovementQuery, RecordMovementRequest},
    middleware::Actor,
    models::{CashMovement, MovementFilter},
    AppState,
};

/// List movements, newest first, with range pagination.
pub async fn list_movements(
    State(state): State<AppState>,
    Query(query): Query<MovementQuery>,
) -> Result<Json<MovementListResponse<CashMovement>>, AppError> {
    let filter = MovementFilter::from(query);
    let (offset, limit) = (filter.offset, filter.limit);
    let movements = state.ledger.list_movements(filter).await?;

    Ok(Json(MovementListResponse {
        movements,
        offset,
        limit,
    }))
}

pub async fn record_movement(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<RecordMovementRequest>,
) -> Result<(StatusCode, Json<CashMovement>), AppError> {
    tracing::info!(
        business_unit_id = %payload.business_unit_id,
        movement_type = %payload.movement_type,
        amount = %payload.amount,
        "Recording movement"
    );

    let movement = state
        .ledger
        .record_movement(payload, actor.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

pub async fn get_movement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CashMovement>, AppError> {
    Ok(Json(state.ledger.get_movement(id).await?))
}

/// Soft-delete a movement. Only the last movement of its unit is deletable.
pub async fn delete_movement(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<CashMovement>, AppError> {
    let movement = state.ledger.get_movement(id).await?;
    let deleted = state
        .ledger
        .delete_last_movement(movement.business_unit_id, id, actor.as_deref())
        .await?;
    Ok(Json(deleted))
}
