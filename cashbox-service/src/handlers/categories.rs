use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{CreateCategoryRequest, ListQuery, UpdateCategoryRequest},
    middleware::Actor,
    models::MovementCategory,
    AppState,
};

pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<MovementCategory>>, AppError> {
    let categories = state
        .ledger
        .list_categories(query.movement_type, query.include_inactive.unwrap_or(false))
        .await?;
    Ok(Json(categories))
}

pub async fn create_category(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<MovementCategory>), AppError> {
    let category = state
        .ledger
        .create_category(payload, actor.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<Json<MovementCategory>, AppError> {
    let category = state
        .ledger
        .update_category(id, payload, actor.as_deref())
        .await?;
    Ok(Json(category))
}
