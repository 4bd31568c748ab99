//! Partner and partner account handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{CreatePartnerRequest, ListQuery, OpenPartnerAccountRequest, UpdatePartnerRequest},
    middleware::Actor,
    models::{Partner, PartnerAccount},
    AppState,
};

pub async fn list_partners(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Partner>>, AppError> {
    let partners = state
        .partners
        .list_partners(query.include_inactive.unwrap_or(false))
        .await?;
    Ok(Json(partners))
}

pub async fn create_partner(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreatePartnerRequest>,
) -> Result<(StatusCode, Json<Partner>), AppError> {
    let partner = state
        .partners
        .create_partner(payload, actor.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(partner)))
}

pub async fn update_partner(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePartnerRequest>,
) -> Result<Json<Partner>, AppError> {
    let partner = state
        .partners
        .update_partner(id, payload, actor.as_deref())
        .await?;
    Ok(Json(partner))
}

pub async fn deactivate_partner(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Partner>, AppError> {
    let partner = state
        .partners
        .deactivate_partner(id, actor.as_deref())
        .await?;
    Ok(Json(partner))
}

pub async fn change_managing_partner(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Partner>, AppError> {
    let partner = state
        .partners
        .change_managing_partner(id, actor.as_deref())
        .await?;
    Ok(Json(partner))
}

pub async fn list_accounts(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PartnerAccount>>, AppError> {
    Ok(Json(state.partners.list_accounts(id).await?))
}

pub async fn open_account(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<OpenPartnerAccountRequest>,
) -> Result<(StatusCode, Json<PartnerAccount>), AppError> {
    let account = state
        .partners
        .open_account(id, payload, actor.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}
