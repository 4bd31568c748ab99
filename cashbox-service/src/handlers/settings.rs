//! App settings and audit log handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{AuditQuery, SetConfigRequest},
    middleware::Actor,
    models::{AuditLog, ConfigEntry},
    AppState,
};

pub async fn list_config(
    State(state): State<AppState>,
) -> Result<Json<Vec<ConfigEntry>>, AppError> {
    Ok(Json(state.settings.list_config().await?))
}

pub async fn get_config(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ConfigEntry>, AppError> {
    Ok(Json(state.settings.get_config(&key).await?))
}

pub async fn set_config(
    State(state): State<AppState>,
    actor: Actor,
    Path(key): Path<String>,
    Json(payload): Json<SetConfigRequest>,
) -> Result<Json<ConfigEntry>, AppError> {
    let entry = state
        .settings
        .set_config(&key, payload.value, actor.as_deref())
        .await?;
    Ok(Json(entry))
}

pub async fn list_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditLog>>, AppError> {
    Ok(Json(state.settings.list_audit_logs(query.limit).await?))
}
