use axum::{
    extract::{Query, State},
    response::Html,
};
use chrono::Utc;
use service_core::error::AppError;

use crate::{dtos::ReportRequest, AppState};

/// Movement report as a standalone HTML document.
pub async fn movement_report(
    State(state): State<AppState>,
    Query(query): Query<ReportRequest>,
) -> Result<Html<String>, AppError> {
    tracing::info!(
        business_unit_id = ?query.business_unit_id,
        from = %query.from,
        to = %query.to,
        granularity = query.granularity.as_str(),
        "Generating movement report"
    );

    let html = state
        .reports
        .generate_html(query, Utc::now().date_naive())
        .await?;
    Ok(Html(html))
}
