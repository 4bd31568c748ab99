//! Request and query DTOs for the HTTP API.
//!
//! Request bodies derive `Validate`; services call `validate()` before
//! touching storage, so the same checks apply to non-HTTP callers.

use crate::models::{Granularity, MovementFilter, MovementType};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Largest page a movement listing may request.
pub const MAX_PAGE_SIZE: i64 = 500;

/// `#RRGGBB` colour.
pub fn validate_color(color: &str) -> Result<(), ValidationError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("color").with_message("Color must be #RRGGBB".into()))
    }
}

// -----------------------------------------------------------------------------
// Business units & points of sale
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateBusinessUnitRequest {
    #[validate(length(min = 1, max = 80, message = "Name must be 1-80 characters"))]
    pub name: String,

    #[validate(custom(function = "validate_color"))]
    pub color: String,

    /// Defaults to the end of the list.
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateBusinessUnitRequest {
    #[validate(length(min = 1, max = 80, message = "Name must be 1-80 characters"))]
    pub name: Option<String>,

    #[validate(custom(function = "validate_color"))]
    pub color: Option<String>,

    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ReorderBusinessUnitsRequest {
    #[validate(length(min = 1, message = "At least one business unit is required"))]
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreatePointOfSaleRequest {
    #[validate(length(min = 1, max = 80, message = "Name must be 1-80 characters"))]
    pub name: String,
}

// -----------------------------------------------------------------------------
// Categories
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 80, message = "Name must be 1-80 characters"))]
    pub name: String,

    pub movement_type: MovementType,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 80, message = "Name must be 1-80 characters"))]
    pub name: Option<String>,

    pub is_active: Option<bool>,
}

// -----------------------------------------------------------------------------
// Movements
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RecordMovementRequest {
    pub business_unit_id: Uuid,
    pub movement_type: MovementType,
    pub category_id: Uuid,
    pub amount: Decimal,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    /// Defaults to today.
    pub transaction_date: Option<NaiveDate>,
    pub partner_account_id: Option<Uuid>,
    pub point_of_sale_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ClosePeriodRequest {
    #[validate(length(min = 1, max = 40, message = "Label must be 1-40 characters"))]
    pub label: String,

    /// Category of the carry-forward entry; required when the balance is not zero.
    pub category_id: Option<Uuid>,

    /// Date of the carry-forward entry. Defaults to today.
    pub close_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MovementQuery {
    pub business_unit_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
    pub category_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub include_inactive: Option<bool>,
    pub include_closed: Option<bool>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl From<MovementQuery> for MovementFilter {
    fn from(query: MovementQuery) -> Self {
        Self {
            business_unit_id: query.business_unit_id,
            movement_type: query.movement_type,
            category_id: query.category_id,
            from: query.from,
            to: query.to,
            include_inactive: query.include_inactive.unwrap_or(false),
            include_closed: query.include_closed.unwrap_or(false),
            active_units_only: false,
            offset: query.offset.unwrap_or(0).max(0),
            limit: Some(query.limit.unwrap_or(50).clamp(1, MAX_PAGE_SIZE)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MovementListResponse<T> {
    pub movements: Vec<T>,
    pub offset: i64,
    pub limit: Option<i64>,
}

// -----------------------------------------------------------------------------
// Aggregation & reports
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BalanceQuery {
    pub business_unit_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DailySalesQuery {
    pub business_unit_id: Option<Uuid>,
    pub days: Option<u32>,
    /// Last day of the window. Defaults to today.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SeriesQuery {
    pub business_unit_id: Option<Uuid>,
    pub granularity: Option<Granularity>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DashboardQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ActivityQuery {
    pub business_unit_id: Option<Uuid>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ReportRequest {
    pub business_unit_id: Option<Uuid>,
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(default)]
    pub granularity: Granularity,

    #[validate(length(max = 120, message = "Title must be at most 120 characters"))]
    pub title: Option<String>,
}

// -----------------------------------------------------------------------------
// Partners
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreatePartnerRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub equity_percentage: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdatePartnerRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub equity_percentage: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct OpenPartnerAccountRequest {
    #[validate(length(min = 1, max = 80, message = "Name must be 1-80 characters"))]
    pub name: String,
}

// -----------------------------------------------------------------------------
// Settings & audit
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SetConfigRequest {
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ListQuery {
    pub include_inactive: Option<bool>,
    pub movement_type: Option<MovementType>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuditQuery {
    pub limit: Option<i64>,
}
