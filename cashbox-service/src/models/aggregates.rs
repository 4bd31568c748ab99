//! Read models produced by the aggregation layer.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CashMovement, MovementType};

/// Totals over a set of movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub total_credits: Decimal,
    pub total_debits: Decimal,
    pub ticket_count: u64,
    pub balance: Decimal,
}

/// Balance of a single business unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitBalance {
    pub business_unit_id: Uuid,
    pub name: String,
    pub color: String,
    #[serde(flatten)]
    pub summary: BalanceSummary,
}

/// Credit total for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub total: Decimal,
}

/// Bucket size for chart series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Weekly,
    Monthly,
    Annual,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Annual => "annual",
        }
    }
}

/// One labelled bucket of a sales series. `start..=end` is the covered range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total: Decimal,
}

/// Movement decorated with display names for activity feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub movement_id: Uuid,
    pub business_unit_id: Uuid,
    pub business_unit_name: String,
    pub category_name: String,
    pub movement_type: MovementType,
    pub amount: Decimal,
    pub description: Option<String>,
    pub transaction_date: NaiveDate,
    pub sequence_number: i64,
    pub created_by: Option<String>,
}

/// Everything the home screen shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub date: NaiveDate,
    pub global: BalanceSummary,
    pub units: Vec<UnitBalance>,
    pub today_sales: Decimal,
    pub weekly_sales: Vec<SeriesPoint>,
}

/// Aggregated input of the HTML report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub title: String,
    pub business_unit_label: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub generated_at: String,
    pub currency_symbol: String,
    pub granularity: Granularity,
    pub summary: BalanceSummary,
    pub series: Vec<SeriesPoint>,
    pub rows: Vec<ReportRow>,
}

/// One line of the report's movement table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub transaction_date: NaiveDate,
    pub sequence_number: i64,
    pub movement_type: MovementType,
    pub category_name: String,
    pub description: Option<String>,
    pub amount: Decimal,
}

impl ReportRow {
    pub fn from_movement(movement: &CashMovement, category_name: String) -> Self {
        Self {
            transaction_date: movement.transaction_date,
            sequence_number: movement.sequence_number,
            movement_type: movement.movement_type,
            category_name,
            description: movement.description.clone(),
            amount: movement.amount,
        }
    }
}
