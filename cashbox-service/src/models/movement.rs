//! Cash movement model: a single credit or debit in a business unit's register.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Movement direction. Credits put cash into the register, debits take it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementType {
    #[serde(rename = "CR")]
    Credit,
    #[serde(rename = "DB")]
    Debit,
}

impl MovementType {
    /// Get string representation for database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "CR",
            Self::Debit => "DB",
        }
    }

    /// Human readable label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Credit => "Credit",
            Self::Debit => "Debit",
        }
    }

    /// Signed amount: positive for credits, negative for debits.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            Self::Credit => amount,
            Self::Debit => -amount,
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MovementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CR" => Ok(Self::Credit),
            "DB" => Ok(Self::Debit),
            other => Err(format!("unknown movement type '{}'", other)),
        }
    }
}

impl TryFrom<String> for MovementType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Ledger entry in a business unit's cash register.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CashMovement {
    pub id: Uuid,
    pub business_unit_id: Uuid,
    #[sqlx(try_from = "String")]
    pub movement_type: MovementType,
    pub category_id: Uuid,
    pub amount: Decimal,
    pub description: Option<String>,
    pub transaction_date: NaiveDate,
    pub sequence_number: i64,
    pub partner_account_id: Option<Uuid>,
    pub point_of_sale_id: Option<Uuid>,
    pub created_by: Option<String>,
    pub is_opening_balance: bool,
    pub is_active: bool,
    pub closed_period: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CashMovement {
    /// Signed contribution of this movement to the register balance.
    pub fn signed_amount(&self) -> Decimal {
        self.movement_type.signed(self.amount)
    }

    /// A credit that represents a sale (not a carried-forward balance).
    pub fn is_sale(&self) -> bool {
        self.is_active && self.movement_type == MovementType::Credit && !self.is_opening_balance
    }

    /// Active and not yet absorbed by a period close.
    pub fn is_open(&self) -> bool {
        self.is_active && self.closed_period.is_none()
    }
}

/// Validated movement ready to be written. The gateway assigns
/// `id`, `sequence_number` and `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMovement {
    pub business_unit_id: Uuid,
    pub movement_type: MovementType,
    pub category_id: Uuid,
    pub amount: Decimal,
    pub description: Option<String>,
    pub transaction_date: NaiveDate,
    pub partner_account_id: Option<Uuid>,
    pub point_of_sale_id: Option<Uuid>,
    pub created_by: Option<String>,
    pub is_opening_balance: bool,
}

/// Query over `cash_movements`.
///
/// By default only active movements of the open period are returned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovementFilter {
    pub business_unit_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
    pub category_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub include_inactive: bool,
    #[serde(default)]
    pub include_closed: bool,
    /// Skip movements of deactivated business units.
    #[serde(default)]
    pub active_units_only: bool,
    #[serde(default)]
    pub offset: i64,
    pub limit: Option<i64>,
}

impl MovementFilter {
    /// Filter for the open period of a single business unit.
    pub fn for_unit(business_unit_id: Uuid) -> Self {
        Self {
            business_unit_id: Some(business_unit_id),
            ..Self::default()
        }
    }

    /// Restrict to an inclusive date range.
    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Check a movement against everything except pagination.
    pub fn matches(&self, movement: &CashMovement) -> bool {
        if !self.include_inactive && !movement.is_active {
            return false;
        }
        if !self.include_closed && movement.closed_period.is_some() {
            return false;
        }
        if self
            .business_unit_id
            .is_some_and(|id| id != movement.business_unit_id)
        {
            return false;
        }
        if self
            .movement_type
            .is_some_and(|t| t != movement.movement_type)
        {
            return false;
        }
        if self.category_id.is_some_and(|id| id != movement.category_id) {
            return false;
        }
        if self.from.is_some_and(|from| movement.transaction_date < from) {
            return false;
        }
        if self.to.is_some_and(|to| movement.transaction_date > to) {
            return false;
        }
        true
    }
}

/// Result of closing a business unit's period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedPeriod {
    pub business_unit_id: Uuid,
    pub label: String,
    pub closed_count: u64,
    pub carry_forward: Option<CashMovement>,
}
