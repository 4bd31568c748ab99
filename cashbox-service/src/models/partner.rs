//! Partner equity model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Business partner holding an equity share.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Partner {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub equity_percentage: Decimal,
    pub is_managing_partner: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPartner {
    pub name: String,
    pub email: Option<String>,
    pub equity_percentage: Decimal,
}

/// Partial update. Managing status is changed only through
/// [`crate::services::PartnerService::change_managing_partner`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartnerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub equity_percentage: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl PartnerUpdate {
    pub fn apply(&self, partner: &mut Partner) {
        if let Some(name) = &self.name {
            partner.name = name.clone();
        }
        if let Some(email) = &self.email {
            partner.email = Some(email.clone());
        }
        if let Some(equity) = self.equity_percentage {
            partner.equity_percentage = equity;
        }
        if let Some(active) = self.is_active {
            partner.is_active = active;
        }
    }
}

/// Running-balance account of a partner (capital, current account, ...).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PartnerAccount {
    pub id: Uuid,
    pub partner_id: Uuid,
    pub name: String,
    pub balance: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPartnerAccount {
    pub partner_id: Uuid,
    pub name: String,
}
