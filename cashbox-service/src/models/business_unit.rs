//! Business unit (location / cash register) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A tracked retail location with its own register.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct BusinessUnit {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a business unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBusinessUnit {
    pub name: String,
    pub color: String,
    pub display_order: i32,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessUnitUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl BusinessUnitUpdate {
    /// Apply this update to an in-memory row.
    pub fn apply(&self, unit: &mut BusinessUnit) {
        if let Some(name) = &self.name {
            unit.name = name.clone();
        }
        if let Some(color) = &self.color {
            unit.color = color.clone();
        }
        if let Some(order) = self.display_order {
            unit.display_order = order;
        }
        if let Some(active) = self.is_active {
            unit.is_active = active;
        }
    }
}

/// Sort units the way they are presented: display order, then name.
pub fn sort_for_display(units: &mut [BusinessUnit]) {
    units.sort_by(|a, b| {
        a.display_order
            .cmp(&b.display_order)
            .then_with(|| a.name.cmp(&b.name))
    });
}
