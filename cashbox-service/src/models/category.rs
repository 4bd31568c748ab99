//! Movement categories ("Sales", "Supplier payment", ...).

use super::MovementType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct MovementCategory {
    pub id: Uuid,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub movement_type: MovementType,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub movement_type: MovementType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

impl CategoryUpdate {
    pub fn apply(&self, category: &mut MovementCategory) {
        if let Some(name) = &self.name {
            category.name = name.clone();
        }
        if let Some(active) = self.is_active {
            category.is_active = active;
        }
    }
}
