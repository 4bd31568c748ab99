//! Audit trail of mutating operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: Uuid,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<Uuid>,
    pub actor: Option<String>,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuditLog {
    pub action: String,
    pub entity: String,
    pub entity_id: Option<Uuid>,
    pub actor: Option<String>,
    pub details: serde_json::Value,
}

impl NewAuditLog {
    pub fn new(action: &str, entity: &str, entity_id: Option<Uuid>, actor: Option<&str>) -> Self {
        Self {
            action: action.to_string(),
            entity: entity.to_string(),
            entity_id,
            actor: actor.map(str::to_string),
            details: serde_json::Value::Null,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}
