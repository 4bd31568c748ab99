//! Application settings and the audit trail.

use crate::models::{AuditLog, ConfigEntry, NewAuditLog};
use crate::services::store::{CashboxStore, SharedStore};
use serde_json::Value;
use service_core::error::AppError;
use tracing::{info, instrument, warn};

/// Upper bound for a single audit-log page.
pub const MAX_AUDIT_PAGE: i64 = 500;

/// Record an audit entry. A failed write is logged and swallowed so the
/// audited operation still succeeds.
pub async fn audit(store: &dyn CashboxStore, entry: NewAuditLog) {
    if let Err(e) = store.insert_audit_log(&entry).await {
        warn!(
            action = %entry.action,
            entity = %entry.entity,
            error = %e,
            "Failed to write audit log"
        );
    }
}

/// Check a value against the rules of a known key. Unknown keys pass.
pub fn validate_config_value(key: &str, value: &Value) -> Result<(), AppError> {
    let valid = match key {
        "theme" => matches!(value.as_str(), Some("light" | "dark" | "system")),
        "zoom" => value
            .as_f64()
            .is_some_and(|zoom| (0.5..=2.0).contains(&zoom)),
        "labels" => value
            .as_object()
            .is_some_and(|labels| labels.values().all(Value::is_string)),
        _ => true,
    };

    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(anyhow::anyhow!(
            "Invalid value for config key '{}'",
            key
        )))
    }
}

fn validate_config_key(key: &str) -> Result<(), AppError> {
    let valid = !key.is_empty()
        && key.len() <= 64
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(anyhow::anyhow!(
            "Config key must be 1-64 characters of [A-Za-z0-9_.-]"
        )))
    }
}

#[derive(Clone)]
pub struct SettingsService {
    store: SharedStore,
}

impl SettingsService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn get_config(&self, key: &str) -> Result<ConfigEntry, AppError> {
        self.store
            .get_config(key)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Config key '{}' not found", key)))
    }

    #[instrument(skip(self))]
    pub async fn list_config(&self) -> Result<Vec<ConfigEntry>, AppError> {
        self.store.list_config().await
    }

    #[instrument(skip(self, value))]
    pub async fn set_config(
        &self,
        key: &str,
        value: Value,
        actor: Option<&str>,
    ) -> Result<ConfigEntry, AppError> {
        validate_config_key(key)?;
        validate_config_value(key, &value)?;

        let entry = self.store.upsert_config(key, &value).await?;
        info!(key = %key, "Config updated");

        audit(
            self.store.as_ref(),
            NewAuditLog::new("config.set", "app_config", None, actor)
                .with_details(serde_json::json!({ "key": key, "value": value })),
        )
        .await;

        Ok(entry)
    }

    #[instrument(skip(self))]
    pub async fn list_audit_logs(&self, limit: Option<i64>) -> Result<Vec<AuditLog>, AppError> {
        let limit = limit.unwrap_or(100).clamp(1, MAX_AUDIT_PAGE);
        self.store.list_audit_logs(limit).await
    }
}
