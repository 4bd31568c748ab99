//! Persistence gateway.
//!
//! Services talk to storage only through [`CashboxStore`]. Two implementations
//! ship with the crate: [`crate::services::Database`] (PostgreSQL) and
//! [`crate::services::InMemoryStore`].
//!
//! Row-level CRUD is plain; the few writes that must not interleave
//! (sequence assignment, delete-last, period close, managing-partner swap,
//! partner balance adjustment) are single gateway calls so each backend can
//! make them atomic.

use crate::models::{
    AuditLog, BusinessUnit, BusinessUnitUpdate, CashMovement, CategoryUpdate, ClosedPeriod,
    ConfigEntry, MovementCategory, MovementFilter, MovementType, NewAuditLog, NewBusinessUnit,
    NewCategory, NewMovement, NewPartner, NewPartnerAccount, NewPointOfSale, Partner,
    PartnerAccount, PartnerUpdate, PointOfSale,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::sync::Arc;
use uuid::Uuid;

/// Shared handle to the configured gateway.
pub type SharedStore = Arc<dyn CashboxStore>;

#[async_trait]
pub trait CashboxStore: Send + Sync {
    /// Check that the backend is reachable.
    async fn health_check(&self) -> Result<(), AppError>;

    // -------------------------------------------------------------------------
    // Business units
    // -------------------------------------------------------------------------

    async fn insert_business_unit(&self, input: &NewBusinessUnit)
        -> Result<BusinessUnit, AppError>;

    async fn get_business_unit(&self, id: Uuid) -> Result<Option<BusinessUnit>, AppError>;

    /// Units ordered by `display_order`, then name.
    async fn list_business_units(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<BusinessUnit>, AppError>;

    async fn update_business_unit(
        &self,
        id: Uuid,
        update: &BusinessUnitUpdate,
    ) -> Result<Option<BusinessUnit>, AppError>;

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    async fn insert_category(&self, input: &NewCategory) -> Result<MovementCategory, AppError>;

    async fn get_category(&self, id: Uuid) -> Result<Option<MovementCategory>, AppError>;

    async fn list_categories(
        &self,
        movement_type: Option<MovementType>,
        include_inactive: bool,
    ) -> Result<Vec<MovementCategory>, AppError>;

    async fn update_category(
        &self,
        id: Uuid,
        update: &CategoryUpdate,
    ) -> Result<Option<MovementCategory>, AppError>;

    // -------------------------------------------------------------------------
    // Points of sale
    // -------------------------------------------------------------------------

    async fn insert_point_of_sale(&self, input: &NewPointOfSale)
        -> Result<PointOfSale, AppError>;

    async fn get_point_of_sale(&self, id: Uuid) -> Result<Option<PointOfSale>, AppError>;

    async fn list_points_of_sale(
        &self,
        business_unit_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<PointOfSale>, AppError>;

    async fn set_point_of_sale_active(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> Result<Option<PointOfSale>, AppError>;

    // -------------------------------------------------------------------------
    // Movements
    // -------------------------------------------------------------------------

    /// Insert with `sequence_number = max(unit sequence) + 1`, atomically.
    /// The maximum covers inactive and closed rows so numbers are never reused.
    async fn insert_movement(&self, input: &NewMovement) -> Result<CashMovement, AppError>;

    async fn get_movement(&self, id: Uuid) -> Result<Option<CashMovement>, AppError>;

    /// Movements matching `filter`, ordered by `transaction_date DESC,
    /// sequence_number DESC`, paginated by `offset`/`limit`.
    async fn list_movements(&self, filter: &MovementFilter)
        -> Result<Vec<CashMovement>, AppError>;

    /// Soft-delete `id` only if it is the unit's highest-sequence active,
    /// open movement. Returns `None` when the condition does not hold.
    async fn deactivate_last_movement(
        &self,
        business_unit_id: Uuid,
        id: Uuid,
    ) -> Result<Option<CashMovement>, AppError>;

    /// Mark every open movement of the unit with `label` and insert the
    /// carry-forward entry, atomically.
    async fn close_period(
        &self,
        business_unit_id: Uuid,
        label: &str,
        carry_forward: Option<&NewMovement>,
    ) -> Result<ClosedPeriod, AppError>;

    /// Whether a period with this label was already closed for the unit.
    async fn period_exists(&self, business_unit_id: Uuid, label: &str) -> Result<bool, AppError>;

    // -------------------------------------------------------------------------
    // Partners
    // -------------------------------------------------------------------------

    async fn insert_partner(&self, input: &NewPartner) -> Result<Partner, AppError>;

    async fn get_partner(&self, id: Uuid) -> Result<Option<Partner>, AppError>;

    /// Partners ordered by name.
    async fn list_partners(&self, include_inactive: bool) -> Result<Vec<Partner>, AppError>;

    async fn update_partner(
        &self,
        id: Uuid,
        update: &PartnerUpdate,
    ) -> Result<Option<Partner>, AppError>;

    /// Demote every other managing partner and promote `id`, atomically.
    /// Returns `None` if `id` does not exist or is inactive.
    async fn set_managing_partner(&self, id: Uuid) -> Result<Option<Partner>, AppError>;

    async fn insert_partner_account(
        &self,
        input: &NewPartnerAccount,
    ) -> Result<PartnerAccount, AppError>;

    async fn get_partner_account(&self, id: Uuid) -> Result<Option<PartnerAccount>, AppError>;

    async fn list_partner_accounts(&self, partner_id: Uuid)
        -> Result<Vec<PartnerAccount>, AppError>;

    /// Add `delta` to the running balance, atomically.
    async fn adjust_partner_account(
        &self,
        id: Uuid,
        delta: Decimal,
    ) -> Result<Option<PartnerAccount>, AppError>;

    // -------------------------------------------------------------------------
    // App config & audit
    // -------------------------------------------------------------------------

    async fn get_config(&self, key: &str) -> Result<Option<ConfigEntry>, AppError>;

    async fn list_config(&self) -> Result<Vec<ConfigEntry>, AppError>;

    async fn upsert_config(
        &self,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<ConfigEntry, AppError>;

    async fn insert_audit_log(&self, input: &NewAuditLog) -> Result<AuditLog, AppError>;

    /// Newest first.
    async fn list_audit_logs(&self, limit: i64) -> Result<Vec<AuditLog>, AppError>;
}
