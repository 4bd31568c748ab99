//! Ledger repository: movements, period close and the reference data
//! (business units, categories, points of sale) movements point at.

use crate::dtos::{
    ClosePeriodRequest, CreateBusinessUnitRequest, CreateCategoryRequest,
    CreatePointOfSaleRequest, RecordMovementRequest, UpdateBusinessUnitRequest,
    UpdateCategoryRequest, MAX_PAGE_SIZE,
};
use crate::models::{
    BusinessUnit, BusinessUnitUpdate, CashMovement, CategoryUpdate, ClosedPeriod,
    MovementCategory, MovementFilter, MovementType, NewAuditLog, NewBusinessUnit, NewCategory,
    NewMovement, NewPointOfSale, PartnerAccount, PointOfSale,
};
use crate::services::aggregation::summarize;
use crate::services::metrics::MOVEMENTS_RECORDED;
use crate::services::settings::audit;
use crate::services::store::SharedStore;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use service_core::error::AppError;
use std::collections::HashSet;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Largest number of decimal places accepted for an amount.
pub const AMOUNT_SCALE: u32 = 2;

/// Description of the entry a period close carries forward.
pub fn opening_balance_description(label: &str) -> String {
    format!("Opening balance {}", label)
}

fn validate_amount(amount: Decimal) -> Result<(), AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Amount must be greater than zero"
        )));
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Amount must have at most {} decimal places",
            AMOUNT_SCALE
        )));
    }
    Ok(())
}

/// Carry-forward entry for a closing balance, or `None` when it is zero.
pub fn carry_forward_entry(
    business_unit_id: Uuid,
    balance: Decimal,
    category_id: Uuid,
    label: &str,
    date: NaiveDate,
    actor: Option<&str>,
) -> Option<NewMovement> {
    if balance.is_zero() {
        return None;
    }
    let movement_type = if balance > Decimal::ZERO {
        MovementType::Credit
    } else {
        MovementType::Debit
    };
    Some(NewMovement {
        business_unit_id,
        movement_type,
        category_id,
        amount: balance.abs(),
        description: Some(opening_balance_description(label)),
        transaction_date: date,
        partner_account_id: None,
        point_of_sale_id: None,
        created_by: actor.map(str::to_string),
        is_opening_balance: true,
    })
}

#[derive(Clone)]
pub struct LedgerService {
    store: SharedStore,
}

impl LedgerService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Apply `delta` to a partner account that was validated before the
    /// movement was written.
    async fn apply_to_partner_account(
        &self,
        account_id: Uuid,
        delta: Decimal,
    ) -> Result<PartnerAccount, AppError> {
        self.store
            .adjust_partner_account(account_id, delta)
            .await?
            .ok_or_else(|| {
                error!(
                    partner_account_id = %account_id,
                    delta = %delta,
                    "Partner account missing, balance not adjusted"
                );
                AppError::InternalError(anyhow::anyhow!(
                    "Partner account {} disappeared before its balance was adjusted",
                    account_id
                ))
            })
    }

    // -------------------------------------------------------------------------
    // Business units
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_business_unit(&self, id: Uuid) -> Result<BusinessUnit, AppError> {
        self.store
            .get_business_unit(id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Business unit {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_business_units(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<BusinessUnit>, AppError> {
        self.store.list_business_units(include_inactive).await
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_business_unit(
        &self,
        request: CreateBusinessUnitRequest,
        actor: Option<&str>,
    ) -> Result<BusinessUnit, AppError> {
        request.validate()?;

        let display_order = match request.display_order {
            Some(order) => order,
            None => self.store.list_business_units(true).await?.len() as i32,
        };
        let unit = self
            .store
            .insert_business_unit(&NewBusinessUnit {
                name: request.name.trim().to_string(),
                color: request.color,
                display_order,
            })
            .await?;

        info!(business_unit_id = %unit.id, "Business unit created");
        audit(
            self.store.as_ref(),
            NewAuditLog::new("business_unit.create", "business_unit", Some(unit.id), actor)
                .with_details(json!({ "name": unit.name })),
        )
        .await;
        Ok(unit)
    }

    #[instrument(skip(self, request))]
    pub async fn update_business_unit(
        &self,
        id: Uuid,
        request: UpdateBusinessUnitRequest,
        actor: Option<&str>,
    ) -> Result<BusinessUnit, AppError> {
        request.validate()?;

        let update = BusinessUnitUpdate {
            name: request.name.map(|n| n.trim().to_string()),
            color: request.color,
            display_order: request.display_order,
            is_active: None,
        };
        let unit = self
            .store
            .update_business_unit(id, &update)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Business unit {} not found", id)))?;

        audit(
            self.store.as_ref(),
            NewAuditLog::new("business_unit.update", "business_unit", Some(id), actor)
                .with_details(json!(update)),
        )
        .await;
        Ok(unit)
    }

    #[instrument(skip(self))]
    pub async fn deactivate_business_unit(
        &self,
        id: Uuid,
        actor: Option<&str>,
    ) -> Result<BusinessUnit, AppError> {
        let update = BusinessUnitUpdate {
            is_active: Some(false),
            ..BusinessUnitUpdate::default()
        };
        let unit = self
            .store
            .update_business_unit(id, &update)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Business unit {} not found", id)))?;

        info!(business_unit_id = %id, "Business unit deactivated");
        audit(
            self.store.as_ref(),
            NewAuditLog::new("business_unit.deactivate", "business_unit", Some(id), actor),
        )
        .await;
        Ok(unit)
    }

    /// Rewrite `display_order` to each unit's position in `ids`.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn reorder_business_units(
        &self,
        ids: &[Uuid],
        actor: Option<&str>,
    ) -> Result<Vec<BusinessUnit>, AppError> {
        let mut seen = HashSet::new();
        if let Some(duplicate) = ids.iter().find(|id| !seen.insert(**id)) {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Business unit {} listed more than once",
                duplicate
            )));
        }
        for id in ids {
            self.get_business_unit(*id).await?;
        }

        for (position, id) in ids.iter().enumerate() {
            let update = BusinessUnitUpdate {
                display_order: Some(position as i32),
                ..BusinessUnitUpdate::default()
            };
            self.store.update_business_unit(*id, &update).await?;
        }

        audit(
            self.store.as_ref(),
            NewAuditLog::new("business_unit.reorder", "business_unit", None, actor)
                .with_details(json!({ "ids": ids })),
        )
        .await;
        self.store.list_business_units(true).await
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        movement_type: Option<MovementType>,
        include_inactive: bool,
    ) -> Result<Vec<MovementCategory>, AppError> {
        self.store
            .list_categories(movement_type, include_inactive)
            .await
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
        actor: Option<&str>,
    ) -> Result<MovementCategory, AppError> {
        request.validate()?;

        let category = self
            .store
            .insert_category(&NewCategory {
                name: request.name.trim().to_string(),
                movement_type: request.movement_type,
            })
            .await?;

        audit(
            self.store.as_ref(),
            NewAuditLog::new("category.create", "movement_category", Some(category.id), actor)
                .with_details(json!({
                    "name": category.name,
                    "movement_type": category.movement_type,
                })),
        )
        .await;
        Ok(category)
    }

    #[instrument(skip(self, request))]
    pub async fn update_category(
        &self,
        id: Uuid,
        request: UpdateCategoryRequest,
        actor: Option<&str>,
    ) -> Result<MovementCategory, AppError> {
        request.validate()?;

        let update = CategoryUpdate {
            name: request.name.map(|n| n.trim().to_string()),
            is_active: request.is_active,
        };
        let category = self
            .store
            .update_category(id, &update)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Category {} not found", id)))?;

        audit(
            self.store.as_ref(),
            NewAuditLog::new("category.update", "movement_category", Some(id), actor)
                .with_details(json!(update)),
        )
        .await;
        Ok(category)
    }

    // -------------------------------------------------------------------------
    // Points of sale
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_points_of_sale(
        &self,
        business_unit_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<PointOfSale>, AppError> {
        self.get_business_unit(business_unit_id).await?;
        self.store
            .list_points_of_sale(business_unit_id, include_inactive)
            .await
    }

    #[instrument(skip(self, request))]
    pub async fn create_point_of_sale(
        &self,
        business_unit_id: Uuid,
        request: CreatePointOfSaleRequest,
        actor: Option<&str>,
    ) -> Result<PointOfSale, AppError> {
        request.validate()?;

        let unit = self.get_business_unit(business_unit_id).await?;
        if !unit.is_active {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Business unit {} is inactive",
                business_unit_id
            )));
        }

        let point_of_sale = self
            .store
            .insert_point_of_sale(&NewPointOfSale {
                business_unit_id,
                name: request.name.trim().to_string(),
            })
            .await?;

        audit(
            self.store.as_ref(),
            NewAuditLog::new(
                "point_of_sale.create",
                "point_of_sale",
                Some(point_of_sale.id),
                actor,
            )
            .with_details(json!({ "business_unit_id": business_unit_id })),
        )
        .await;
        Ok(point_of_sale)
    }

    #[instrument(skip(self))]
    pub async fn deactivate_point_of_sale(
        &self,
        id: Uuid,
        actor: Option<&str>,
    ) -> Result<PointOfSale, AppError> {
        let point_of_sale = self
            .store
            .set_point_of_sale_active(id, false)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Point of sale {} not found", id)))?;

        audit(
            self.store.as_ref(),
            NewAuditLog::new("point_of_sale.deactivate", "point_of_sale", Some(id), actor),
        )
        .await;
        Ok(point_of_sale)
    }

    // -------------------------------------------------------------------------
    // Movements
    // -------------------------------------------------------------------------

    /// Validate and record a movement, then apply it to the linked partner account.
    #[instrument(
        skip(self, request),
        fields(
            business_unit_id = %request.business_unit_id,
            movement_type = %request.movement_type,
        )
    )]
    pub async fn record_movement(
        &self,
        request: RecordMovementRequest,
        actor: Option<&str>,
    ) -> Result<CashMovement, AppError> {
        request.validate()?;
        validate_amount(request.amount)?;

        let unit = self.get_business_unit(request.business_unit_id).await?;
        if !unit.is_active {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Business unit {} is inactive",
                unit.id
            )));
        }

        let category = self
            .store
            .get_category(request.category_id)
            .await?
            .filter(|c| c.is_active)
            .ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!(
                    "Category {} does not exist or is inactive",
                    request.category_id
                ))
            })?;
        if category.movement_type != request.movement_type {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Category '{}' is for {} movements",
                category.name,
                category.movement_type.label().to_lowercase()
            )));
        }

        if let Some(pos_id) = request.point_of_sale_id {
            let belongs = self
                .store
                .get_point_of_sale(pos_id)
                .await?
                .is_some_and(|pos| pos.is_active && pos.business_unit_id == unit.id);
            if !belongs {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Point of sale {} is not an active till of this business unit",
                    pos_id
                )));
            }
        }

        if let Some(account_id) = request.partner_account_id {
            let active = self
                .store
                .get_partner_account(account_id)
                .await?
                .is_some_and(|account| account.is_active);
            if !active {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Partner account {} does not exist or is inactive",
                    account_id
                )));
            }
        }

        let description = request
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        let movement = self
            .store
            .insert_movement(&NewMovement {
                business_unit_id: unit.id,
                movement_type: request.movement_type,
                category_id: category.id,
                amount: request.amount,
                description,
                transaction_date: request
                    .transaction_date
                    .unwrap_or_else(|| Utc::now().date_naive()),
                partner_account_id: request.partner_account_id,
                point_of_sale_id: request.point_of_sale_id,
                created_by: actor.map(str::to_string),
                is_opening_balance: false,
            })
            .await?;

        if let Some(account_id) = movement.partner_account_id {
            self.apply_to_partner_account(account_id, movement.signed_amount())
                .await?;
        }

        MOVEMENTS_RECORDED
            .with_label_values(&[movement.movement_type.as_str()])
            .inc();
        info!(
            movement_id = %movement.id,
            sequence_number = movement.sequence_number,
            amount = %movement.amount,
            "Movement recorded"
        );
        audit(
            self.store.as_ref(),
            NewAuditLog::new("movement.create", "cash_movement", Some(movement.id), actor)
                .with_details(json!({
                    "business_unit_id": movement.business_unit_id,
                    "movement_type": movement.movement_type,
                    "amount": movement.amount,
                    "sequence_number": movement.sequence_number,
                })),
        )
        .await;

        Ok(movement)
    }

    #[instrument(skip(self))]
    pub async fn get_movement(&self, id: Uuid) -> Result<CashMovement, AppError> {
        self.store
            .get_movement(id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Movement {} not found", id)))
    }

    /// Filtered listing. The page size is capped at [`MAX_PAGE_SIZE`].
    #[instrument(skip(self, filter))]
    pub async fn list_movements(
        &self,
        mut filter: MovementFilter,
    ) -> Result<Vec<CashMovement>, AppError> {
        filter.offset = filter.offset.max(0);
        filter.limit = Some(filter.limit.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE));
        self.store.list_movements(&filter).await
    }

    /// Soft-delete a movement. Only the unit's most recent open movement may go.
    #[instrument(skip(self))]
    pub async fn delete_last_movement(
        &self,
        business_unit_id: Uuid,
        id: Uuid,
        actor: Option<&str>,
    ) -> Result<CashMovement, AppError> {
        let existing = self
            .store
            .get_movement(id)
            .await?
            .filter(|m| m.is_active && m.business_unit_id == business_unit_id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Movement {} not found", id)))?;

        if let Some(period) = &existing.closed_period {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Movement {} belongs to closed period '{}'",
                id,
                period
            )));
        }

        let deleted = self
            .store
            .deactivate_last_movement(business_unit_id, id)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(anyhow::anyhow!(
                    "Only the last movement of a business unit can be deleted"
                ))
            })?;

        if let Some(account_id) = deleted.partner_account_id {
            self.apply_to_partner_account(account_id, -deleted.signed_amount())
                .await?;
        }

        info!(movement_id = %id, sequence_number = deleted.sequence_number, "Movement deleted");
        audit(
            self.store.as_ref(),
            NewAuditLog::new("movement.delete", "cash_movement", Some(id), actor).with_details(
                json!({
                    "business_unit_id": business_unit_id,
                    "sequence_number": deleted.sequence_number,
                }),
            ),
        )
        .await;

        Ok(deleted)
    }

    /// Close the open period of a unit and carry its balance forward.
    #[instrument(skip(self, request), fields(label = %request.label))]
    pub async fn close_period(
        &self,
        business_unit_id: Uuid,
        request: ClosePeriodRequest,
        actor: Option<&str>,
    ) -> Result<ClosedPeriod, AppError> {
        request.validate()?;
        let label = request.label.trim();

        self.get_business_unit(business_unit_id).await?;
        if self.store.period_exists(business_unit_id, label).await? {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Period '{}' is already closed for this business unit",
                label
            )));
        }

        let open = self
            .store
            .list_movements(&MovementFilter::for_unit(business_unit_id))
            .await?;
        if open.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "There are no open movements to close"
            )));
        }

        let balance = summarize(&open).balance;
        let carry_forward = if balance.is_zero() {
            None
        } else {
            let category_id = request.category_id.ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!(
                    "A category is required to carry a non-zero balance forward"
                ))
            })?;
            if self.store.get_category(category_id).await?.is_none() {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Category {} does not exist",
                    category_id
                )));
            }
            carry_forward_entry(
                business_unit_id,
                balance,
                category_id,
                label,
                request.close_date.unwrap_or_else(|| Utc::now().date_naive()),
                actor,
            )
        };

        let closed = self
            .store
            .close_period(business_unit_id, label, carry_forward.as_ref())
            .await?;

        info!(
            business_unit_id = %business_unit_id,
            closed_count = closed.closed_count,
            balance = %balance,
            "Period closed"
        );
        audit(
            self.store.as_ref(),
            NewAuditLog::new("period.close", "business_unit", Some(business_unit_id), actor)
                .with_details(json!({
                    "label": label,
                    "closed_count": closed.closed_count,
                    "balance": balance,
                })),
        )
        .await;

        Ok(closed)
    }
}
