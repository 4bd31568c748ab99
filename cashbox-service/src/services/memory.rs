//! In-memory gateway. Every table lives behind one `RwLock`, so each
//! gateway call is atomic with respect to the others.

use crate::models::{
    sort_for_display, AuditLog, BusinessUnit, BusinessUnitUpdate, CashMovement, CategoryUpdate,
    ClosedPeriod, ConfigEntry, MovementCategory, MovementFilter, MovementType, NewAuditLog,
    NewBusinessUnit, NewCategory, NewMovement, NewPartner, NewPartnerAccount, NewPointOfSale,
    Partner, PartnerAccount, PartnerUpdate, PointOfSale,
};
use crate::services::store::CashboxStore;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    business_units: Vec<BusinessUnit>,
    categories: Vec<MovementCategory>,
    points_of_sale: Vec<PointOfSale>,
    movements: Vec<CashMovement>,
    partners: Vec<Partner>,
    partner_accounts: Vec<PartnerAccount>,
    config: BTreeMap<String, ConfigEntry>,
    audit_logs: Vec<AuditLog>,
}

impl Tables {
    fn next_sequence(&self, business_unit_id: Uuid) -> i64 {
        self.movements
            .iter()
            .filter(|m| m.business_unit_id == business_unit_id)
            .map(|m| m.sequence_number)
            .max()
            .unwrap_or(0)
            + 1
    }

    fn insert_movement(&mut self, input: &NewMovement) -> Result<CashMovement, AppError> {
        if !self
            .business_units
            .iter()
            .any(|u| u.id == input.business_unit_id)
        {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Business unit {} not found",
                input.business_unit_id
            )));
        }

        let movement = CashMovement {
            id: Uuid::new_v4(),
            business_unit_id: input.business_unit_id,
            movement_type: input.movement_type,
            category_id: input.category_id,
            amount: input.amount,
            description: input.description.clone(),
            transaction_date: input.transaction_date,
            sequence_number: self.next_sequence(input.business_unit_id),
            partner_account_id: input.partner_account_id,
            point_of_sale_id: input.point_of_sale_id,
            created_by: input.created_by.clone(),
            is_opening_balance: input.is_opening_balance,
            is_active: true,
            closed_period: None,
            created_at: Utc::now(),
        };
        self.movements.push(movement.clone());
        Ok(movement)
    }
}

/// Thread-safe in-memory implementation of [`CashboxStore`].
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unique_violation(what: &str) -> AppError {
    AppError::Conflict(anyhow::anyhow!("{}: duplicate value", what))
}

#[async_trait]
impl CashboxStore for InMemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn insert_business_unit(
        &self,
        input: &NewBusinessUnit,
    ) -> Result<BusinessUnit, AppError> {
        let mut tables = self.tables.write().await;
        if tables.business_units.iter().any(|u| u.name == input.name) {
            return Err(unique_violation("create business unit"));
        }
        let unit = BusinessUnit {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            color: input.color.clone(),
            display_order: input.display_order,
            is_active: true,
            created_at: Utc::now(),
        };
        tables.business_units.push(unit.clone());
        Ok(unit)
    }

    async fn get_business_unit(&self, id: Uuid) -> Result<Option<BusinessUnit>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.business_units.iter().find(|u| u.id == id).cloned())
    }

    async fn list_business_units(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<BusinessUnit>, AppError> {
        let tables = self.tables.read().await;
        let mut units: Vec<BusinessUnit> = tables
            .business_units
            .iter()
            .filter(|u| include_inactive || u.is_active)
            .cloned()
            .collect();
        sort_for_display(&mut units);
        Ok(units)
    }

    async fn update_business_unit(
        &self,
        id: Uuid,
        update: &BusinessUnitUpdate,
    ) -> Result<Option<BusinessUnit>, AppError> {
        let mut tables = self.tables.write().await;
        if let Some(name) = &update.name {
            if tables
                .business_units
                .iter()
                .any(|u| u.id != id && &u.name == name)
            {
                return Err(unique_violation("update business unit"));
            }
        }
        Ok(tables
            .business_units
            .iter_mut()
            .find(|u| u.id == id)
            .map(|unit| {
                update.apply(unit);
                unit.clone()
            }))
    }

    async fn insert_category(&self, input: &NewCategory) -> Result<MovementCategory, AppError> {
        let mut tables = self.tables.write().await;
        if tables
            .categories
            .iter()
            .any(|c| c.name == input.name && c.movement_type == input.movement_type)
        {
            return Err(unique_violation("create category"));
        }
        let category = MovementCategory {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            movement_type: input.movement_type,
            is_active: true,
            created_at: Utc::now(),
        };
        tables.categories.push(category.clone());
        Ok(category)
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<MovementCategory>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn list_categories(
        &self,
        movement_type: Option<MovementType>,
        include_inactive: bool,
    ) -> Result<Vec<MovementCategory>, AppError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<MovementCategory> = tables
            .categories
            .iter()
            .filter(|c| movement_type.is_none_or(|t| t == c.movement_type))
            .filter(|c| include_inactive || c.is_active)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn update_category(
        &self,
        id: Uuid,
        update: &CategoryUpdate,
    ) -> Result<Option<MovementCategory>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .map(|category| {
                update.apply(category);
                category.clone()
            }))
    }

    async fn insert_point_of_sale(
        &self,
        input: &NewPointOfSale,
    ) -> Result<PointOfSale, AppError> {
        let mut tables = self.tables.write().await;
        if tables
            .points_of_sale
            .iter()
            .any(|p| p.business_unit_id == input.business_unit_id && p.name == input.name)
        {
            return Err(unique_violation("create point of sale"));
        }
        let point = PointOfSale {
            id: Uuid::new_v4(),
            business_unit_id: input.business_unit_id,
            name: input.name.clone(),
            is_active: true,
            created_at: Utc::now(),
        };
        tables.points_of_sale.push(point.clone());
        Ok(point)
    }

    async fn get_point_of_sale(&self, id: Uuid) -> Result<Option<PointOfSale>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.points_of_sale.iter().find(|p| p.id == id).cloned())
    }

    async fn list_points_of_sale(
        &self,
        business_unit_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<PointOfSale>, AppError> {
        let tables = self.tables.read().await;
        let mut points: Vec<PointOfSale> = tables
            .points_of_sale
            .iter()
            .filter(|p| p.business_unit_id == business_unit_id)
            .filter(|p| include_inactive || p.is_active)
            .cloned()
            .collect();
        points.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(points)
    }

    async fn set_point_of_sale_active(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> Result<Option<PointOfSale>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .points_of_sale
            .iter_mut()
            .find(|p| p.id == id)
            .map(|point| {
                point.is_active = is_active;
                point.clone()
            }))
    }

    async fn insert_movement(&self, input: &NewMovement) -> Result<CashMovement, AppError> {
        let mut tables = self.tables.write().await;
        tables.insert_movement(input)
    }

    async fn get_movement(&self, id: Uuid) -> Result<Option<CashMovement>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.movements.iter().find(|m| m.id == id).cloned())
    }

    async fn list_movements(
        &self,
        filter: &MovementFilter,
    ) -> Result<Vec<CashMovement>, AppError> {
        let tables = self.tables.read().await;
        let inactive_units: Vec<Uuid> = if filter.active_units_only {
            tables
                .business_units
                .iter()
                .filter(|u| !u.is_active)
                .map(|u| u.id)
                .collect()
        } else {
            Vec::new()
        };
        let mut movements: Vec<CashMovement> = tables
            .movements
            .iter()
            .filter(|m| filter.matches(m) && !inactive_units.contains(&m.business_unit_id))
            .cloned()
            .collect();
        movements.sort_by(|a, b| {
            b.transaction_date
                .cmp(&a.transaction_date)
                .then_with(|| b.sequence_number.cmp(&a.sequence_number))
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        let offset = usize::try_from(filter.offset).unwrap_or(0);
        let limit = filter
            .limit
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(usize::MAX);
        Ok(movements.into_iter().skip(offset).take(limit).collect())
    }

    async fn deactivate_last_movement(
        &self,
        business_unit_id: Uuid,
        id: Uuid,
    ) -> Result<Option<CashMovement>, AppError> {
        let mut tables = self.tables.write().await;
        let last_sequence = tables
            .movements
            .iter()
            .filter(|m| m.business_unit_id == business_unit_id && m.is_active)
            .map(|m| m.sequence_number)
            .max();

        Ok(tables
            .movements
            .iter_mut()
            .find(|m| {
                m.id == id
                    && m.business_unit_id == business_unit_id
                    && m.is_open()
                    && Some(m.sequence_number) == last_sequence
            })
            .map(|movement| {
                movement.is_active = false;
                movement.clone()
            }))
    }

    async fn close_period(
        &self,
        business_unit_id: Uuid,
        label: &str,
        carry_forward: Option<&NewMovement>,
    ) -> Result<ClosedPeriod, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.business_units.iter().any(|u| u.id == business_unit_id) {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Business unit {} not found",
                business_unit_id
            )));
        }

        let mut closed_count = 0;
        for movement in tables
            .movements
            .iter_mut()
            .filter(|m| m.business_unit_id == business_unit_id && m.is_open())
        {
            movement.closed_period = Some(label.to_string());
            closed_count += 1;
        }

        let carry_forward = match carry_forward {
            Some(input) => Some(tables.insert_movement(input)?),
            None => None,
        };

        Ok(ClosedPeriod {
            business_unit_id,
            label: label.to_string(),
            closed_count,
            carry_forward,
        })
    }

    async fn period_exists(&self, business_unit_id: Uuid, label: &str) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.movements.iter().any(|m| {
            m.business_unit_id == business_unit_id && m.closed_period.as_deref() == Some(label)
        }))
    }

    async fn insert_partner(&self, input: &NewPartner) -> Result<Partner, AppError> {
        let mut tables = self.tables.write().await;
        let partner = Partner {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            email: input.email.clone(),
            equity_percentage: input.equity_percentage,
            is_managing_partner: false,
            is_active: true,
            created_at: Utc::now(),
        };
        tables.partners.push(partner.clone());
        Ok(partner)
    }

    async fn get_partner(&self, id: Uuid) -> Result<Option<Partner>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.partners.iter().find(|p| p.id == id).cloned())
    }

    async fn list_partners(&self, include_inactive: bool) -> Result<Vec<Partner>, AppError> {
        let tables = self.tables.read().await;
        let mut partners: Vec<Partner> = tables
            .partners
            .iter()
            .filter(|p| include_inactive || p.is_active)
            .cloned()
            .collect();
        partners.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(partners)
    }

    async fn update_partner(
        &self,
        id: Uuid,
        update: &PartnerUpdate,
    ) -> Result<Option<Partner>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.partners.iter_mut().find(|p| p.id == id).map(|partner| {
            update.apply(partner);
            partner.clone()
        }))
    }

    async fn set_managing_partner(&self, id: Uuid) -> Result<Option<Partner>, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.partners.iter().any(|p| p.id == id && p.is_active) {
            return Ok(None);
        }

        let mut promoted = None;
        for partner in tables.partners.iter_mut() {
            partner.is_managing_partner = partner.id == id;
            if partner.id == id {
                promoted = Some(partner.clone());
            }
        }
        Ok(promoted)
    }

    async fn insert_partner_account(
        &self,
        input: &NewPartnerAccount,
    ) -> Result<PartnerAccount, AppError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let account = PartnerAccount {
            id: Uuid::new_v4(),
            partner_id: input.partner_id,
            name: input.name.clone(),
            balance: Decimal::ZERO,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.partner_accounts.push(account.clone());
        Ok(account)
    }

    async fn get_partner_account(&self, id: Uuid) -> Result<Option<PartnerAccount>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.partner_accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn list_partner_accounts(
        &self,
        partner_id: Uuid,
    ) -> Result<Vec<PartnerAccount>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .partner_accounts
            .iter()
            .filter(|a| a.partner_id == partner_id)
            .cloned()
            .collect())
    }

    async fn adjust_partner_account(
        &self,
        id: Uuid,
        delta: Decimal,
    ) -> Result<Option<PartnerAccount>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .partner_accounts
            .iter_mut()
            .find(|a| a.id == id)
            .map(|account| {
                account.balance += delta;
                account.updated_at = Utc::now();
                account.clone()
            }))
    }

    async fn get_config(&self, key: &str) -> Result<Option<ConfigEntry>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.config.get(key).cloned())
    }

    async fn list_config(&self) -> Result<Vec<ConfigEntry>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.config.values().cloned().collect())
    }

    async fn upsert_config(
        &self,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<ConfigEntry, AppError> {
        let mut tables = self.tables.write().await;
        let entry = ConfigEntry {
            key: key.to_string(),
            value: value.clone(),
            updated_at: Utc::now(),
        };
        tables.config.insert(key.to_string(), entry.clone());
        Ok(entry)
    }

    async fn insert_audit_log(&self, input: &NewAuditLog) -> Result<AuditLog, AppError> {
        let mut tables = self.tables.write().await;
        let log = AuditLog {
            id: Uuid::new_v4(),
            action: input.action.clone(),
            entity: input.entity.clone(),
            entity_id: input.entity_id,
            actor: input.actor.clone(),
            details: input.details.clone(),
            created_at: Utc::now(),
        };
        tables.audit_logs.push(log.clone());
        Ok(log)
    }

    async fn list_audit_logs(&self, limit: i64) -> Result<Vec<AuditLog>, AppError> {
        let tables = self.tables.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(tables.audit_logs.iter().rev().take(limit).cloned().collect())
    }
}
