//! Partner equity: partners, the managing partner and partner accounts.

use crate::dtos::{CreatePartnerRequest, OpenPartnerAccountRequest, UpdatePartnerRequest};
use crate::models::{
    NewAuditLog, NewPartner, NewPartnerAccount, Partner, PartnerAccount, PartnerUpdate,
};
use crate::services::settings::audit;
use crate::services::store::SharedStore;
use rust_decimal::Decimal;
use serde_json::json;
use service_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Ensure active equity stays within 100% once `partner` holds `equity`.
/// `partner` is `None` for a partner that does not exist yet.
pub fn check_equity(
    partners: &[Partner],
    partner: Option<Uuid>,
    equity: Decimal,
) -> Result<(), AppError> {
    let hundred = Decimal::ONE_HUNDRED;
    if equity < Decimal::ZERO || equity > hundred {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Equity percentage must be between 0 and 100"
        )));
    }

    let others: Decimal = partners
        .iter()
        .filter(|p| p.is_active && Some(p.id) != partner)
        .map(|p| p.equity_percentage)
        .sum();
    if others + equity > hundred {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Total equity would be {}%, which exceeds 100%",
            others + equity
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct PartnerService {
    store: SharedStore,
}

impl PartnerService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn get_partner(&self, id: Uuid) -> Result<Partner, AppError> {
        self.store
            .get_partner(id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Partner {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_partners(&self, include_inactive: bool) -> Result<Vec<Partner>, AppError> {
        self.store.list_partners(include_inactive).await
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_partner(
        &self,
        request: CreatePartnerRequest,
        actor: Option<&str>,
    ) -> Result<Partner, AppError> {
        request.validate()?;

        let partners = self.store.list_partners(false).await?;
        check_equity(&partners, None, request.equity_percentage)?;

        let partner = self
            .store
            .insert_partner(&NewPartner {
                name: request.name.trim().to_string(),
                email: request.email,
                equity_percentage: request.equity_percentage,
            })
            .await?;

        info!(partner_id = %partner.id, "Partner created");
        audit(
            self.store.as_ref(),
            NewAuditLog::new("partner.create", "partner", Some(partner.id), actor)
                .with_details(json!({ "equity_percentage": partner.equity_percentage })),
        )
        .await;
        Ok(partner)
    }

    #[instrument(skip(self, request))]
    pub async fn update_partner(
        &self,
        id: Uuid,
        request: UpdatePartnerRequest,
        actor: Option<&str>,
    ) -> Result<Partner, AppError> {
        request.validate()?;

        let existing = self.get_partner(id).await?;
        if let Some(equity) = request.equity_percentage {
            if existing.is_active {
                let partners = self.store.list_partners(false).await?;
                check_equity(&partners, Some(id), equity)?;
            } else {
                check_equity(&[], Some(id), equity)?;
            }
        }

        let update = PartnerUpdate {
            name: request.name.map(|n| n.trim().to_string()),
            email: request.email,
            equity_percentage: request.equity_percentage,
            is_active: None,
        };
        let partner = self
            .store
            .update_partner(id, &update)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Partner {} not found", id)))?;

        audit(
            self.store.as_ref(),
            NewAuditLog::new("partner.update", "partner", Some(id), actor)
                .with_details(json!(update)),
        )
        .await;
        Ok(partner)
    }

    /// Soft-delete a partner. The managing partner must be replaced first.
    #[instrument(skip(self))]
    pub async fn deactivate_partner(
        &self,
        id: Uuid,
        actor: Option<&str>,
    ) -> Result<Partner, AppError> {
        let existing = self.get_partner(id).await?;
        if existing.is_managing_partner {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "The managing partner cannot be deactivated; assign another managing partner first"
            )));
        }

        let update = PartnerUpdate {
            is_active: Some(false),
            ..PartnerUpdate::default()
        };
        let partner = self
            .store
            .update_partner(id, &update)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Partner {} not found", id)))?;

        info!(partner_id = %id, "Partner deactivated");
        audit(
            self.store.as_ref(),
            NewAuditLog::new("partner.deactivate", "partner", Some(id), actor),
        )
        .await;
        Ok(partner)
    }

    /// Make `id` the single managing partner.
    #[instrument(skip(self))]
    pub async fn change_managing_partner(
        &self,
        id: Uuid,
        actor: Option<&str>,
    ) -> Result<Partner, AppError> {
        let target = self.get_partner(id).await?;
        if !target.is_active {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Partner {} is inactive and cannot manage the business",
                id
            )));
        }
        let previous = self.managing_partner().await?;

        let partner = self
            .store
            .set_managing_partner(id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Partner {} not found", id)))?;

        info!(partner_id = %id, "Managing partner changed");
        audit(
            self.store.as_ref(),
            NewAuditLog::new("partner.managing", "partner", Some(id), actor)
                .with_details(json!({ "previous": previous.map(|p| p.id) })),
        )
        .await;
        Ok(partner)
    }

    #[instrument(skip(self))]
    pub async fn managing_partner(&self) -> Result<Option<Partner>, AppError> {
        Ok(self
            .store
            .list_partners(false)
            .await?
            .into_iter()
            .find(|p| p.is_managing_partner))
    }

    // -------------------------------------------------------------------------
    // Partner accounts
    // -------------------------------------------------------------------------

    #[instrument(skip(self, request))]
    pub async fn open_account(
        &self,
        partner_id: Uuid,
        request: OpenPartnerAccountRequest,
        actor: Option<&str>,
    ) -> Result<PartnerAccount, AppError> {
        request.validate()?;

        let partner = self.get_partner(partner_id).await?;
        if !partner.is_active {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Partner {} is inactive",
                partner_id
            )));
        }

        let account = self
            .store
            .insert_partner_account(&NewPartnerAccount {
                partner_id,
                name: request.name.trim().to_string(),
            })
            .await?;

        audit(
            self.store.as_ref(),
            NewAuditLog::new("partner_account.open", "partner_account", Some(account.id), actor)
                .with_details(json!({ "partner_id": partner_id, "name": account.name })),
        )
        .await;
        Ok(account)
    }

    #[instrument(skip(self))]
    pub async fn list_accounts(&self, partner_id: Uuid) -> Result<Vec<PartnerAccount>, AppError> {
        self.get_partner(partner_id).await?;
        self.store.list_partner_accounts(partner_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn partner(equity: i64, is_active: bool) -> Partner {
        Partner {
            id: Uuid::new_v4(),
            name: "Partner".to_string(),
            email: None,
            equity_percentage: Decimal::from(equity),
            is_managing_partner: false,
            is_active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_equity_within_limit() {
        let partners = vec![partner(60, true), partner(30, true)];
        assert!(check_equity(&partners, None, Decimal::from(10)).is_ok());
        assert!(check_equity(&partners, None, Decimal::from(11)).is_err());
    }

    #[test]
    fn test_equity_ignores_inactive_partners() {
        let partners = vec![partner(60, true), partner(90, false)];
        assert!(check_equity(&partners, None, Decimal::from(40)).is_ok());
    }

    #[test]
    fn test_equity_update_replaces_own_share() {
        let partners = vec![partner(60, true), partner(40, true)];
        let id = partners[1].id;
        assert!(check_equity(&partners, Some(id), Decimal::from(40)).is_ok());
        assert!(check_equity(&partners, Some(id), Decimal::from(41)).is_err());
    }

    #[test]
    fn test_equity_range() {
        assert!(check_equity(&[], None, Decimal::from(-1)).is_err());
        assert!(check_equity(&[], None, Decimal::from(101)).is_err());
        assert!(check_equity(&[], None, Decimal::ONE_HUNDRED).is_ok());
    }
}
