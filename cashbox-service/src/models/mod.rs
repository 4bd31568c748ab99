//! Domain models for cashbox-service.

mod aggregates;
mod app_config;
mod audit_log;
mod business_unit;
mod category;
mod movement;
mod partner;
mod point_of_sale;

pub use aggregates::{
    ActivityItem, BalanceSummary, DailySales, DashboardSummary, Granularity, ReportData,
    ReportRow, SeriesPoint, UnitBalance,
};
pub use app_config::ConfigEntry;
pub use audit_log::{AuditLog, NewAuditLog};
pub use business_unit::{sort_for_display, BusinessUnit, BusinessUnitUpdate, NewBusinessUnit};
pub use category::{CategoryUpdate, MovementCategory, NewCategory};
pub use movement::{CashMovement, ClosedPeriod, MovementFilter, MovementType, NewMovement};
pub use partner::{NewPartner, NewPartnerAccount, Partner, PartnerAccount, PartnerUpdate};
pub use point_of_sale::{NewPointOfSale, PointOfSale};
