pub mod aggregation;
pub mod database;
pub mod ledger;
pub mod memory;
pub mod metrics;
pub mod partners;
pub mod report;
pub mod settings;
pub mod store;

pub use aggregation::AggregationService;
pub use database::Database;
pub use ledger::LedgerService;
pub use memory::InMemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use partners::PartnerService;
pub use report::ReportService;
pub use settings::SettingsService;
pub use store::{CashboxStore, SharedStore};
