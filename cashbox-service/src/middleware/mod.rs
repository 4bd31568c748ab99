mod actor;
mod metrics;

pub use actor::{Actor, USER_ID_HEADER};
pub use metrics::http_metrics_middleware;
