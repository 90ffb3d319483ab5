pub mod database;
pub mod metrics;

pub use database::{Database, NotificationStore};
pub use metrics::{get_metrics, init_metrics, record_lookup};
