pub mod config;
pub mod error;
pub mod stats;
pub mod types;

pub use config::AppConfig;
pub use error::{CrmError, CrmResult};
pub use stats::{DashboardTotals, OrderStats};
pub use types::{Customer, RecordId};
