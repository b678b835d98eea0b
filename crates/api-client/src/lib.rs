//! REST client for the CRM backend: customers, orders, segments and
//! campaigns.

pub mod client;
pub mod envelope;
pub mod error;

pub use client::{CrmClient, HealthStatus};
pub use error::ApiError;
