//! Services backing the HTTP routes

pub mod health;

pub use health::{HealthCheckResponse, HealthService, ServiceHealth, ServiceStatus};
