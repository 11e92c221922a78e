//! HTTP route handlers for the Refresharr API
//!
//! - Media server settings and manual scan endpoints
//! - Health check and status endpoints

pub mod health;
pub mod media_servers;

pub use health::{health_router, HealthState};
pub use media_servers::{media_servers_router, MediaServersState};
