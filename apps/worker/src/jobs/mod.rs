//! Background job definitions and handlers
//!
//! This module contains the long-running scan loops:
//! - Queue watcher that scans once downloads drain
//! - Interval schedule for periodic library refreshes

pub mod media_scan;
