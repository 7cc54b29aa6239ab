//! Minebank accrual service: hosts the accrual engine.
//!
//! The service is the single writer around the engine. It:
//! - Runs the periodic tick task on a fixed cadence
//! - Reloads and persists engine state around every operation
//! - Applies control operations (toggle, target unit, rate, admin overwrites)
//! - Publishes every outcome on a broadcast channel

pub mod config;
pub mod error;
pub mod event;
pub mod service;
pub mod shutdown;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use event::AccrualEvent;
pub use service::{AccrualService, ServiceStatus};
pub use shutdown::ShutdownController;
