//! System orchestration, startup, and shutdown logic.

pub mod catalog_system;
pub mod telemetry;

pub use catalog_system::*;
pub use telemetry::*;
