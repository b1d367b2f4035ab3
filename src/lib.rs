//! Local-first budget tracking with optional synchronization to a remote budget service.
//!
//! All data lives in one JSON document under `$BUDGET_HOME`. When sync is enabled, every change
//! is sent to the remote service first and then written locally regardless of the outcome, so
//! the application keeps working while the service is unreachable.

pub mod api;
pub mod app;
pub mod args;
mod backup;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod stats;
pub mod store;
mod utils;


pub use api::Mode;
pub use app::{App, Applied, Reconciliation, SyncMode, Warning};
pub use backup::Backup;
pub use config::{Config, SyncConfig};
pub use error::Error;
pub use error::Result;
