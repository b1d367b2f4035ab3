//! Command handlers for the budget CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod budget;
mod category;
mod data;
mod settings;
mod stats;
mod sync;

use crate::app::Warning;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info, warn};

pub use budget::{budget_add, budget_delete, budget_list, budget_update};
pub use category::{category_add, category_delete, category_list, CategoryUsage};
pub use data::{export, import};
pub use settings::{settings_set, settings_show};
pub use stats::{stats, StatsReport};
pub use sync::{sync_disable, sync_enable, sync_pull, sync_status, sync_url, SyncStatus};

/// The output type for a command. This allows the command to return a consistent message,
/// the warnings raised while it ran and, optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Non-fatal problems, such as a change that could only be saved locally.
    warnings: Vec<String>,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            warnings: Vec::new(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            warnings: Vec::new(),
            structure: None,
        }
    }

    pub fn with_warnings(mut self, warnings: &[Warning]) -> Self {
        self.warnings.extend(warnings.iter().map(|w| w.to_string()));
        self
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!`, each warning to `warn!` and the structured data (if it
    /// exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        for warning in &self.warnings {
            warn!("{warning}");
        }
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}
