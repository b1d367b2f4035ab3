//! Local persistence of the whole `AppState` as a single JSON document.

use crate::model::budget::generate_budget_id;
use crate::model::{AppState, Budget, BudgetPatch, Category, Currency, Settings, SettingsPatch};
use crate::{utils, Error, Result};
use anyhow::Context;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const BUDGETS: &str = "budgets";
const CATEGORIES: &str = "categories";
const SETTINGS: &str = "settings";
const CURRENCY: &str = "currency";
const ID: &str = "id";

/// The outcome of reading the local document.
#[derive(Debug)]
pub enum Loaded {
    /// There is no document yet.
    Missing,
    /// The document was read in full.
    Parsed(AppState),
    /// Some or all of the document could not be parsed. `state` holds what could be recovered,
    /// with defaults in place of everything else.
    Partial { state: AppState, error: Error },
}

impl Loaded {
    /// The recovered state, or `None` if there was no document.
    pub fn into_state(self) -> Option<AppState> {
        match self {
            Loaded::Missing => None,
            Loaded::Parsed(state) => Some(state),
            Loaded::Partial { state, .. } => Some(state),
        }
    }
}

/// Reads and writes the `AppState` document at a fixed path.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document, recovering whatever parses. This never fails: problems are logged and
    /// reported through `Loaded::Partial`.
    pub async fn load(&self) -> Loaded {
        if !self.path.exists() {
            debug!("No local data at {}", self.path.display());
            return Loaded::Missing;
        }

        let text = match utils::read(&self.path).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Unable to read local data: {e:#}");
                return Loaded::Partial {
                    state: AppState::default(),
                    error: e.into(),
                };
            }
        };

        let (state, problems) = recover(&text);
        if problems.is_empty() {
            Loaded::Parsed(state)
        } else {
            let message = problems.join("; ");
            warn!("Local data at {} was partly unreadable: {message}", self.path.display());
            Loaded::Partial {
                state,
                error: Error::parse(message),
            }
        }
    }

    /// Writes the full state. The document is replaced atomically, so a failed save leaves the
    /// previous document intact.
    pub async fn save(&self, state: &AppState) -> Result<()> {
        let json = serde_json::to_vec_pretty(state).context("Unable to serialize local data")?;
        utils::write_atomic(&self.path, json).await?;
        debug!("Saved {} budgets to {}", state.budgets().len(), self.path.display());
        Ok(())
    }

    /// A pretty-printed snapshot of `state` in the same shape as the local document.
    pub fn export(&self, state: &AppState) -> Result<Vec<u8>> {
        let json = serde_json::to_vec_pretty(state).context("Unable to serialize export")?;
        Ok(json)
    }

    /// Applies an exported document to `current` and returns the result. `budgets` and
    /// `categories` replace the current lists when present; `settings` is merged over the current
    /// settings. Nothing is returned unless the whole document is valid.
    pub fn import(&self, current: &AppState, blob: &[u8]) -> Result<AppState> {
        let value: Value = serde_json::from_slice(blob)?;
        let Value::Object(fields) = value else {
            return Err(Error::parse("The import file must contain a JSON object"));
        };

        let mut next = current.clone();
        if let Some(budgets @ Value::Array(_)) = fields.get(BUDGETS) {
            next.budgets = serde_json::from_value(budgets.clone())
                .map_err(|e| Error::parse(format!("Invalid budgets: {e}")))?;
        }
        if let Some(categories @ Value::Array(_)) = fields.get(CATEGORIES) {
            next.categories = serde_json::from_value(categories.clone())
                .map_err(|e| Error::parse(format!("Invalid categories: {e}")))?;
        }
        if let Some(settings @ Value::Object(_)) = fields.get(SETTINGS) {
            let patch: SettingsPatch = serde_json::from_value(settings.clone())
                .map_err(|e| Error::parse(format!("Invalid settings: {e}")))?;
            next.settings = next.settings.merged(patch);
        }
        Ok(next)
    }
}

/// The name an export is saved under on `date`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("budgettrackr_export_{}.json", date.format("%Y-%m-%d"))
}

/// Parses as much of a local document as possible, returning the state and a description of
/// every part that had to be defaulted or dropped.
fn recover(text: &str) -> (AppState, Vec<String>) {
    let mut problems = Vec::new();
    let mut state = AppState::default();

    let fields = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => {
            problems.push("the document is not a JSON object".to_string());
            return (state, problems);
        }
        Err(e) => {
            problems.push(e.to_string());
            return (state, problems);
        }
    };

    if let Some(settings) = fields.get(SETTINGS) {
        state.settings = recover_settings(&state.settings, settings, &mut problems);
    }
    if let Some(categories) = recover_list::<Category>(&fields, CATEGORIES, &mut problems) {
        state.categories = categories;
    }
    let currency = state.settings.default_currency();
    if let Some(Value::Array(items)) = fields.get(BUDGETS) {
        state.budgets = items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| recover_budget(i, item, currency, &mut problems))
            .collect();
    } else if fields.contains_key(BUDGETS) {
        problems.push(format!("{BUDGETS}: expected an array"));
    }

    (state, problems)
}

/// Applies each settings key on its own, so one bad value does not discard the others.
fn recover_settings(current: &Settings, value: &Value, problems: &mut Vec<String>) -> Settings {
    let Value::Object(fields) = value else {
        problems.push(format!("{SETTINGS}: expected an object"));
        return current.clone();
    };
    let mut settings = current.clone();
    for (key, value) in fields {
        match serde_json::from_value::<SettingsPatch>(single(key, value)) {
            Ok(patch) => settings = settings.merged(patch),
            Err(e) => problems.push(format!("{SETTINGS}.{key}: {e}")),
        }
    }
    settings
}

/// Parses one budget, dropping the fields that do not parse. A missing or bad `currency` becomes
/// `currency` and a missing `id` is generated. The budget is only lost when a required field
/// (name, amount, category or a date) has no usable value.
fn recover_budget(
    i: usize,
    item: &Value,
    currency: Currency,
    problems: &mut Vec<String>,
) -> Option<Budget> {
    let first_error = match serde_json::from_value::<Budget>(item.clone()) {
        Ok(budget) => return Some(budget),
        Err(e) => e,
    };
    let Value::Object(fields) = item else {
        problems.push(format!("{BUDGETS}[{i}]: {first_error}"));
        return None;
    };

    let mut repaired = Map::new();
    for (key, value) in fields {
        match serde_json::from_value::<BudgetPatch>(single(key, value)) {
            Ok(_) => {
                repaired.insert(key.clone(), value.clone());
            }
            Err(e) => problems.push(format!("{BUDGETS}[{i}].{key}: {e}")),
        }
    }
    repaired
        .entry(CURRENCY)
        .or_insert_with(|| Value::String(currency.to_string()));
    repaired
        .entry(ID)
        .or_insert_with(|| Value::String(generate_budget_id()));

    match serde_json::from_value(Value::Object(repaired)) {
        Ok(budget) => Some(budget),
        Err(e) => {
            problems.push(format!("{BUDGETS}[{i}]: {e}"));
            None
        }
    }
}

fn single(key: &str, value: &Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value.clone());
    Value::Object(map)
}

/// Parses `fields[key]` element by element, skipping the elements that do not parse. Returns
/// `None` when the key is absent or is not an array.
fn recover_list<T>(
    fields: &Map<String, Value>,
    key: &str,
    problems: &mut Vec<String>,
) -> Option<Vec<T>>
where
    T: serde::de::DeserializeOwned,
{
    let value = fields.get(key)?;
    let Value::Array(items) = value else {
        problems.push(format!("{key}: expected an array"));
        return None;
    };
    let mut parsed = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match serde_json::from_value(item.clone()) {
            Ok(t) => parsed.push(t),
            Err(e) => problems.push(format!("{key}[{i}]: {e}")),
        }
    }
    Some(parsed)
}
