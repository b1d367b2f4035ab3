//! Implements the `Transport` trait with an in-memory remote for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a budget server.

use crate::api::{Body, Request, Transport, BUDGETS_PATH, CATEGORIES_PATH, SETTINGS_PATH};
use crate::model::budget::generate_budget_id;
use crate::model::{AppState, Budget, BudgetDraft, Category, Currency, SettingsPatch, Theme};
use crate::{Error, Result};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// The data held by a `TestRemote`, along with a log of the calls it received.
#[derive(Debug, Clone, PartialEq)]
pub struct TestRemoteState {
    pub budgets: Vec<Budget>,
    pub categories: Vec<Category>,
    pub default_currency: Currency,
    pub theme: Theme,
    /// `"{METHOD} {path}"` for every request received, in order.
    pub calls: Vec<String>,
    /// When set, every request fails with this status and an empty body.
    pub fail_with: Option<u16>,
    /// Requests matching one of these `"{METHOD} {path}"` entries fail with a 500.
    pub fail_calls: Vec<String>,
}

impl Default for TestRemoteState {
    /// The remote starts out with the same example data a new installation has.
    fn default() -> Self {
        let seeded = AppState::seeded();
        Self {
            budgets: seeded.budgets().to_vec(),
            categories: seeded.categories().to_vec(),
            default_currency: seeded.settings().default_currency(),
            theme: seeded.settings().theme(),
            calls: Vec::new(),
            fail_with: None,
            fail_calls: Vec::new(),
        }
    }
}

/// An implementation of `Transport` that behaves like the budget service but keeps its data in
/// memory. Clones share the same data, so a test can keep one handle to inspect or change the
/// remote while the app owns another.
#[derive(Debug, Clone, Default)]
pub struct TestRemote {
    state: Arc<Mutex<TestRemoteState>>,
}

impl TestRemote {
    pub fn new(state: TestRemoteState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// A copy of the current remote data.
    pub fn state(&self) -> TestRemoteState {
        self.lock().clone()
    }

    /// Makes every following request fail with `status`, or succeed again with `None`.
    pub fn fail_with(&self, status: Option<u16>) {
        self.lock().fail_with = status;
    }

    /// Makes every following request matching `"{METHOD} {path}"` fail with a 500.
    pub fn fail_call(&self, call: impl Into<String>) {
        self.lock().fail_calls.push(call.into());
    }

    /// Clears the call log.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Counts the received requests that match `"{METHOD} {path}"`.
    pub fn count(&self, call: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.as_str() == call).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TestRemoteState> {
        // A panic while holding the lock can only come from a failed test assertion.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait::async_trait]
impl Transport for TestRemote {
    async fn send(&self, _base_url: &str, request: Request) -> Result<Body> {
        let mut state = self.lock();
        let call = format!("{} {}", request.method, request.path);
        state.calls.push(call.clone());
        if let Some(status) = state.fail_with {
            return Err(Error::http(status, ""));
        }
        if state.fail_calls.contains(&call) {
            return Err(Error::http(500, "Internal Server Error"));
        }
        route(&mut state, request)
    }
}

fn route(state: &mut TestRemoteState, request: Request) -> Result<Body> {
    let Request {
        method,
        path,
        segment,
        body,
    } = request;
    let body = body.unwrap_or(Value::Null);

    match (path, segment) {
        (BUDGETS_PATH, None) if method == Method::GET => json_body(&state.budgets),
        (BUDGETS_PATH, None) if method == Method::POST => {
            let draft: BudgetDraft = decode(body)?;
            let budget = Budget::new_local(draft);
            state.budgets.push(budget.clone());
            json_body(&budget)
        }
        (BUDGETS_PATH, Some(id)) if method == Method::PUT => {
            let draft: BudgetDraft = decode(body)?;
            let budget = state
                .budgets
                .iter_mut()
                .find(|b| b.id() == id)
                .ok_or_else(|| not_found("Budget not found"))?;
            budget.apply_draft(draft, crate::model::Timestamp::now());
            json_body(&*budget)
        }
        (BUDGETS_PATH, Some(id)) if method == Method::DELETE => {
            let before = state.budgets.len();
            state.budgets.retain(|b| b.id() != id);
            if state.budgets.len() == before {
                return Err(not_found("Budget not found"));
            }
            Ok(Body::Text(String::new()))
        }
        (CATEGORIES_PATH, None) if method == Method::GET => {
            let named: Vec<Value> = state
                .categories
                .iter()
                .map(|c| json!({ "name": c.name() }))
                .collect();
            Ok(Body::Json(Value::Array(named)))
        }
        (CATEGORIES_PATH, None) if method == Method::POST => {
            let name = body
                .get("name")
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or_default()
                .to_string();
            if name.is_empty() {
                return Err(Error::http(422, "Category name is required"));
            }
            if state.categories.iter().any(|c| c.name() == name) {
                return Err(Error::http(400, "Category already exists"));
            }
            state.categories.push(Category::new(name.as_str()));
            Ok(Body::Json(json!({ "name": name })))
        }
        (CATEGORIES_PATH, Some(name)) if method == Method::DELETE => {
            let before = state.categories.len();
            state.categories.retain(|c| c.name() != name);
            if state.categories.len() == before {
                return Err(not_found("Category not found"));
            }
            Ok(Body::Text(String::new()))
        }
        (SETTINGS_PATH, None) if method == Method::GET => Ok(Body::Json(settings_json(state))),
        (SETTINGS_PATH, None) if method == Method::PUT => {
            let patch: SettingsPatch = decode(body)?;
            if let Some(currency) = patch.default_currency {
                state.default_currency = currency;
            }
            if let Some(theme) = patch.theme {
                state.theme = theme;
            }
            Ok(Body::Json(settings_json(state)))
        }
        (path, _) => Err(not_found(format!("No route for {method} {path}"))),
    }
}

/// The service only stores the currency and theme; it never returns `userName`.
fn settings_json(state: &TestRemoteState) -> Value {
    json!({ "defaultCurrency": state.default_currency, "theme": state.theme })
}

fn decode<T: serde::de::DeserializeOwned>(body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|e| Error::http(422, e.to_string()))
}

fn json_body<T: serde::Serialize>(value: &T) -> Result<Body> {
    serde_json::to_value(value)
        .map(Body::Json)
        .map_err(|e| Error::http(500, e.to_string()))
}

fn not_found(detail: impl Into<String>) -> Error {
    Error::http(404, detail)
}
