//! Typed operations against the remote budget service.

use crate::api::{Body, Request, Transport, BUDGETS_PATH, CATEGORIES_PATH, SETTINGS_PATH};
use crate::config::SyncConfig;
use crate::model::{
    Budget, BudgetDraft, BudgetPatch, Category, RemoteCategory, Settings, SettingsPatch,
};
use crate::{Error, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

/// A CRUD proxy to the remote service. Each method maps to one request.
///
/// The gateway itself does not check `is_enabled`; the app decides whether to call it at all.
pub struct SyncGateway {
    config: SyncConfig,
    transport: Box<dyn Transport>,
}

impl std::fmt::Debug for SyncGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncGateway")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SyncGateway {
    pub fn new(config: SyncConfig, transport: Box<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.use_api()
    }

    pub fn base_url(&self) -> &str {
        self.config.api_base_url()
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.config.set_use_api(enabled);
    }

    pub(crate) fn set_base_url(&mut self, url: impl Into<String>) {
        self.config.set_api_base_url(url);
    }

    pub async fn fetch_budgets(&self) -> Result<Vec<Budget>> {
        let body = self.send(Request::new(Method::GET, BUDGETS_PATH)).await?;
        decode(BUDGETS_PATH, body)
    }

    /// Creates a budget remotely. Returns `None` when the service answered without a usable
    /// budget (for example, without an id), in which case the caller builds the budget locally.
    pub async fn create_budget(&self, draft: &BudgetDraft) -> Result<Option<Budget>> {
        let request = Request::new(Method::POST, BUDGETS_PATH).body(to_json(draft)?);
        let body = self.send(request).await?;
        let created = body
            .json()
            .and_then(|value| serde_json::from_value::<Budget>(value).ok())
            .filter(|budget| !budget.id().is_empty());
        if created.is_none() {
            debug!("The remote service did not return the created budget");
        }
        Ok(created)
    }

    /// Updates a budget remotely and returns whatever fields the service sent back, to be merged
    /// over the existing budget.
    pub async fn update_budget(&self, id: &str, draft: &BudgetDraft) -> Result<BudgetPatch> {
        let request = Request::new(Method::PUT, BUDGETS_PATH)
            .segment(id)
            .body(to_json(draft)?);
        match self.send(request).await? {
            Body::Json(value @ Value::Object(_)) => decode(BUDGETS_PATH, Body::Json(value)),
            _ => Ok(BudgetPatch::default()),
        }
    }

    pub async fn delete_budget(&self, id: &str) -> Result<()> {
        self.send(Request::new(Method::DELETE, BUDGETS_PATH).segment(id))
            .await
            .map(|_| ())
    }

    /// Fetches categories, accepting both `{"name": ...}` objects and bare strings.
    pub async fn fetch_categories(&self) -> Result<Vec<Category>> {
        let body = self.send(Request::new(Method::GET, CATEGORIES_PATH)).await?;
        let raw: Vec<RemoteCategory> = decode(CATEGORIES_PATH, body)?;
        Ok(raw.into_iter().map(Category::from).collect())
    }

    pub async fn create_category(&self, name: &str) -> Result<()> {
        let request = Request::new(Method::POST, CATEGORIES_PATH).body(json!({ "name": name }));
        self.send(request).await.map(|_| ())
    }

    pub async fn delete_category(&self, name: &str) -> Result<()> {
        self.send(Request::new(Method::DELETE, CATEGORIES_PATH).segment(name))
            .await
            .map(|_| ())
    }

    /// Fetches settings. The service may send only some fields, so the result is a patch.
    pub async fn fetch_settings(&self) -> Result<SettingsPatch> {
        let body = self.send(Request::new(Method::GET, SETTINGS_PATH)).await?;
        decode(SETTINGS_PATH, body)
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<()> {
        let request = Request::new(Method::PUT, SETTINGS_PATH).body(to_json(settings)?);
        self.send(request).await.map(|_| ())
    }

    async fn send(&self, request: Request) -> Result<Body> {
        debug!("{} {}", request.method, request.path);
        self.transport.send(self.base_url(), request).await
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| Error::transport(format!("Unable to encode the request: {e}")))
}

/// Decodes a JSON body. A text body or a body of the wrong shape is a remote failure, since the
/// service did not answer the way it should.
fn decode<T: DeserializeOwned>(path: &str, body: Body) -> Result<T> {
    let value = body.json().ok_or_else(|| {
        Error::transport(format!("Expected a JSON response from {path}"))
    })?;
    serde_json::from_value(value)
        .map_err(|e| Error::transport(format!("Unexpected response from {path}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestRemote;
    use crate::model::{Amount, Currency, Theme};
    use chrono::NaiveDate;
    use std::str::FromStr;

    /// A transport that always answers with the same body.
    struct Fixed(Body);

    #[async_trait::async_trait]
    impl Transport for Fixed {
        async fn send(&self, _base_url: &str, _request: Request) -> Result<Body> {
            Ok(self.0.clone())
        }
    }

    fn gateway(transport: impl Transport + 'static) -> SyncGateway {
        SyncGateway::new(SyncConfig::new(true, "http://x"), Box::new(transport))
    }

    fn draft() -> BudgetDraft {
        let day = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        BudgetDraft::new("Test", Amount::from_str("50").unwrap(), Currency::Ghs, "Food", day, day)
    }

    #[tokio::test]
    async fn test_categories_are_normalized() {
        let body = Body::Json(json!([{"name": "Food"}, "Rent"]));
        let categories = gateway(Fixed(body)).fetch_categories().await.unwrap();
        assert_eq!(categories, vec![Category::new("Food"), Category::new("Rent")]);
    }

    #[tokio::test]
    async fn test_create_without_id_is_none() {
        let body = Body::Json(json!({"name": "Test"}));
        assert!(gateway(Fixed(body)).create_budget(&draft()).await.unwrap().is_none());
        let text = Body::Text("created".into());
        assert!(gateway(Fixed(text)).create_budget(&draft()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_with_remote() {
        let remote = TestRemote::default();
        let gateway = gateway(remote.clone());
        let created = gateway.create_budget(&draft()).await.unwrap().unwrap();
        assert_eq!(created.name(), "Test");
        assert!(created.created_at().is_some());
        assert_eq!(remote.state().budgets.len(), 4);
        assert_eq!(remote.count("POST /api/budgets"), 1);
    }

    #[tokio::test]
    async fn test_update_returns_patch() {
        let remote = TestRemote::default();
        let id = remote.state().budgets[0].id().to_string();
        let gateway = gateway(remote);
        let patch = gateway.update_budget(&id, &draft()).await.unwrap();
        assert_eq!(patch.name.as_deref(), Some("Test"));
        assert_eq!(patch.id.as_deref(), Some(id.as_str()));
    }

    #[tokio::test]
    async fn test_partial_settings() {
        let body = Body::Json(json!({"theme": "light"}));
        let patch = gateway(Fixed(body)).fetch_settings().await.unwrap();
        assert_eq!(patch.theme, Some(Theme::Light));
        assert!(patch.default_currency.is_none());
        assert!(patch.user_name.is_none());
    }

    #[tokio::test]
    async fn test_wrong_shape_is_remote_error() {
        let err = gateway(Fixed(Body::Text("<html>".into())))
            .fetch_budgets()
            .await
            .unwrap_err();
        assert!(err.is_remote());
        let err = gateway(Fixed(Body::Json(json!({"oops": true}))))
            .fetch_budgets()
            .await
            .unwrap_err();
        assert!(err.is_remote());
    }

    #[tokio::test]
    async fn test_remote_failure_propagates() {
        let remote = TestRemote::default();
        remote.fail_with(Some(503));
        let err = gateway(remote).delete_budget("nope").await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 503");
    }
}
