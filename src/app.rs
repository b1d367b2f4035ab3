//! The application controller.
//!
//! `App` owns the in-memory `AppState` together with the `LocalStore` and the `SyncGateway`, and
//! is the only place that mutates state. Every mutation follows the same policy: when sync is
//! enabled the remote service is asked first, and whatever happens there the change is applied
//! in memory and written to the local document. A remote failure never blocks or rolls back a
//! change; it only produces a `Warning`.

use crate::api::{self, Mode, SyncGateway, Transport};
use crate::backup::{PRE_IMPORT, RECOVERED};
use crate::model::{AppState, Budget, BudgetDraft, Category, Settings, SettingsPatch, Timestamp};
use crate::store::{export_file_name, Loaded, LocalStore};
use crate::{utils, Config, Error, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A non-fatal problem that happened while applying a change. The change itself went through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Warning {
    /// The remote call failed, so the change exists only locally.
    SavedLocally { action: String, cause: String },
    /// The change was applied in memory but the local document could not be written.
    NotPersisted { cause: String },
}

impl Warning {
    fn saved_locally(action: &str, cause: &Error) -> Self {
        Warning::SavedLocally {
            action: action.to_string(),
            cause: cause.to_string(),
        }
    }
}

impl Display for Warning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::SavedLocally { action, .. } => {
                write!(f, "API error {action}. Saved locally.")
            }
            Warning::NotPersisted { cause } => write!(f, "Unable to save data locally: {cause}"),
        }
    }
}

/// The result of a mutation along with any warnings raised while applying it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Applied<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> Applied<T> {
    fn new(value: T, warnings: Vec<Warning>) -> Self {
        Self { value, warnings }
    }
}

/// Whether mutations go to the remote service before local storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    LocalOnly,
    RemoteBacked,
}

serde_plain::derive_display_from_serialize!(SyncMode);

/// Which parts of the remote view were applied by a reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub settings: bool,
    pub categories: bool,
    pub budgets: bool,
}

pub struct App {
    config: Config,
    store: LocalStore,
    gateway: SyncGateway,
    state: AppState,
}

impl App {
    /// Loads local data and then, when sync is enabled, pulls the remote view once.
    pub async fn open(config: Config, mode: Mode) -> Result<Self> {
        let transport = api::transport(mode)?;
        let mut app = Self::load(config, transport).await;
        app.start().await;
        Ok(app)
    }

    /// Loads local data without contacting the remote service. A missing document, or one with
    /// no budgets, gets the example budgets, which are saved right away so their ids are stable.
    /// A document that only partly parsed is copied to the backups and left as it is on disk
    /// until the next change is saved.
    pub async fn load(config: Config, transport: Box<dyn Transport>) -> Self {
        let store = LocalStore::new(config.data_path());
        let gateway = SyncGateway::new(config.sync().clone(), transport);

        let (mut state, seed) = match store.load().await {
            Loaded::Missing => (AppState::default(), true),
            Loaded::Parsed(state) => {
                let empty = state.budgets().is_empty();
                (state, empty)
            }
            Loaded::Partial { state, error } => {
                warn!("Recovered what could be read from local data: {error}");
                keep_unreadable(&config, store.path()).await;
                (state, false)
            }
        };

        if seed {
            debug!("Providing example budgets");
            state.seed_budgets();
        }

        let app = Self {
            config,
            store,
            gateway,
            state,
        };
        if seed {
            if let Err(e) = app.store.save(&app.state).await {
                warn!("Unable to save the example budgets: {e}");
            }
        }
        app
    }

    /// Runs the startup reconciliation if sync is enabled.
    pub async fn start(&mut self) -> Option<Reconciliation> {
        if self.gateway.is_enabled() {
            Some(self.reconcile().await)
        } else {
            None
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn gateway(&self) -> &SyncGateway {
        &self.gateway
    }

    pub fn sync_mode(&self) -> SyncMode {
        if self.gateway.is_enabled() {
            SyncMode::RemoteBacked
        } else {
            SyncMode::LocalOnly
        }
    }

    /// Replaces local data with the remote view. Settings are fetched first, then categories and
    /// budgets together. Any fetch may fail without affecting the others, and failures are never
    /// surfaced; the local data simply stays as it was.
    pub async fn reconcile(&mut self) -> Reconciliation {
        let mut outcome = Reconciliation::default();

        match self.gateway.fetch_settings().await {
            Ok(patch) => {
                self.state.settings = self.state.settings.merged(patch);
                outcome.settings = true;
            }
            Err(e) => debug!("Unable to fetch remote settings: {e}"),
        }

        let (categories, budgets) = tokio::join!(
            self.gateway.fetch_categories(),
            self.gateway.fetch_budgets()
        );
        match categories {
            Ok(categories) if !categories.is_empty() => {
                self.state.categories = categories;
                outcome.categories = true;
            }
            Ok(_) => debug!("The remote service has no categories, keeping local ones"),
            Err(e) => debug!("Unable to fetch remote categories: {e}"),
        }
        match budgets {
            Ok(budgets) => {
                self.state.budgets = budgets;
                outcome.budgets = true;
            }
            Err(e) => debug!("Unable to fetch remote budgets: {e}"),
        }

        if let Err(e) = self.store.save(&self.state).await {
            debug!("Unable to cache the remote data locally: {e}");
        }
        info!(
            "Reconciled with {}: settings={}, categories={}, budgets={}",
            self.gateway.base_url(),
            outcome.settings,
            outcome.categories,
            outcome.budgets
        );
        outcome
    }

    pub async fn create_budget(&mut self, draft: BudgetDraft) -> Result<Applied<Budget>> {
        let draft = draft.normalized();
        draft.validate(self.state.categories())?;

        let mut warnings = Vec::new();
        let budget = if self.gateway.is_enabled() {
            match self.gateway.create_budget(&draft).await {
                Ok(Some(budget)) => budget,
                Ok(None) => Budget::new_local(draft),
                Err(e) => {
                    warn!("Unable to create the budget remotely: {e}");
                    warnings.push(Warning::saved_locally("creating budget", &e));
                    Budget::new_local(draft)
                }
            }
        } else {
            Budget::new_local(draft)
        };

        self.state.budgets.push(budget.clone());
        self.persist(&mut warnings).await;
        Ok(Applied::new(budget, warnings))
    }

    /// Replaces the user-editable fields of budget `id`. When the remote service accepts the
    /// change, whatever it sends back is merged over the result.
    pub async fn update_budget(&mut self, id: &str, draft: BudgetDraft) -> Result<Applied<Budget>> {
        let draft = draft.normalized();
        draft.validate(self.state.categories())?;
        if self.state.budget(id).is_none() {
            return Err(budget_not_found(id));
        }

        let mut warnings = Vec::new();
        let remote = if self.gateway.is_enabled() {
            match self.gateway.update_budget(id, &draft).await {
                Ok(patch) => Some(patch),
                Err(e) => {
                    warn!("Unable to update the budget remotely: {e}");
                    warnings.push(Warning::saved_locally("updating budget", &e));
                    None
                }
            }
        } else {
            None
        };

        let budget = self
            .state
            .budget_mut(id)
            .ok_or_else(|| budget_not_found(id))?;
        budget.apply_draft(draft, Timestamp::now());
        if let Some(patch) = remote {
            budget.merge(patch);
        }
        let updated = budget.clone();

        self.persist(&mut warnings).await;
        Ok(Applied::new(updated, warnings))
    }

    /// Removes budget `id`. A remote failure is ignored, since the budget ends up gone either way.
    pub async fn delete_budget(&mut self, id: &str) -> Result<Applied<Budget>> {
        let Some(position) = self.state.budgets().iter().position(|b| b.id() == id) else {
            return Err(budget_not_found(id));
        };

        if self.gateway.is_enabled() {
            if let Err(e) = self.gateway.delete_budget(id).await {
                debug!("Ignoring remote failure deleting budget {id}: {e}");
            }
        }

        let removed = self.state.budgets.remove(position);
        let mut warnings = Vec::new();
        self.persist(&mut warnings).await;
        Ok(Applied::new(removed, warnings))
    }

    pub async fn add_category(&mut self, name: &str) -> Result<Applied<Category>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("Please enter a category name"));
        }
        if self.state.has_category(name) {
            return Err(Error::validation(format!("Category '{name}' already exists")));
        }

        let mut warnings = Vec::new();
        if self.gateway.is_enabled() {
            if let Err(e) = self.gateway.create_category(name).await {
                warn!("Unable to add the category remotely: {e}");
                warnings.push(Warning::saved_locally("adding category", &e));
            }
        }

        let category = Category::new(name);
        self.state.categories.push(category.clone());
        self.persist(&mut warnings).await;
        Ok(Applied::new(category, warnings))
    }

    /// Removes category `name`, unless a budget still uses it. The check runs against in-memory
    /// state before anything is sent or written.
    pub async fn delete_category(&mut self, name: &str) -> Result<Applied<Category>> {
        let name = name.trim();
        let Some(position) = self.state.categories().iter().position(|c| c.name() == name) else {
            return Err(Error::validation(format!("Category '{name}' not found")));
        };
        let usage = self.state.category_usage(name);
        if usage > 0 {
            return Err(Error::validation(format!(
                "Cannot delete category '{name}' because it is used by {usage} budget(s)"
            )));
        }

        if self.gateway.is_enabled() {
            if let Err(e) = self.gateway.delete_category(name).await {
                debug!("Ignoring remote failure deleting category {name}: {e}");
            }
        }

        let removed = self.state.categories.remove(position);
        let mut warnings = Vec::new();
        self.persist(&mut warnings).await;
        Ok(Applied::new(removed, warnings))
    }

    /// Applies `patch` over the current settings.
    pub async fn save_settings(&mut self, mut patch: SettingsPatch) -> Result<Applied<Settings>> {
        patch.user_name = patch.user_name.map(|n| n.trim().to_string());
        let next = self.state.settings().merged(patch);
        next.validate()?;

        let mut warnings = Vec::new();
        if self.gateway.is_enabled() {
            if let Err(e) = self.gateway.save_settings(&next).await {
                warn!("Unable to save settings remotely: {e}");
                warnings.push(Warning::saved_locally("saving settings", &e));
            }
        }

        self.state.settings = next.clone();
        self.persist(&mut warnings).await;
        Ok(Applied::new(next, warnings))
    }

    /// Moves to the next theme in the glass, light, dark cycle.
    pub async fn cycle_theme(&mut self) -> Result<Applied<Settings>> {
        let patch = SettingsPatch {
            theme: Some(self.state.settings().theme().next()),
            ..Default::default()
        };
        self.save_settings(patch).await
    }

    /// Switches between local-only and remote-backed mode and persists the choice. Switching into
    /// remote-backed mode runs one reconciliation, which is returned.
    pub async fn set_sync_enabled(&mut self, enabled: bool) -> Result<Option<Reconciliation>> {
        let was_enabled = self.gateway.is_enabled();
        self.gateway.set_enabled(enabled);
        self.gateway.config().save(self.config.sync_path()).await?;

        if enabled && !was_enabled {
            info!("Sync enabled");
            Ok(Some(self.reconcile().await))
        } else {
            if was_enabled && !enabled {
                info!("Sync disabled");
            }
            Ok(None)
        }
    }

    pub async fn set_api_base_url(&mut self, url: &str) -> Result<()> {
        let url = url.trim();
        url::Url::parse(url)
            .map_err(|e| Error::validation(format!("Invalid API base URL '{url}': {e}")))?;
        self.gateway.set_base_url(url);
        self.gateway.config().save(self.config.sync_path()).await
    }

    /// A snapshot of all local data in the export format.
    pub fn export(&self) -> Result<Vec<u8>> {
        self.store.export(&self.state)
    }

    /// Writes an export into `dir` under the dated export name and returns its path.
    pub async fn export_to(&self, dir: &Path, today: NaiveDate) -> Result<PathBuf> {
        let path = dir.join(export_file_name(today));
        utils::write(&path, self.export()?).await?;
        Ok(path)
    }

    /// Replaces local data with an exported document. The current data is backed up first.
    /// Returns the path of the backup.
    pub async fn import(&mut self, blob: &[u8]) -> Result<Applied<PathBuf>> {
        let next = self.store.import(&self.state, blob)?;
        let backup = self.config.backup().save_json(PRE_IMPORT, &self.state).await?;
        debug!("Backed up local data to {}", backup.display());

        self.state = next;
        let mut warnings = Vec::new();
        self.persist(&mut warnings).await;
        Ok(Applied::new(backup, warnings))
    }

    async fn persist(&self, warnings: &mut Vec<Warning>) {
        if let Err(e) = self.store.save(&self.state).await {
            warn!("Unable to save local data: {e}");
            warnings.push(Warning::NotPersisted {
                cause: e.to_string(),
            });
        }
    }
}

/// Copies the document at `path` into the backups before anything can overwrite it.
async fn keep_unreadable(config: &Config, path: &Path) {
    let copied = match utils::read_bytes(path).await {
        Ok(raw) => config.backup().save_bytes(RECOVERED, raw).await,
        Err(e) => Err(e.into()),
    };
    match copied {
        Ok(backup) => info!("Kept a copy of the unreadable local data at {}", backup.display()),
        Err(e) => warn!("Unable to back up the unreadable local data: {e}"),
    }
}

fn budget_not_found(id: &str) -> Error {
    Error::validation(format!("Budget '{id}' not found"))
}
