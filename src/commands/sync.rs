use crate::api::{self, Mode};
use crate::app::{App, Reconciliation, SyncMode};
use crate::commands::Out;
use crate::{Config, Error, Result};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub mode: SyncMode,
    pub api_base_url: String,
    pub data_path: PathBuf,
}

/// The sync commands never reconcile on startup; `pull` and `enable` do it explicitly.
async fn load(config: Config, mode: Mode) -> Result<App> {
    Ok(App::load(config, api::transport(mode)?).await)
}

fn status(app: &App) -> SyncStatus {
    SyncStatus {
        mode: app.sync_mode(),
        api_base_url: app.gateway().base_url().to_string(),
        data_path: app.config().data_path().to_path_buf(),
    }
}

fn describe(r: &Reconciliation) -> String {
    let mut pulled = Vec::new();
    if r.settings {
        pulled.push("settings");
    }
    if r.categories {
        pulled.push("categories");
    }
    if r.budgets {
        pulled.push("budgets");
    }
    if pulled.is_empty() {
        "Nothing could be pulled from the remote service, local data is unchanged".to_string()
    } else {
        format!("Pulled {} from the remote service", pulled.join(", "))
    }
}

pub async fn sync_status(config: Config, mode: Mode) -> Result<Out<SyncStatus>> {
    let app = load(config, mode).await?;
    let status = status(&app);
    let message = match status.mode {
        SyncMode::LocalOnly => "Sync is disabled, data is stored locally only".to_string(),
        SyncMode::RemoteBacked => format!("Sync is enabled using {}", status.api_base_url),
    };
    Ok(Out::new(message, status))
}

pub async fn sync_enable(config: Config, mode: Mode) -> Result<Out<SyncStatus>> {
    let mut app = load(config, mode).await?;
    let message = match app.set_sync_enabled(true).await? {
        Some(reconciliation) => format!("Sync enabled. {}", describe(&reconciliation)),
        None => "Sync is already enabled".to_string(),
    };
    Ok(Out::new(message, status(&app)))
}

pub async fn sync_disable(config: Config, mode: Mode) -> Result<Out<SyncStatus>> {
    let mut app = load(config, mode).await?;
    let was_enabled = app.gateway().is_enabled();
    app.set_sync_enabled(false).await?;
    let message = if was_enabled {
        "Sync disabled, local data is kept"
    } else {
        "Sync is already disabled"
    };
    Ok(Out::new(message, status(&app)))
}

pub async fn sync_pull(config: Config, mode: Mode) -> Result<Out<Reconciliation>> {
    let mut app = load(config, mode).await?;
    if !app.gateway().is_enabled() {
        return Err(Error::validation(
            "Sync is disabled. Run `budget sync enable` first",
        ));
    }
    let reconciliation = app.reconcile().await;
    Ok(Out::new(describe(&reconciliation), reconciliation))
}

pub async fn sync_url(config: Config, mode: Mode, url: &str) -> Result<Out<SyncStatus>> {
    let mut app = load(config, mode).await?;
    app.set_api_base_url(url).await?;
    let status = status(&app);
    Ok(Out::new(
        format!("The API base URL is now {}", status.api_base_url),
        status,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_sync_status_default() {
        let env = TestEnv::new().await;
        let out = sync_status(env.config(), Mode::Testing).await.unwrap();
        let status = out.structure().unwrap();
        assert_eq!(status.mode, SyncMode::LocalOnly);
        assert_eq!(status.api_base_url, "http://localhost:4000");
        assert_eq!(out.message(), "Sync is disabled, data is stored locally only");
    }

    #[tokio::test]
    async fn test_sync_enable_pulls_and_persists() {
        let env = TestEnv::new().await;
        let out = sync_enable(env.config(), Mode::Testing).await.unwrap();
        assert_eq!(
            out.message(),
            "Sync enabled. Pulled settings, categories, budgets from the remote service"
        );
        assert_eq!(out.structure().unwrap().mode, SyncMode::RemoteBacked);

        let saved = SyncConfig::load_or_default(env.config().sync_path()).await;
        assert!(saved.use_api());

        let out = sync_enable(env.config(), Mode::Testing).await.unwrap();
        assert_eq!(out.message(), "Sync is already enabled");
    }

    #[tokio::test]
    async fn test_sync_disable() {
        let env = TestEnv::with_sync(true).await;
        let out = sync_disable(env.config(), Mode::Testing).await.unwrap();
        assert_eq!(out.message(), "Sync disabled, local data is kept");
        let saved = SyncConfig::load_or_default(env.config().sync_path()).await;
        assert!(!saved.use_api());
    }

    #[tokio::test]
    async fn test_sync_pull_requires_sync() {
        let env = TestEnv::new().await;
        let err = sync_pull(env.config(), Mode::Testing).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_sync_pull() {
        let env = TestEnv::with_sync(true).await;
        let out = sync_pull(env.config(), Mode::Testing).await.unwrap();
        assert_eq!(
            out.structure().unwrap(),
            &Reconciliation {
                settings: true,
                categories: true,
                budgets: true
            }
        );
    }

    #[tokio::test]
    async fn test_sync_url() {
        let env = TestEnv::new().await;
        let out = sync_url(env.config(), Mode::Testing, " https://budgets.example.org ")
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().api_base_url, "https://budgets.example.org");
        let saved = SyncConfig::load_or_default(env.config().sync_path()).await;
        assert_eq!(saved.api_base_url(), "https://budgets.example.org");

        let err = sync_url(env.config(), Mode::Testing, "not a url")
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
