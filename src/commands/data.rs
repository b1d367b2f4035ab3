use crate::api::Mode;
use crate::app::{App, Applied};
use crate::args::{ExportArgs, ImportArgs};
use crate::commands::Out;
use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::Local;
use std::path::PathBuf;

/// Writes all local data to `budgettrackr_export_YYYY-MM-DD.json` in the requested directory, or
/// the current directory.
pub async fn export(config: Config, mode: Mode, args: &ExportArgs) -> Result<Out<PathBuf>> {
    let app = App::open(config, mode).await?;
    let dir = match args.out() {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().context("Unable to determine the current directory")?,
    };
    let path = app.export_to(&dir, Local::now().date_naive()).await?;
    Ok(Out::new(
        format!("Exported {} budgets to {}", app.state().budgets().len(), path.display()),
        path,
    ))
}

/// Replaces local data with the contents of an exported file. The previous data is backed up.
pub async fn import(config: Config, mode: Mode, args: &ImportArgs) -> Result<Out<PathBuf>> {
    let blob = utils::read_bytes(args.file()).await?;
    let mut app = App::open(config, mode).await?;
    let Applied { value, warnings } = app.import(&blob).await?;
    Ok(Out::new(
        format!(
            "Imported {} budgets from {}. Previous data was backed up to {}",
            app.state().budgets().len(),
            args.file().display(),
            value.display()
        ),
        value,
    )
    .with_warnings(&warnings))
}
