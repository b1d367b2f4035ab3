//! Rotating JSON snapshots of local state.

use crate::model::AppState;
use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::Local;
use std::path::PathBuf;

/// Prefix for the snapshot taken before an import replaces local data.
pub const PRE_IMPORT: &str = "pre-import";

/// Prefix for the copy of a local document that could only be partly read.
pub const RECOVERED: &str = "recovered";

const EXTENSION: &str = "json";

/// Manages backup file creation and rotation.
///
/// Create a new instance via `Config::backup()` or `Backup::new()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
}

impl Backup {
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
        }
    }

    /// Saves `state` as a pretty-printed JSON backup file named `{prefix}.YYYY-MM-DD-NNN.json`,
    /// where NNN counts up within the day. Old backups beyond `backup_copies` are removed.
    ///
    /// Returns the path to the created backup file.
    pub async fn save_json(&self, prefix: &str, state: &AppState) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(state).context("Failed to serialize backup")?;
        self.save_bytes(prefix, json).await
    }

    /// Saves `contents` unchanged under the same naming and rotation rules as `save_json`.
    pub async fn save_bytes(&self, prefix: &str, contents: impl AsRef<[u8]>) -> Result<PathBuf> {
        let date = today();
        let seq = self.next_sequence_number(prefix, &date).await?;
        let path = self
            .backups_dir
            .join(format!("{prefix}.{date}-{seq:03}.{EXTENSION}"));

        utils::write(&path, contents).await?;

        self.rotate(prefix).await?;

        Ok(path)
    }

    async fn file_names(&self) -> Result<Vec<(PathBuf, String)>> {
        let mut names = Vec::new();
        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            names.push((entry.path(), name));
        }
        Ok(names)
    }

    async fn next_sequence_number(&self, prefix: &str, date: &str) -> Result<u32> {
        let max_seq = self
            .file_names()
            .await?
            .iter()
            .filter_map(|(_, name)| parse_sequence_number(name, prefix, date))
            .max()
            .unwrap_or(0);
        Ok(max_seq + 1)
    }

    /// Keeps only the newest `backup_copies` files with the given prefix.
    async fn rotate(&self, prefix: &str) -> Result<()> {
        let mut files: Vec<(PathBuf, String)> = self
            .file_names()
            .await?
            .into_iter()
            .filter(|(_, name)| is_backup_file(name, prefix))
            .collect();

        // The name format sorts by date, then sequence number.
        files.sort_by(|a, b| a.1.cmp(&b.1));

        let to_delete = files.len().saturating_sub(self.backup_copies as usize);
        for (path, _) in files.into_iter().take(to_delete) {
            utils::remove(&path).await?;
        }

        Ok(())
    }
}

fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Parses NNN out of `{prefix}.{date}-{NNN}.json`.
fn parse_sequence_number(filename: &str, prefix: &str, date: &str) -> Option<u32> {
    filename
        .strip_prefix(&format!("{prefix}.{date}-"))?
        .strip_suffix(&format!(".{EXTENSION}"))?
        .parse()
        .ok()
}

fn is_backup_file(filename: &str, prefix: &str) -> bool {
    filename.starts_with(&format!("{prefix}.")) && filename.ends_with(&format!(".{EXTENSION}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_sequence_number() {
        assert_eq!(
            parse_sequence_number("pre-import.2025-12-14-001.json", PRE_IMPORT, "2025-12-14"),
            Some(1)
        );
        assert_eq!(
            parse_sequence_number("pre-import.2025-12-14-042.json", PRE_IMPORT, "2025-12-14"),
            Some(42)
        );
        // Wrong date
        assert_eq!(
            parse_sequence_number("pre-import.2025-12-13-001.json", PRE_IMPORT, "2025-12-14"),
            None
        );
        // Not json
        assert_eq!(
            parse_sequence_number("pre-import.2025-12-14-001.txt", PRE_IMPORT, "2025-12-14"),
            None
        );
    }

    #[test]
    fn test_is_backup_file() {
        assert!(is_backup_file("pre-import.2025-12-14-001.json", PRE_IMPORT));
        assert!(!is_backup_file("budgets.json", PRE_IMPORT));
        assert!(!is_backup_file("pre-import.2025-12-14-001.json.tmp", PRE_IMPORT));
    }

    #[tokio::test]
    async fn test_save_json_sequences_and_rotates() {
        let dir = TempDir::new().unwrap();
        let config = Config::open(dir.path()).await.unwrap();
        let backup = config.backup();
        let state = AppState::seeded();

        let mut paths = Vec::new();
        for _ in 0..7 {
            paths.push(backup.save_json(PRE_IMPORT, &state).await.unwrap());
        }

        let first = paths[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(first.starts_with("pre-import."));
        assert!(first.ends_with("-001.json"));

        let remaining: Vec<String> = backup
            .file_names()
            .await
            .unwrap()
            .into_iter()
            .map(|(_, name)| name)
            .filter(|name| is_backup_file(name, PRE_IMPORT))
            .collect();
        assert_eq!(remaining.len(), 5);
        assert!(!paths[0].exists());
        assert!(!paths[1].exists());
        assert!(paths[6].exists());

        let restored: AppState = utils::deserialize(&paths[6]).await.unwrap();
        assert_eq!(restored, state);
    }

    #[tokio::test]
    async fn test_save_bytes_keeps_contents() {
        let dir = TempDir::new().unwrap();
        let config = Config::open(dir.path()).await.unwrap();
        let raw = r#"{"budgets": [{"id": "x", "currency": "NGN"}]}"#;

        let path = config.backup().save_bytes(RECOVERED, raw).await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("recovered."), "{name}");
        assert_eq!(utils::read(&path).await.unwrap(), raw);
    }
}
