//! JSON backup and restore of the whole record store.
//!
//! # Responsibility
//! - Serialize a snapshot as pretty-printed JSON to a caller-chosen file.
//! - Load a snapshot file and replace store contents with it.
//! - Treat a missing target path (dialog cancelled) as a non-error outcome.
//!
//! # Invariants
//! - A failed restore leaves the store unchanged.
//! - Backup files are written with two-space indentation.

use crate::model::snapshot::Snapshot;
use crate::repo::RepoError;
use crate::service::record_store::RecordStore;
use chrono::{Local, NaiveDate};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const BACKUP_FILE_PREFIX: &str = "backup-kwitariusz";

/// Result of a backup or restore request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    Saved { path: PathBuf, records: usize },
    Restored { path: PathBuf, records: usize },
    /// The user dismissed the file dialog.
    Cancelled,
}

impl BackupOutcome {
    pub fn message(&self) -> String {
        match self {
            Self::Saved { records, .. } => format!("Backup saved ({records} records)"),
            Self::Restored { records, .. } => format!("Backup restored ({records} records)"),
            Self::Cancelled => "Cancelled".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum BackupError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    Repo(RepoError),
}

impl BackupError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::Json { .. } => "invalid_backup",
            Self::Repo(err) => err.code(),
        }
    }
}

impl Display for BackupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "backup file `{}`: {source}", path.display()),
            Self::Json { path, source } => {
                write!(f, "backup file `{}` is not valid: {source}", path.display())
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BackupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for BackupError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Suggested file name for a backup taken on `date`.
pub fn default_backup_file_name(date: NaiveDate) -> String {
    format!("{BACKUP_FILE_PREFIX}-{}.json", date.format("%Y-%m-%d"))
}

/// Suggested file name for a backup taken today (local time).
pub fn todays_backup_file_name() -> String {
    default_backup_file_name(Local::now().date_naive())
}

/// Writes `snapshot` to `target`. `None` means the save dialog was cancelled.
pub fn write_backup(
    snapshot: &Snapshot,
    target: Option<&Path>,
) -> Result<BackupOutcome, BackupError> {
    let Some(path) = target else {
        return Ok(BackupOutcome::Cancelled);
    };

    let json = serde_json::to_string_pretty(snapshot).map_err(|source| BackupError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_replacing(path, json.as_bytes()).map_err(|source| BackupError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(BackupOutcome::Saved {
        path: path.to_path_buf(),
        records: snapshot.record_count(),
    })
}

/// Writes through a sibling `.tmp` file so an existing backup is only
/// replaced once the new contents are fully on disk.
fn write_replacing(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let temp_path = sibling_temp_path(path);
    let written = std::fs::write(&temp_path, contents)
        .and_then(|()| std::fs::rename(&temp_path, path));
    if written.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    written
}

fn sibling_temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Reads and parses a snapshot file.
pub fn read_backup(path: &Path) -> Result<Snapshot, BackupError> {
    let text = std::fs::read_to_string(path).map_err(|source| BackupError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Snapshot::from_json(&text).map_err(|source| BackupError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Backup/restore use-cases bound to one store.
pub struct BackupService<'store> {
    store: &'store RecordStore,
}

impl<'store> BackupService<'store> {
    pub fn new(store: &'store RecordStore) -> Self {
        Self { store }
    }

    /// Snapshots the store and writes it to `target`.
    pub fn backup(&self, target: Option<&Path>) -> Result<BackupOutcome, BackupError> {
        if target.is_none() {
            info!("event=backup module=service status=cancelled");
            return Ok(BackupOutcome::Cancelled);
        }
        let snapshot = self.store.snapshot()?;
        let outcome = write_backup(&snapshot, target);
        log_outcome("backup", &outcome);
        outcome
    }

    /// Writes a caller-supplied snapshot (the UI's in-memory copy) to `target`.
    pub fn backup_payload(
        &self,
        snapshot: &Snapshot,
        target: Option<&Path>,
    ) -> Result<BackupOutcome, BackupError> {
        let outcome = write_backup(snapshot, target);
        log_outcome("backup", &outcome);
        outcome
    }

    /// Loads `source` and replaces store contents with it.
    pub fn restore(&self, source: Option<&Path>) -> Result<BackupOutcome, BackupError> {
        let Some(path) = source else {
            info!("event=restore module=service status=cancelled");
            return Ok(BackupOutcome::Cancelled);
        };

        let outcome = read_backup(path).and_then(|snapshot| {
            let records = self.store.restore(&snapshot)?;
            Ok(BackupOutcome::Restored {
                path: path.to_path_buf(),
                records,
            })
        });
        log_outcome("restore", &outcome);
        outcome
    }
}

fn log_outcome(event: &str, outcome: &Result<BackupOutcome, BackupError>) {
    match outcome {
        Ok(BackupOutcome::Saved { records, .. }) | Ok(BackupOutcome::Restored { records, .. }) => {
            info!("event={event} module=service status=ok records={records}")
        }
        Ok(BackupOutcome::Cancelled) => info!("event={event} module=service status=cancelled"),
        Err(err) => warn!(
            "event={event} module=service status=error error_code={}",
            err.code()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        default_backup_file_name, sibling_temp_path, todays_backup_file_name, write_backup,
        BackupError, BackupOutcome,
    };
    use crate::model::snapshot::Snapshot;
    use chrono::{Local, NaiveDate};

    #[test]
    fn default_file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        assert_eq!(
            default_backup_file_name(date),
            "backup-kwitariusz-2024-09-01.json"
        );
    }

    #[test]
    fn todays_file_name_uses_local_date() {
        assert_eq!(
            todays_backup_file_name(),
            default_backup_file_name(Local::now().date_naive())
        );
    }

    #[test]
    fn missing_target_is_cancelled_not_error() {
        let outcome = write_backup(&Snapshot::default(), None).unwrap();
        assert_eq!(outcome, BackupOutcome::Cancelled);
        assert_eq!(outcome.message(), "Cancelled");
    }

    #[test]
    fn writes_two_space_indented_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        write_backup(&Snapshot::default(), Some(&path)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n  \"formatVersion\": 1"));
    }

    #[test]
    fn rewrite_replaces_previous_backup_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        std::fs::write(&path, "previous").unwrap();

        write_backup(&Snapshot::default(), Some(&path)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"formatVersion\": 1"));
        assert!(!sibling_temp_path(&path).exists());
    }

    #[test]
    fn failed_replace_cleans_up_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("occupied");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep.txt"), "kept").unwrap();

        let err = write_backup(&Snapshot::default(), Some(&path)).unwrap_err();

        assert!(matches!(err, BackupError::Io { .. }));
        assert!(!sibling_temp_path(&path).exists());
        assert_eq!(std::fs::read_to_string(path.join("keep.txt")).unwrap(), "kept");
    }
}
