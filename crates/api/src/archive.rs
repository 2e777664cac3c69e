//! Where accepted submissions end up.
//!
//! A session folder holds the renamed uploads plus the generated artifacts.
//! Folders are pruned after the configured retention period.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

use purchreq_core::{FormSlot, SubmissionId};
use purchreq_reports::{FinanceLogRow, Submitter, Workbook};

const RETENTION_CHECK_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ArchiveError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// An upload, already renamed for the session folder.
#[derive(Debug, Clone)]
pub struct ArchivedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Everything written for one accepted submission.
#[derive(Debug, Clone)]
pub struct SessionArchive {
    pub submission_id: SubmissionId,
    pub folder_name: String,
    pub files: Vec<ArchivedFile>,
    pub purchase_request: Workbook,
    pub expense_report: Workbook,
    pub log_row: FinanceLogRow,
}

pub trait ArchiveSink: Send + Sync {
    /// Where the folder for `folder_name` lives, as recorded in the finance log.
    fn folder_link(&self, folder_name: &str) -> String;

    fn store(&self, archive: &SessionArchive) -> Result<(), ArchiveError>;
}

/// `{snake_name}_{YYYY-mm-dd_HH-MM-SS}`.
pub fn session_folder_name(submitter: &Submitter, at: NaiveDateTime) -> String {
    format!(
        "{}_{}",
        sanitize(&submitter.snake_name()),
        at.format("%Y-%m-%d_%H-%M-%S")
    )
}

/// `{slot}_{vendor}.{ext}`.
pub fn invoice_file_name(slot: FormSlot, vendor: &str, extension: &str) -> String {
    format!("{slot}_{}.{extension}", sanitize(vendor))
}

/// `{slot}_proof_of_payment.{ext}`.
pub fn proof_of_payment_file_name(slot: FormSlot, extension: &str) -> String {
    format!("{slot}_proof_of_payment.{extension}")
}

// Vendor names are free text; keep them from escaping the folder.
fn sanitize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect::<String>()
        .replace("..", "_")
        .trim_start_matches('.')
        .to_string()
}

#[derive(Debug, Serialize)]
struct LogRowFile<'a> {
    submission_id: SubmissionId,
    row: &'a FinanceLogRow,
}

/// Session folders on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalArchive {
    root: PathBuf,
}

impl LocalArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write(path: &Path, bytes: &[u8]) -> Result<(), ArchiveError> {
        std::fs::write(path, bytes).map_err(|e| ArchiveError::io(path, e))
    }
}

impl ArchiveSink for LocalArchive {
    fn folder_link(&self, folder_name: &str) -> String {
        self.root.join(folder_name).display().to_string()
    }

    fn store(&self, archive: &SessionArchive) -> Result<(), ArchiveError> {
        let folder = self.root.join(&archive.folder_name);
        std::fs::create_dir_all(&folder).map_err(|e| ArchiveError::io(&folder, e))?;

        for file in &archive.files {
            Self::write(&folder.join(&file.name), &file.bytes)?;
        }

        let workbooks = [
            ("purchase_request.json", "purchase request", &archive.purchase_request),
            ("expense_report.json", "expense report", &archive.expense_report),
        ];
        for (name, what, workbook) in workbooks {
            let bytes = workbook
                .to_json()
                .map_err(|source| ArchiveError::Serialize { what, source })?;
            Self::write(&folder.join(name), &bytes)?;
        }

        let log_row = serde_json::to_vec_pretty(&LogRowFile {
            submission_id: archive.submission_id,
            row: &archive.log_row,
        })
        .map_err(|source| ArchiveError::Serialize {
            what: "finance log row",
            source,
        })?;
        Self::write(&folder.join("log_row.json"), &log_row)?;

        tracing::info!(
            submission_id = %archive.submission_id,
            folder = %folder.display(),
            files = archive.files.len(),
            "session folder archived"
        );
        Ok(())
    }
}

/// Delete session folders whose last modification is older than `max_age`.
///
/// Folders that fail to delete are logged and skipped. Returns how many were
/// removed.
pub fn prune_expired(root: &Path, max_age: Duration, now: SystemTime) -> Result<usize, ArchiveError> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(ArchiveError::io(root, e)),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|e| ArchiveError::io(root, e))?;
        let path = entry.path();
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if !meta.is_dir() {
            continue;
        }
        let age = meta
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age <= max_age {
            continue;
        }
        match std::fs::remove_dir_all(&path) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(folder = %path.display(), "failed to delete session folder: {e}"),
        }
    }

    if removed > 0 {
        tracing::info!(removed, "pruned expired session folders");
    }
    Ok(removed)
}

/// Background retention loop; checks hourly for the lifetime of the process.
pub fn spawn_retention(root: PathBuf, max_age: Duration) -> tokio::task::JoinHandle<()> {
    let root = Arc::new(root);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(RETENTION_CHECK_INTERVAL);
        loop {
            ticker.tick().await;
            let root = root.clone();
            let result =
                tokio::task::spawn_blocking(move || prune_expired(&root, max_age, SystemTime::now()))
                    .await;
            match result {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::warn!("session cleanup failed: {e}"),
                Err(e) => tracing::warn!("session cleanup task panicked: {e}"),
            }
        }
    })
}
