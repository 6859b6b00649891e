use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use pitwall_platform::AppPaths;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::version::VersionString;

/// Persisted "never prompt me for this version again" decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedVersionRecord {
    pub version: VersionString,
    pub skipped_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("could not determine skip record location: {0}")]
    PathUnavailable(#[from] pitwall_platform::AppPathsError),
    #[error("failed to read skip record {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write skip record {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("skip record {path} is corrupt: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode skip record: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Best-effort memory of the last skipped version.
///
/// Implementations never fail towards the caller: unreadable storage means
/// "not skipped" and a failed write is dropped.
pub trait SkipMemory: Send + Sync {
    fn was_skipped(&self, version: &VersionString) -> bool;
    fn record_skipped(&self, version: &VersionString);
}

/// [`SkipMemory`] backed by a small JSON file in the config directory.
pub struct FileSkipMemory {
    path: PathBuf,
}

impl FileSkipMemory {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Skip memory at the platform default location.
    ///
    /// # Errors
    /// Returns an error when the config directory cannot be determined.
    pub fn at_default_location() -> Result<Self, StorageError> {
        let paths = AppPaths::new()?;
        Ok(Self::new(paths.skipped_version_file()))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted record, `None` when nothing was ever skipped.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read or decoded.
    pub fn load(&self) -> Result<Option<SkippedVersionRecord>, StorageError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&data)
            .map(Some)
            .map_err(|source| StorageError::Decode {
                path: self.path.clone(),
                source,
            })
    }

    /// Replace the persisted record.
    ///
    /// # Errors
    /// Returns an error when the record cannot be encoded or written.
    pub fn store(&self, record: &SkippedVersionRecord) -> Result<(), StorageError> {
        let data = serde_json::to_vec_pretty(record).map_err(StorageError::Encode)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        write_atomic(&self.path, &data).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl SkipMemory for FileSkipMemory {
    fn was_skipped(&self, version: &VersionString) -> bool {
        match self.load() {
            Ok(Some(record)) => record.version == *version,
            Ok(None) => false,
            Err(error) => {
                warn!("Ignoring unreadable skip record: {error}");
                false
            }
        }
    }

    fn record_skipped(&self, version: &VersionString) {
        let record = SkippedVersionRecord {
            version: version.clone(),
            skipped_at: Utc::now(),
        };
        match self.store(&record) {
            Ok(()) => debug!("Recorded skipped version {version}"),
            Err(error) => warn!("Failed to persist skipped version {version}: {error}"),
        }
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "record path has no parent")
    })?;

    let file_name = path
        .file_name()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("record");
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    let pid = std::process::id();

    let mut tmp_path = None;
    for attempt in 0..16_u8 {
        let candidate = parent.join(format!(".{file_name}.{pid}.{timestamp}.{attempt}.tmp"));
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(mut file) => {
                file.write_all(data)?;
                file.sync_all()?;
                tmp_path = Some(candidate);
                break;
            }
            Err(error) if error.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(error) => return Err(error),
        }
    }

    let Some(tmp_path) = tmp_path else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "failed to create unique temp file",
        ));
    };

    if let Err(error) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(error);
    }

    Ok(())
}
