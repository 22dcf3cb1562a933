// src/storage/snapshot_store.rs
//! File-backed snapshot storage for the registry.
//!
//! Persists the whole registry as a single JSON document so that a restarted
//! service resumes with the same companies, pending queues and issued
//! credentials.
//!
//! # Features
//! - Asynchronous file operations using the Tokio runtime
//! - Atomic replacement: a snapshot is written to a sibling temporary file
//!   and renamed over the previous one
//! - Integrity check on load (issued counts must match issued stores)

use crate::contracts::sbt_registry::SbtRegistry;
use crate::utils::serialization::{deserialize, serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("snapshot i/o failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("snapshot encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The file decoded but its bookkeeping does not add up.
    #[error("snapshot at {0} is inconsistent")]
    Inconsistent(PathBuf),
}

/// JSON snapshot file holding one registry.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Creates a store for the snapshot at `path`. Nothing is touched on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the registry from disk.
    ///
    /// # Returns
    /// - The stored registry if the snapshot exists
    /// - An empty registry if no snapshot has been written yet
    ///
    /// # Errors
    /// Returns `StorageError` if the file cannot be read, is not valid JSON
    /// for a registry, or fails the integrity check.
    pub async fn load(&self) -> Result<SbtRegistry, StorageError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No snapshot at {}, starting empty", self.path.display());
                return Ok(SbtRegistry::new());
            }
            Err(source) => return Err(self.io_error(source)),
        };

        let registry: SbtRegistry = deserialize(&contents)?;
        if !registry.is_consistent() {
            return Err(StorageError::Inconsistent(self.path.clone()));
        }

        log::info!(
            "Loaded snapshot from {} ({} companies)",
            self.path.display(),
            registry.issuer_count()
        );
        Ok(registry)
    }

    /// Writes `registry` to disk, replacing any previous snapshot.
    ///
    /// # Errors
    /// Returns `StorageError` if encoding fails or any file operation fails.
    /// On failure the previous snapshot (if any) is left in place.
    pub async fn save(&self, registry: &SbtRegistry) -> Result<(), StorageError> {
        let json = serialize(registry)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(source))?;
        }

        let staging = self.staging_path();
        tokio::fs::write(&staging, json)
            .await
            .map_err(|source| self.io_error(source))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|source| self.io_error(source))?;

        log::debug!("Snapshot written to {}", self.path.display());
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
