// src/services/registry_state.rs
//! Shared, transactional access to the registry.
//!
//! Every mutation is serialized behind the write half of an async `RwLock`,
//! and reads share the read half, so a reader only ever sees fully committed
//! state. When a snapshot store is attached, a mutation is applied to a staged
//! copy, persisted, and only then published.

use crate::contracts::errors::RegistryError;
use crate::contracts::sbt_registry::SbtRegistry;
use crate::storage::snapshot_store::{SnapshotStore, StorageError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Failure of a service-level operation.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The registry refused the call; nothing changed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The call was valid but its result could not be persisted; nothing changed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Registry handle shared between services and request handlers.
#[derive(Clone)]
pub struct SharedRegistry {
    state: Arc<RwLock<SbtRegistry>>,
    store: Option<Arc<SnapshotStore>>,
}

impl SharedRegistry {
    /// Shares `registry` without persistence.
    pub fn in_memory(registry: SbtRegistry) -> Self {
        Self {
            state: Arc::new(RwLock::new(registry)),
            store: None,
        }
    }

    /// Shares `registry`, writing a snapshot to `store` after every mutation.
    pub fn persistent(registry: SbtRegistry, store: SnapshotStore) -> Self {
        Self {
            state: Arc::new(RwLock::new(registry)),
            store: Some(Arc::new(store)),
        }
    }

    /// Loads the registry from `store` and keeps persisting to it.
    pub async fn open(store: SnapshotStore) -> Result<Self, StorageError> {
        let registry = store.load().await?;
        Ok(Self::persistent(registry, store))
    }

    /// Runs a read-only query against committed state.
    pub async fn read<T, F>(&self, query: F) -> T
    where
        F: FnOnce(&SbtRegistry) -> T + Send,
    {
        let guard = self.state.read().await;
        query(&*guard)
    }

    /// Applies `op` as a single all-or-nothing transaction.
    ///
    /// # Errors
    /// - `ServiceError::Registry` if `op` rejects the call
    /// - `ServiceError::Storage` if the resulting snapshot cannot be written
    ///
    /// In both cases the shared registry is left exactly as it was.
    pub async fn commit<T, F>(&self, op: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut SbtRegistry) -> Result<T, RegistryError> + Send,
        T: Send,
    {
        let mut guard = self.state.write().await;

        let Some(store) = &self.store else {
            return Ok(op(&mut *guard)?);
        };

        let mut staged = guard.clone();
        let output = op(&mut staged)?;
        store.save(&staged).await?;
        *guard = staged;
        Ok(output)
    }
}
