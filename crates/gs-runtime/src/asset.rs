use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{join_all, BoxFuture};
use thiserror::Error;
use tracing::{debug, error};

/// Opaque loaded asset. The player only cares whether one is resident.
pub type AssetHandle = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("asset \"{name}\" was not found")]
    NotFound { name: String },
    #[error("asset \"{name}\" failed to load: {message}")]
    Load { name: String, message: String },
}

/// Backing storage the asset manager loads from and releases to.
pub trait AssetStore: Send + Sync {
    fn load<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<AssetHandle, AssetError>>;
    fn release(&self, name: &str, handle: AssetHandle);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub released: Vec<String>,
    pub loaded: Vec<String>,
    pub failed: Vec<String>,
}

/// Owns the registry of resident assets keyed by logical file name.
pub struct AssetManager {
    store: Arc<dyn AssetStore>,
    registry: Mutex<BTreeMap<String, AssetHandle>>,
}

impl AssetManager {
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self {
            store,
            registry: Mutex::new(BTreeMap::new()),
        }
    }

    fn registry(&self) -> MutexGuard<'_, BTreeMap<String, AssetHandle>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry().contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<AssetHandle> {
        self.registry().get(name).cloned()
    }

    pub fn resident_names(&self) -> BTreeSet<String> {
        self.registry().keys().cloned().collect()
    }

    /// Returns whether the asset was resident. Releasing an absent name is a
    /// no-op.
    pub fn release(&self, name: &str) -> bool {
        let removed = self.registry().remove(name);
        match removed {
            Some(handle) => {
                self.store.release(name, handle);
                true
            }
            None => false,
        }
    }

    pub fn release_all(&self) {
        let drained = std::mem::take(&mut *self.registry());
        for (name, handle) in drained {
            self.store.release(&name, handle);
        }
    }

    /// Makes the resident set equal to `required`: first releases what is no
    /// longer needed, then loads every missing asset concurrently and resolves
    /// only when all loads have finished. Failed loads stay absent.
    pub async fn reconcile(&self, required: &BTreeSet<String>) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let stale = self
            .registry()
            .keys()
            .filter(|name| !required.contains(*name))
            .cloned()
            .collect::<Vec<_>>();
        for name in stale {
            if self.release(&name) {
                report.released.push(name);
            }
        }

        let missing = required
            .iter()
            .filter(|name| !self.contains(name))
            .collect::<Vec<_>>();
        let results = join_all(missing.into_iter().map(|name| async move {
            let result = self.store.load(name).await;
            (name, result)
        }))
        .await;

        for (name, result) in results {
            match result {
                Ok(handle) => {
                    self.registry().insert(name.clone(), handle);
                    report.loaded.push(name.clone());
                }
                Err(error) => {
                    error!(asset = %name, %error, "asset load failed");
                    report.failed.push(name.clone());
                }
            }
        }

        debug!(
            released = report.released.len(),
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "asset reconciliation finished"
        );
        report
    }
}

impl fmt::Debug for AssetManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetManager")
            .field("resident", &self.resident_names())
            .finish()
    }
}
