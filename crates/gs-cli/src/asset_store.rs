use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;
use gs_runtime::{AssetError, AssetHandle, AssetStore};
use tracing::debug;

/// Loads assets as raw bytes from files under a root directory.
#[derive(Debug, Clone)]
pub(crate) struct DirectoryAssetStore {
    root: PathBuf,
}

impl DirectoryAssetStore {
    pub(crate) fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl AssetStore for DirectoryAssetStore {
    fn load<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<AssetHandle, AssetError>> {
        Box::pin(async move {
            let path = self.root.join(name);
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    debug!(asset = name, size = bytes.len(), "asset file read");
                    Ok(Arc::new(bytes) as AssetHandle)
                }
                Err(error) if error.kind() == ErrorKind::NotFound => Err(AssetError::NotFound {
                    name: name.to_string(),
                }),
                Err(error) => Err(AssetError::Load {
                    name: name.to_string(),
                    message: error.to_string(),
                }),
            }
        })
    }

    fn release(&self, name: &str, _handle: AssetHandle) {
        debug!(asset = name, "asset released");
    }
}

/// Resolves every name to its own string, for runs without an assets
/// directory.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct VirtualAssetStore;

impl AssetStore for VirtualAssetStore {
    fn load<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<AssetHandle, AssetError>> {
        Box::pin(async move { Ok(Arc::new(name.to_string()) as AssetHandle) })
    }

    fn release(&self, _name: &str, _handle: AssetHandle) {}
}
