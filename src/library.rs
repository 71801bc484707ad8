//! # Media Library Module
//!
//! Accesso in lettura agli elementi selezionati nella libreria media.
//!
//! ## Responsabilità:
//! - `MediaLibrary`: trait async consumato dalla pipeline di export
//! - `FsMediaLibrary`: implementazione su filesystem locale (id = path)
//!
//! La pipeline non conosce il backing store: legge i byte sorgente, la
//! dimensione, e per i video in pass-through può chiedere una copia diretta
//! e un poster frame.

use crate::error::PickerError;
use crate::file_manager::FileManager;
use crate::picker::AssetHandle;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read access to the items behind asset handles
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// Full original bytes of the asset
    async fn read(&self, asset: &AssetHandle) -> Result<Vec<u8>, PickerError>;

    /// Byte size of the original asset
    async fn byte_size(&self, asset: &AssetHandle) -> Result<u64, PickerError>;

    /// Copies the original asset to `destination`, returning the bytes written
    async fn copy_to(&self, asset: &AssetHandle, destination: &Path) -> Result<u64, PickerError> {
        let bytes = self.read(asset).await?;
        tokio::fs::write(destination, &bytes).await?;
        Ok(bytes.len() as u64)
    }

    /// Poster frame JPEG di un video, se la piattaforma sa generarlo.
    /// `None` fa usare alla pipeline il placeholder.
    async fn thumbnail(&self, _asset: &AssetHandle) -> Result<Option<Vec<u8>>, PickerError> {
        Ok(None)
    }
}

/// Libreria su filesystem: l'id dell'handle è il path del file
#[derive(Debug, Clone, Default)]
pub struct FsMediaLibrary;

impl FsMediaLibrary {
    pub fn new() -> Self {
        Self
    }

    /// Handle for a local file, `None` when the extension is not a known media type
    pub fn handle_for(path: &Path) -> Option<AssetHandle> {
        let kind = FileManager::media_kind(path)?;
        Some(AssetHandle::new(path.to_string_lossy(), kind))
    }

    fn path_of(asset: &AssetHandle) -> PathBuf {
        PathBuf::from(&asset.id)
    }

    fn access_error(asset: &AssetHandle, err: std::io::Error) -> PickerError {
        PickerError::FileAccess(format!("{}: {}", asset.id, err))
    }
}

#[async_trait]
impl MediaLibrary for FsMediaLibrary {
    async fn read(&self, asset: &AssetHandle) -> Result<Vec<u8>, PickerError> {
        let bytes = tokio::fs::read(Self::path_of(asset))
            .await
            .map_err(|e| Self::access_error(asset, e))?;
        debug!("Read {} from {}", FileManager::format_size(bytes.len() as u64), asset.id);
        Ok(bytes)
    }

    async fn byte_size(&self, asset: &AssetHandle) -> Result<u64, PickerError> {
        FileManager::get_file_size(&Self::path_of(asset))
            .await
            .map_err(|e| PickerError::FileAccess(format!("{}: {}", asset.id, e)))
    }

    async fn copy_to(&self, asset: &AssetHandle, destination: &Path) -> Result<u64, PickerError> {
        tokio::fs::copy(Self::path_of(asset), destination)
            .await
            .map_err(|e| Self::access_error(asset, e))
    }
}
