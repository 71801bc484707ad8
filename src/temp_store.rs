//! # Temporary Storage Module
//!
//! Scope temporaneo di una singola richiesta per l'output FILE_URI.
//!
//! ## Responsabilità:
//! - Crea una directory temporanea dedicata alla richiesta (`tempfile::TempDir`)
//! - Scrive i file esportati con nomi univoci (UUID)
//! - Rimuove file parziali se la scrittura fallisce
//! - Cancella l'intera directory al rilascio (esplicito o per drop)
//!
//! Nessun file temporaneo sopravvive alla sua richiesta: lo scope è posseduto
//! dalla `PendingRequest` e viene rilasciato dopo la consegna della risposta.

use crate::error::PickerError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct TempScope {
    dir: TempDir,
}

impl TempScope {
    /// Creates the scope under `root`, or under the system temp directory
    pub fn create(root: Option<&Path>) -> Result<Self, PickerError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("media-picker-");
        let dir = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| PickerError::FileAccess(format!("cannot create temp scope: {}", e)))?;

        debug!("📁 Created temp scope {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `bytes` to a fresh file with the given extension
    pub async fn write(&self, bytes: &[u8], extension: &str) -> Result<PathBuf, PickerError> {
        let path = self.reserve(extension);
        if let Err(e) = tokio::fs::write(&path, bytes).await {
            self.discard(&path).await;
            return Err(PickerError::FileAccess(format!("{}: {}", path.display(), e)));
        }
        Ok(path)
    }

    /// Unique path inside the scope; nothing is created on disk
    pub fn reserve(&self, extension: &str) -> PathBuf {
        self.dir.path().join(format!("{}.{}", Uuid::new_v4(), extension))
    }

    /// Best-effort removal of one file inside the scope
    pub async fn discard(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove temp file {}: {}", path.display(), e);
            }
        }
    }

    /// Deletes the scope directory and everything in it
    pub fn release(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!("🧹 Released temp scope {}", path.display()),
            Err(e) => warn!("Failed to release temp scope {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_release() {
        let root = TempDir::new().unwrap();
        let scope = TempScope::create(Some(root.path())).unwrap();
        let scope_path = scope.path().to_path_buf();

        let first = scope.write(b"one", "jpg").await.unwrap();
        let second = scope.write(b"two", "jpg").await.unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with(&scope_path));
        assert_eq!(std::fs::read(&first).unwrap(), b"one");

        scope.release();
        assert!(!scope_path.exists());
        assert!(!first.exists());
    }

    #[tokio::test]
    async fn test_drop_removes_scope() {
        let root = TempDir::new().unwrap();
        let scope_path = {
            let scope = TempScope::create(Some(root.path())).unwrap();
            scope.write(b"data", "mp4").await.unwrap();
            scope.path().to_path_buf()
        };
        assert!(!scope_path.exists());
    }

    #[tokio::test]
    async fn test_discard_missing_file_is_quiet() {
        let scope = TempScope::create(None).unwrap();
        let path = scope.reserve("jpg");
        scope.discard(&path).await;
        assert!(!path.exists());
    }
}
