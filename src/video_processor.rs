//! # Video Processing Module
//!
//! Questo modulo gestisce l'export dei video selezionati.
//!
//! ## Responsabilità:
//! - Validazione della dimensione del file originale contro `maxVideoSize`
//! - Copia pass-through nello scope temporaneo (FILE_URI)
//! - Codifica base64 del file originale (BASE64)
//! - Thumbnail per ogni video esportato: poster della libreria o placeholder
//!
//! ## Nessuna ricodifica
//! I video non vengono transcodificati: il file originale attraversa la
//! bridge così com'è. Il controllo di dimensione avviene prima della copia,
//! e viene ripetuto sui byte effettivamente copiati.
//!
//! Il thumbnail segue l'output type del video. Se non può essere prodotto
//! il video resta esportato, senza thumbnail.
//!
//! ## Esempio:
//! ```rust,ignore
//! let processor = VideoProcessor::new(library.clone());
//! let outcome = processor.export(&asset, &constraints, Some(&scope)).await?;
//! ```

use crate::constraints::{ConstraintConfig, OutputType};
use crate::error::PickerError;
use crate::export::result::{ExportOutcome, Payload};
use crate::file_manager::FileManager;
use crate::image_processor::{ImageProcessor, PHOTO_EXTENSION};
use crate::library::MediaLibrary;
use crate::picker::{AssetHandle, MediaKind};
use crate::temp_store::TempScope;
use base64::Engine;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

const DEFAULT_VIDEO_EXTENSION: &str = "mp4";

/// Handles pass-through video export
pub struct VideoProcessor {
    library: Arc<dyn MediaLibrary>,
}

impl VideoProcessor {
    pub fn new(library: Arc<dyn MediaLibrary>) -> Self {
        Self { library }
    }

    /// Estensione del file copiato, presa dall'id quando sembra un path
    fn extension_for(asset: &AssetHandle) -> String {
        let path = Path::new(&asset.id);
        match (FileManager::media_kind(path), path.extension()) {
            (Some(MediaKind::Video), Some(ext)) => ext.to_string_lossy().to_lowercase(),
            _ => DEFAULT_VIDEO_EXTENSION.to_string(),
        }
    }

    fn too_large(byte_size: u64, limit: Option<u64>) -> Option<ExportOutcome> {
        match limit {
            Some(limit) if byte_size > limit => Some(ExportOutcome::TooLarge { byte_size, limit }),
            _ => None,
        }
    }

    /// Poster della libreria, altrimenti il placeholder
    async fn thumbnail_bytes(&self, asset: &AssetHandle) -> Result<Vec<u8>, PickerError> {
        match self.library.thumbnail(asset).await {
            Ok(Some(bytes)) => return Ok(bytes),
            Ok(None) => {}
            Err(e) => warn!("No poster frame for {}: {}", asset.id, e),
        }
        tokio::task::spawn_blocking(ImageProcessor::placeholder_thumbnail)
            .await
            .map_err(|e| PickerError::EncodeFailed(format!("thumbnail task failed: {}", e)))?
    }

    async fn encode_thumbnail(
        &self,
        asset: &AssetHandle,
        output_type: OutputType,
        scope: Option<&TempScope>,
    ) -> Result<Payload, PickerError> {
        let bytes = self.thumbnail_bytes(asset).await?;
        match output_type {
            OutputType::FileUri => {
                let scope = scope.ok_or_else(|| {
                    PickerError::FileAccess("no temp scope for file output".to_string())
                })?;
                Ok(Payload::FileUri(scope.write(&bytes, PHOTO_EXTENSION).await?))
            }
            OutputType::Base64 => Ok(Payload::Base64(
                base64::engine::general_purpose::STANDARD.encode(&bytes),
            )),
        }
    }

    /// Un thumbnail mancante non fa fallire il video
    async fn thumbnail(
        &self,
        asset: &AssetHandle,
        output_type: OutputType,
        scope: Option<&TempScope>,
    ) -> Option<Payload> {
        match self.encode_thumbnail(asset, output_type, scope).await {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!("Thumbnail skipped for {}: {}", asset.id, e);
                None
            }
        }
    }

    pub async fn export(
        &self,
        asset: &AssetHandle,
        constraints: &ConstraintConfig,
        scope: Option<&TempScope>,
    ) -> Result<ExportOutcome, PickerError> {
        let limit = constraints.size_limit_for(MediaKind::Video);

        let original_size = self.library.byte_size(asset).await?;
        if let Some(outcome) = Self::too_large(original_size, limit) {
            return Ok(outcome);
        }

        match constraints.output_type {
            OutputType::FileUri => {
                let scope = scope.ok_or_else(|| {
                    PickerError::FileAccess("no temp scope for file output".to_string())
                })?;
                let path = scope.reserve(&Self::extension_for(asset));

                let written = match self.library.copy_to(asset, &path).await {
                    Ok(written) => written,
                    Err(e) => {
                        scope.discard(&path).await;
                        return Err(e);
                    }
                };

                if let Some(outcome) = Self::too_large(written, limit) {
                    scope.discard(&path).await;
                    return Ok(outcome);
                }

                debug!("🎬 Video copied to {} ({})", path.display(), FileManager::format_size(written));
                let thumbnail = self.thumbnail(asset, OutputType::FileUri, Some(scope)).await;
                Ok(ExportOutcome::Ok {
                    payload: Payload::FileUri(path),
                    byte_size: written,
                    dimensions: None,
                    thumbnail,
                })
            }
            OutputType::Base64 => {
                let bytes = self.library.read(asset).await?;
                let byte_size = bytes.len() as u64;
                if let Some(outcome) = Self::too_large(byte_size, limit) {
                    return Ok(outcome);
                }

                let thumbnail = self.thumbnail(asset, OutputType::Base64, None).await;
                Ok(ExportOutcome::Ok {
                    payload: Payload::Base64(base64::engine::general_purpose::STANDARD.encode(&bytes)),
                    byte_size,
                    dimensions: None,
                    thumbnail,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::FsMediaLibrary;
    use async_trait::async_trait;
    use tempfile::TempDir;

    fn video_fixture(dir: &TempDir, name: &str, size: usize) -> AssetHandle {
        let path = dir.path().join(name);
        std::fs::write(&path, vec![0x42u8; size]).unwrap();
        FsMediaLibrary::handle_for(&path).unwrap()
    }

    fn scope_entries(scope: &TempScope) -> usize {
        std::fs::read_dir(scope.path()).unwrap().count()
    }

    /// Scrive metà del file e poi fallisce
    struct BrokenCopyLibrary;

    #[async_trait]
    impl MediaLibrary for BrokenCopyLibrary {
        async fn read(&self, _asset: &AssetHandle) -> Result<Vec<u8>, PickerError> {
            Ok(vec![0x42; 64])
        }

        async fn byte_size(&self, _asset: &AssetHandle) -> Result<u64, PickerError> {
            Ok(64)
        }

        async fn copy_to(&self, _asset: &AssetHandle, destination: &Path) -> Result<u64, PickerError> {
            tokio::fs::write(destination, vec![0x42; 32]).await?;
            Err(PickerError::FileAccess("connection to the library lost".to_string()))
        }
    }

    /// Dichiara meno byte di quanti ne copia
    struct UnderreportingLibrary {
        actual: usize,
    }

    #[async_trait]
    impl MediaLibrary for UnderreportingLibrary {
        async fn read(&self, _asset: &AssetHandle) -> Result<Vec<u8>, PickerError> {
            Ok(vec![0x42; self.actual])
        }

        async fn byte_size(&self, _asset: &AssetHandle) -> Result<u64, PickerError> {
            Ok(1)
        }
    }

    /// Fornisce un poster frame fisso
    struct PosterLibrary;

    #[async_trait]
    impl MediaLibrary for PosterLibrary {
        async fn read(&self, _asset: &AssetHandle) -> Result<Vec<u8>, PickerError> {
            Ok(vec![0x42; 3])
        }

        async fn byte_size(&self, _asset: &AssetHandle) -> Result<u64, PickerError> {
            Ok(3)
        }

        async fn thumbnail(&self, _asset: &AssetHandle) -> Result<Option<Vec<u8>>, PickerError> {
            Ok(Some(b"poster".to_vec()))
        }
    }

    #[tokio::test]
    async fn test_pass_through_copy_with_placeholder_thumbnail() {
        let dir = TempDir::new().unwrap();
        let asset = video_fixture(&dir, "clip.MOV", 2048);
        let scope = TempScope::create(Some(dir.path())).unwrap();
        let processor = VideoProcessor::new(Arc::new(FsMediaLibrary::new()));

        let outcome = processor
            .export(&asset, &ConstraintConfig::default(), Some(&scope))
            .await
            .unwrap();

        match outcome {
            ExportOutcome::Ok {
                payload: Payload::FileUri(path),
                byte_size,
                dimensions,
                thumbnail: Some(Payload::FileUri(thumbnail)),
            } => {
                assert_eq!(byte_size, 2048);
                assert_eq!(dimensions, None);
                assert_eq!(path.extension().unwrap(), "mov");
                assert_eq!(std::fs::read(&path).unwrap().len(), 2048);

                assert!(thumbnail.starts_with(scope.path()));
                let poster = image::open(&thumbnail).unwrap();
                assert_eq!((poster.width(), poster.height()), (500, 500));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(scope_entries(&scope), 2);
    }

    #[tokio::test]
    async fn test_too_large_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let asset = video_fixture(&dir, "clip.mp4", 2000);
        let scope = TempScope::create(Some(dir.path())).unwrap();
        let processor = VideoProcessor::new(Arc::new(FsMediaLibrary::new()));
        let constraints = ConstraintConfig {
            max_video_size: 1000,
            ..Default::default()
        };

        let outcome = processor.export(&asset, &constraints, Some(&scope)).await.unwrap();
        assert_eq!(outcome, ExportOutcome::TooLarge { byte_size: 2000, limit: 1000 });
        assert_eq!(scope_entries(&scope), 0);
    }

    #[tokio::test]
    async fn test_failed_copy_leaves_scope_empty() {
        let dir = TempDir::new().unwrap();
        let scope = TempScope::create(Some(dir.path())).unwrap();
        let processor = VideoProcessor::new(Arc::new(BrokenCopyLibrary));
        let asset = AssetHandle::new("library://clip", MediaKind::Video);

        let err = processor
            .export(&asset, &ConstraintConfig::default(), Some(&scope))
            .await
            .unwrap_err();
        assert!(matches!(err, PickerError::FileAccess(_)));
        assert_eq!(scope_entries(&scope), 0);
    }

    #[tokio::test]
    async fn test_oversized_copy_is_discarded() {
        let dir = TempDir::new().unwrap();
        let scope = TempScope::create(Some(dir.path())).unwrap();
        let processor = VideoProcessor::new(Arc::new(UnderreportingLibrary { actual: 2000 }));
        let asset = AssetHandle::new("library://clip", MediaKind::Video);
        let constraints = ConstraintConfig {
            max_video_size: 1000,
            ..Default::default()
        };

        let outcome = processor.export(&asset, &constraints, Some(&scope)).await.unwrap();
        assert_eq!(outcome, ExportOutcome::TooLarge { byte_size: 2000, limit: 1000 });
        assert_eq!(scope_entries(&scope), 0);
    }

    #[tokio::test]
    async fn test_base64_payload_uses_library_poster() {
        let processor = VideoProcessor::new(Arc::new(PosterLibrary));
        let asset = AssetHandle::new("library://clip", MediaKind::Video);
        let constraints = ConstraintConfig {
            output_type: OutputType::Base64,
            ..Default::default()
        };

        let outcome = processor.export(&asset, &constraints, None).await.unwrap();
        assert_eq!(
            outcome,
            ExportOutcome::Ok {
                payload: Payload::Base64("QkJC".to_string()),
                byte_size: 3,
                dimensions: None,
                thumbnail: Some(Payload::Base64("cG9zdGVy".to_string())),
            }
        );
    }

    #[tokio::test]
    async fn test_missing_source_is_error() {
        let processor = VideoProcessor::new(Arc::new(FsMediaLibrary::new()));
        let asset = AssetHandle::new("/no/such/clip.mp4", MediaKind::Video);
        assert!(processor
            .export(&asset, &ConstraintConfig::default(), None)
            .await
            .is_err());
    }
}
