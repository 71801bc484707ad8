//! # Export Pipeline
//!
//! Worker per l'export di un singolo asset selezionato.
//! Ogni asset produce esattamente un `ExportResult`: nessun errore
//! attraversa il confine della pipeline.

use crate::{
    config::BridgeConfig,
    constraints::{ConstraintConfig, OutputType},
    error::PickerError,
    export::result::{ExportOutcome, ExportResult, Payload},
    file_manager::FileManager,
    image_processor::{ImageProcessor, PHOTO_EXTENSION},
    library::MediaLibrary,
    picker::{AssetHandle, MediaKind},
    temp_store::TempScope,
    video_processor::VideoProcessor,
};
use base64::Engine;
use std::sync::Arc;
use tracing::{debug, warn};

/// Pipeline decode → scale → re-encode → size-check → write
pub struct ExportPipeline {
    library: Arc<dyn MediaLibrary>,
    image_processor: ImageProcessor,
    video_processor: VideoProcessor,
}

impl ExportPipeline {
    pub fn new(library: Arc<dyn MediaLibrary>, image_processor: ImageProcessor) -> Self {
        let video_processor = VideoProcessor::new(library.clone());
        Self {
            library,
            image_processor,
            video_processor,
        }
    }

    pub fn from_config(library: Arc<dyn MediaLibrary>, config: &BridgeConfig) -> Self {
        Self::new(library, ImageProcessor::new(config.resize_algorithm))
    }

    /// Esporta un asset; ogni fallimento diventa un esito tipizzato
    pub async fn export(
        &self,
        asset: &AssetHandle,
        constraints: &ConstraintConfig,
        scope: Option<&TempScope>,
    ) -> ExportResult {
        let outcome = match asset.kind {
            MediaKind::Photo => self.export_photo(asset, constraints, scope).await,
            MediaKind::Video => self.video_processor.export(asset, constraints, scope).await,
        };

        match outcome {
            Ok(outcome) => {
                match &outcome {
                    ExportOutcome::Ok { byte_size, .. } => {
                        debug!("✅ Exported {} ({})", asset.id, FileManager::format_size(*byte_size));
                    }
                    ExportOutcome::TooLarge { byte_size, limit } => {
                        warn!(
                            "Asset {} is too large: {} > {}",
                            asset.id,
                            FileManager::format_size(*byte_size),
                            FileManager::format_size(*limit)
                        );
                    }
                    ExportOutcome::EncodeFailed { reason } => {
                        warn!("Export failed for {}: {}", asset.id, reason);
                    }
                }
                ExportResult::new(asset.clone(), outcome)
            }
            Err(e) => {
                warn!("Export failed for {}: {}", asset.id, e);
                ExportResult::encode_failed(asset.clone(), e.to_string())
            }
        }
    }

    async fn export_photo(
        &self,
        asset: &AssetHandle,
        constraints: &ConstraintConfig,
        scope: Option<&TempScope>,
    ) -> Result<ExportOutcome, PickerError> {
        let source = self.library.read(asset).await?;

        let processor = self.image_processor;
        let task_constraints = *constraints;
        let photo = tokio::task::spawn_blocking(move || processor.process(&source, &task_constraints))
            .await
            .map_err(|e| PickerError::EncodeFailed(format!("encoder task failed: {}", e)))??;

        let byte_size = photo.bytes.len() as u64;
        if let Some(limit) = constraints.size_limit_for(MediaKind::Photo) {
            if byte_size > limit {
                return Ok(ExportOutcome::TooLarge { byte_size, limit });
            }
        }

        let payload = match constraints.output_type {
            OutputType::FileUri => {
                let scope = scope.ok_or_else(|| {
                    PickerError::FileAccess("no temp scope for file output".to_string())
                })?;
                Payload::FileUri(scope.write(&photo.bytes, PHOTO_EXTENSION).await?)
            }
            OutputType::Base64 => {
                Payload::Base64(base64::engine::general_purpose::STANDARD.encode(&photo.bytes))
            }
        };

        Ok(ExportOutcome::Ok {
            payload,
            byte_size,
            dimensions: Some((photo.width, photo.height)),
            thumbnail: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::FsMediaLibrary;
    use crate::test_support::write_photo;
    use tempfile::TempDir;

    fn pipeline() -> ExportPipeline {
        ExportPipeline::new(Arc::new(FsMediaLibrary::new()), ImageProcessor::default())
    }

    #[tokio::test]
    async fn test_photo_to_file_uri() {
        let dir = TempDir::new().unwrap();
        let asset = write_photo(dir.path(), "tall.png", 50, 200);
        let scope = TempScope::create(Some(dir.path())).unwrap();
        let constraints = ConstraintConfig {
            width: 100,
            height: 100,
            quality: 80,
            ..Default::default()
        };

        let result = pipeline().export(&asset, &constraints, Some(&scope)).await;
        match &result.outcome {
            ExportOutcome::Ok { payload: Payload::FileUri(path), byte_size, dimensions, thumbnail } => {
                assert!(path.starts_with(scope.path()));
                assert_eq!(path.extension().unwrap(), "jpg");
                assert_eq!(std::fs::metadata(path).unwrap().len(), *byte_size);
                assert_eq!(*dimensions, Some((25, 100)));
                assert_eq!(*thumbnail, None);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(result.source, asset);
    }

    #[tokio::test]
    async fn test_photo_to_base64_writes_no_file() {
        let dir = TempDir::new().unwrap();
        let asset = write_photo(dir.path(), "square.png", 40, 40);
        let scope = TempScope::create(Some(dir.path())).unwrap();
        let constraints = ConstraintConfig {
            output_type: OutputType::Base64,
            ..Default::default()
        };

        let result = pipeline().export(&asset, &constraints, Some(&scope)).await;
        let Some(Payload::Base64(encoded)) = result.payload() else {
            panic!("expected base64 payload, got {:?}", result.outcome);
        };
        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded).unwrap();
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
        assert_eq!(std::fs::read_dir(scope.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_photo_too_large_has_no_payload() {
        let dir = TempDir::new().unwrap();
        let asset = write_photo(dir.path(), "big.png", 64, 64);
        let scope = TempScope::create(Some(dir.path())).unwrap();
        let constraints = ConstraintConfig {
            max_photo_size: 10,
            ..Default::default()
        };

        let result = pipeline().export(&asset, &constraints, Some(&scope)).await;
        assert!(result.is_too_large());
        assert!(result.payload().is_none());
        assert_eq!(std::fs::read_dir(scope.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_bmp_and_tiff_photos_export() {
        let dir = TempDir::new().unwrap();
        let constraints = ConstraintConfig {
            output_type: OutputType::Base64,
            ..Default::default()
        };

        for name in ["scan.bmp", "scan.tiff"] {
            let asset = write_photo(dir.path(), name, 4, 4);
            assert_eq!(asset.kind, MediaKind::Photo);

            let result = pipeline().export(&asset, &constraints, None).await;
            match &result.outcome {
                ExportOutcome::Ok { payload: Payload::Base64(_), dimensions, .. } => {
                    assert_eq!(*dimensions, Some((4, 4)));
                }
                other => panic!("{} exported as {:?}", name, other),
            }
        }
    }

    #[tokio::test]
    async fn test_heic_photo_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("IMG_0001.HEIC");
        let mut heic = vec![0x00, 0x00, 0x00, 0x18];
        heic.extend_from_slice(b"ftypheic\0\0\0\0mif1heic");
        std::fs::write(&path, heic).unwrap();
        let asset = FsMediaLibrary::handle_for(&path).unwrap();

        let result = pipeline().export(&asset, &ConstraintConfig::default(), None).await;
        match &result.outcome {
            ExportOutcome::EncodeFailed { reason } => {
                assert!(reason.starts_with("Unsupported media format"), "{}", reason);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_undecodable_photo_is_encode_failed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not a jpeg").unwrap();
        let asset = FsMediaLibrary::handle_for(&path).unwrap();

        let result = pipeline().export(&asset, &ConstraintConfig::default(), None).await;
        assert!(result.is_encode_failed());
    }

    #[tokio::test]
    async fn test_missing_source_is_encode_failed() {
        let asset = AssetHandle::new("/no/such/file.png", MediaKind::Photo);
        let result = pipeline().export(&asset, &ConstraintConfig::default(), None).await;
        assert!(result.is_encode_failed());
    }
}
