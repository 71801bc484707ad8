//! # Image Processing Module
//!
//! Questo modulo trasforma i byte di una foto selezionata nell'output vincolato
//! richiesto dall'host, interamente in memoria con il crate `image`.
//!
//! ## Pipeline per foto
//!
//! 1. **Decode**: formato rilevato dal contenuto (JPEG, PNG, WebP, GIF, BMP, TIFF)
//! 2. **Resize**: solo se è configurato un bounding box, vedi `resize`
//! 3. **Re-encode**: sempre JPEG, con la qualità configurata
//!
//! ## Configurazione Qualità
//!
//! - **quality**: 0-100 dall'host
//!   - L'encoder JPEG accetta 1-100: 0 viene trattato come 1
//!   - 100 = massima qualità, file più grandi
//!
//! ## Error Handling
//!
//! - **Formato non riconosciuto** (es. HEIC): `PickerError::UnsupportedFormat`
//! - **Decode fallito**: `PickerError::Image` (dato corrotto)
//! - **Encode fallito**: `PickerError::Image`
//!
//! La pipeline converte questi errori in un esito `ENCODE_FAILED` per-asset:
//! qui non si decide nulla sul destino della richiesta.
//!
//! ## Thumbnail video
//!
//! Quando la libreria non fornisce un poster frame, i video ricevono un
//! placeholder JPEG grigio scuro 500x500 a qualità 80.
//!
//! ## Concorrenza
//!
//! Le operazioni sono sincrone e CPU-bound: il chiamante le esegue dentro
//! `tokio::task::spawn_blocking`.

use crate::constraints::ConstraintConfig;
use crate::error::PickerError;
use crate::resize::{ImageResizer, ResizeAlgorithm};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use tracing::debug;

/// Estensione dei file prodotti da `ImageProcessor`
pub const PHOTO_EXTENSION: &str = "jpg";

const PLACEHOLDER_SIDE: u32 = 500;
const PLACEHOLDER_COLOR: Rgb<u8> = Rgb([0x44, 0x44, 0x44]);
const PLACEHOLDER_QUALITY: u8 = 80;

/// Re-encoded photo ready for the size check
#[derive(Debug, Clone)]
pub struct EncodedPhoto {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decodes, scales and re-encodes photos
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageProcessor {
    resizer: ImageResizer,
}

impl ImageProcessor {
    pub fn new(algorithm: ResizeAlgorithm) -> Self {
        Self {
            resizer: ImageResizer::new(algorithm),
        }
    }

    pub fn process(&self, source: &[u8], constraints: &ConstraintConfig) -> Result<EncodedPhoto, PickerError> {
        let format = image::guess_format(source)
            .map_err(|_| PickerError::UnsupportedFormat("unrecognized image data".to_string()))?;
        let decoded = image::load_from_memory_with_format(source, format)?;
        debug!("Decoded photo {}x{}", decoded.width(), decoded.height());

        let image = if constraints.has_bounding_box() {
            self.resizer.fit(decoded, constraints.width, constraints.height)
        } else {
            decoded
        };

        let (width, height) = (image.width(), image.height());
        let rgb = image.to_rgb8();

        let mut bytes = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut bytes, constraints.quality.clamp(1, 100));
            encoder.encode_image(&rgb)?;
        }

        debug!(
            "Encoded photo {}x{} at quality {}: {} bytes",
            width,
            height,
            constraints.quality,
            bytes.len()
        );

        Ok(EncodedPhoto { bytes, width, height })
    }

    /// Thumbnail JPEG a tinta unita per video senza poster frame
    pub fn placeholder_thumbnail() -> Result<Vec<u8>, PickerError> {
        let image = RgbImage::from_pixel(PLACEHOLDER_SIDE, PLACEHOLDER_SIDE, PLACEHOLDER_COLOR);
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, PLACEHOLDER_QUALITY).encode_image(&image)?;
        Ok(bytes)
    }
}
