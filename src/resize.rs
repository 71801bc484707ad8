//! # Image Resize Module
//!
//! Questo modulo calcola le dimensioni di output delle foto selezionate e
//! applica il ridimensionamento in memoria con il crate `image`.
//!
//! ## Caratteristiche
//! - **Aspect ratio preservato**: nessuna distorsione, mai crop
//! - **Mai upscaling**: il fattore di scala è limitato a 1.0
//! - **Bounding box opzionale**: width=0 e height=0 mantengono le dimensioni originali
//! - **Un solo lato configurato**: si usa solo il rapporto di quel lato
//!
//! ## Calcolo del fattore
//! ```text
//! entrambi  -> min(width / src_w, height / src_h)
//! solo width  -> width / src_w
//! solo height -> height / src_h
//! fattore = min(fattore, 1.0)
//! ```
//!
//! ## Esempio
//! ```text
//! sorgente 50x200, box 100x100 -> fattore 0.5 -> 25x100
//! ```

use image::imageops::FilterType;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Algoritmi di resize disponibili
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeAlgorithm {
    /// Nearest - Velocissimo, qualità bassa
    Nearest,
    /// Triangle - Veloce, qualità accettabile
    Triangle,
    /// CatmullRom - Buon bilanciamento qualità/velocità
    CatmullRom,
    /// Lanczos - Migliore qualità per downscaling
    #[default]
    Lanczos,
}

impl ResizeAlgorithm {
    pub fn to_filter_type(&self) -> FilterType {
        match self {
            ResizeAlgorithm::Nearest => FilterType::Nearest,
            ResizeAlgorithm::Triangle => FilterType::Triangle,
            ResizeAlgorithm::CatmullRom => FilterType::CatmullRom,
            ResizeAlgorithm::Lanczos => FilterType::Lanczos3,
        }
    }
}

/// Scale factor that fits the source into the bounding box, never above 1.0.
/// A zero bound means that side is unconstrained.
pub fn scale_factor(src_w: u32, src_h: u32, width: u32, height: u32) -> f64 {
    if src_w == 0 || src_h == 0 {
        return 1.0;
    }

    let scale_w = width as f64 / src_w as f64;
    let scale_h = height as f64 / src_h as f64;

    let factor = match (width > 0, height > 0) {
        (true, true) => scale_w.min(scale_h),
        (true, false) => scale_w,
        (false, true) => scale_h,
        (false, false) => 1.0,
    };

    factor.min(1.0)
}

/// Dimensioni di output per il bounding box configurato (minimo 1px per lato)
pub fn fit_dimensions(src_w: u32, src_h: u32, width: u32, height: u32) -> (u32, u32) {
    let factor = scale_factor(src_w, src_h, width, height);
    if factor >= 1.0 {
        return (src_w, src_h);
    }

    let new_w = (src_w as f64 * factor).round() as u32;
    let new_h = (src_h as f64 * factor).round() as u32;
    (new_w.max(1), new_h.max(1))
}

/// Ridimensionatore in memoria
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageResizer {
    algorithm: ResizeAlgorithm,
}

impl ImageResizer {
    pub fn new(algorithm: ResizeAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Resizes `image` to fit within `width` x `height`, or returns it untouched
    pub fn fit(&self, image: DynamicImage, width: u32, height: u32) -> DynamicImage {
        let (src_w, src_h) = (image.width(), image.height());
        let (new_w, new_h) = fit_dimensions(src_w, src_h, width, height);

        if (new_w, new_h) == (src_w, src_h) {
            debug!("No resize needed for {}x{} (box {}x{})", src_w, src_h, width, height);
            return image;
        }

        debug!("Resizing {}x{} -> {}x{} ({:?})", src_w, src_h, new_w, new_h, self.algorithm);
        image.resize_exact(new_w, new_h, self.algorithm.to_filter_type())
    }
}
