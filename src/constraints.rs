//! # Constraint Configuration Module
//!
//! Validazione delle opzioni passate dall'host e costruzione dei limiti
//! per-richiesta applicati dalla pipeline di export.
//!
//! ## Responsabilità:
//! - `PickerOptions`: opzioni grezze dell'host (JSON camelCase)
//! - `ConstraintConfig::parse()`: valida e produce i limiti immutabili della richiesta
//! - `selection_mode()`: limiti di selezione destinati al picker
//!
//! ## Parametri:
//! - `width` / `height`: bounding box (0 = nessun resize)
//! - `quality`: qualità JPEG 0-100 (default: 100)
//! - `outputType`: `0`/`fileUri` oppure `1`/`base64`
//! - `maxPhotoSize` / `maxVideoSize`: limite in byte (0 = illimitato)
//! - `maximumImagesCount`: massimo numero di elementi (>= 1)
//! - `allow_video`: ammette video nella selezione
//!
//! ## Esempio:
//! ```rust,ignore
//! let options = PickerOptions::from_json(&json!({"width": 800, "outputType": "base64"}))?;
//! let constraints = ConstraintConfig::parse(&options)?;
//! ```

use crate::error::PickerError;
use crate::picker::{MediaKind, SelectionMode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_QUALITY: u8 = 100;

/// Encoding of exported media in the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputType {
    FileUri,
    Base64,
}

impl OutputType {
    fn from_value(value: &Value) -> Result<Self, PickerError> {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(0) => Ok(Self::FileUri),
                Some(1) => Ok(Self::Base64),
                _ => Err(PickerError::Validation(format!("unknown outputType {}", n))),
            },
            Value::String(s) => match s.as_str() {
                "fileUri" | "FILE_URI" => Ok(Self::FileUri),
                "base64" | "BASE64" => Ok(Self::Base64),
                other => Err(PickerError::Validation(format!("unknown outputType \"{}\"", other))),
            },
            other => Err(PickerError::Validation(format!("unknown outputType {}", other))),
        }
    }
}

/// Options as supplied by the host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickerOptions {
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub quality: Option<i64>,
    pub output_type: Option<Value>,
    pub max_photo_size: Option<i64>,
    pub max_video_size: Option<i64>,
    pub maximum_images_count: Option<i64>,
    #[serde(rename = "allow_video")]
    pub allow_video: Option<bool>,
}

impl PickerOptions {
    /// Missing or `null` options mean "all defaults"
    pub fn from_json(value: &Value) -> Result<Self, PickerError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone())
            .map_err(|e| PickerError::Validation(format!("malformed options: {}", e)))
    }

    /// Limiti di selezione per il picker
    pub fn selection_mode(&self, default_max_items: u32) -> Result<SelectionMode, PickerError> {
        let max_items = match self.maximum_images_count {
            None => default_max_items,
            Some(count) if count >= 1 => u32::try_from(count).unwrap_or(u32::MAX),
            Some(count) => {
                return Err(PickerError::Validation(format!(
                    "maximumImagesCount must be at least 1, got {}",
                    count
                )))
            }
        };

        Ok(SelectionMode {
            max_items,
            allow_video: self.allow_video.unwrap_or(false),
        })
    }
}

/// Per-request limits, immutable once the request starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConstraintConfig {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub output_type: OutputType,
    /// Bytes, 0 = unbounded
    pub max_photo_size: u64,
    /// Bytes, 0 = unbounded
    pub max_video_size: u64,
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            quality: DEFAULT_QUALITY,
            output_type: OutputType::FileUri,
            max_photo_size: 0,
            max_video_size: 0,
        }
    }
}

impl ConstraintConfig {
    pub fn parse(options: &PickerOptions) -> Result<Self, PickerError> {
        let quality = match options.quality {
            None => DEFAULT_QUALITY,
            Some(q) if (0..=100).contains(&q) => q as u8,
            Some(q) => {
                return Err(PickerError::Validation(format!(
                    "quality must be between 0 and 100, got {}",
                    q
                )))
            }
        };

        let output_type = match &options.output_type {
            None | Some(Value::Null) => OutputType::FileUri,
            Some(value) => OutputType::from_value(value)?,
        };

        Ok(Self {
            width: dimension("width", options.width)?,
            height: dimension("height", options.height)?,
            quality,
            output_type,
            max_photo_size: byte_limit("maxPhotoSize", options.max_photo_size)?,
            max_video_size: byte_limit("maxVideoSize", options.max_video_size)?,
        })
    }

    /// True when a resize bounding box is configured
    pub fn has_bounding_box(&self) -> bool {
        self.width > 0 || self.height > 0
    }

    /// Limite di dimensione per tipo di media, `None` se illimitato
    pub fn size_limit_for(&self, kind: MediaKind) -> Option<u64> {
        let limit = match kind {
            MediaKind::Photo => self.max_photo_size,
            MediaKind::Video => self.max_video_size,
        };
        (limit > 0).then_some(limit)
    }
}

fn dimension(name: &str, value: Option<i64>) -> Result<u32, PickerError> {
    match value {
        None => Ok(0),
        Some(v) if v < 0 => Err(PickerError::Validation(format!("{} must not be negative, got {}", name, v))),
        Some(v) => u32::try_from(v)
            .map_err(|_| PickerError::Validation(format!("{} is out of range: {}", name, v))),
    }
}

fn byte_limit(name: &str, value: Option<i64>) -> Result<u64, PickerError> {
    match value {
        None => Ok(0),
        Some(v) if v < 0 => Err(PickerError::Validation(format!("{} must not be negative, got {}", name, v))),
        Some(v) => Ok(v as u64),
    }
}
