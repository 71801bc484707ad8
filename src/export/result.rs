//! # Export Result Types
//!
//! Esito dell'export di un singolo asset, prodotto dalla pipeline e
//! consumato dal Coordinator. Non viene conservato dopo la risposta.

use crate::picker::AssetHandle;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// File inside the request temp scope
    FileUri(PathBuf),
    /// Standard base64 of the encoded bytes
    Base64(String),
}

impl Payload {
    /// Valore stringa consegnato all'host (path o base64)
    pub fn to_host_string(&self) -> String {
        match self {
            Self::FileUri(path) => path.to_string_lossy().to_string(),
            Self::Base64(data) => data.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Ok {
        payload: Payload,
        byte_size: u64,
        /// Output dimensions, photos only
        dimensions: Option<(u32, u32)>,
        /// Poster image, videos only; same encoding as `payload`
        thumbnail: Option<Payload>,
    },
    /// Encoded size above the limit; the data was discarded
    TooLarge { byte_size: u64, limit: u64 },
    EncodeFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    pub source: AssetHandle,
    pub outcome: ExportOutcome,
}

impl ExportResult {
    pub fn new(source: AssetHandle, outcome: ExportOutcome) -> Self {
        Self { source, outcome }
    }

    pub fn encode_failed(source: AssetHandle, reason: impl Into<String>) -> Self {
        Self::new(source, ExportOutcome::EncodeFailed { reason: reason.into() })
    }

    pub fn is_too_large(&self) -> bool {
        matches!(self.outcome, ExportOutcome::TooLarge { .. })
    }

    pub fn is_encode_failed(&self) -> bool {
        matches!(self.outcome, ExportOutcome::EncodeFailed { .. })
    }

    pub fn payload(&self) -> Option<&Payload> {
        match &self.outcome {
            ExportOutcome::Ok { payload, .. } => Some(payload),
            _ => None,
        }
    }
}
