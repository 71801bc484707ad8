//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom della bridge.
//!
//! ## Responsabilità:
//! - Definisce `PickerError` enum per categorizzare tutti gli errori possibili
//! - Mappa ogni errore su un `ErrorKind` serializzabile verso l'host
//! - Fornisce il messaggio localizzato da mostrare all'utente
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `PermissionDenied`: Accesso alla libreria media negato (terminale)
//! - `RequestAlreadyInProgress`: Richiesta rifiutata per single-flight
//! - `Validation`: Opzioni host malformate, rifiutate prima di ogni lavoro
//! - `TooLarge` / `EncodeFailed`: Errori per-asset, terminali solo se falliscono tutti
//! - `PickerFailed`: Il picker ha riportato un errore (diverso dal cancel)
//! - `FileAccess` / `Io`: Errori su storage temporaneo o file sorgente
//! - `Aborted`: La richiesta è terminata senza passare per la composizione
//!
//! ## Esempio:
//! ```rust,ignore
//! if quality > 100 {
//!     return Err(PickerError::Validation("quality must be between 0 and 100".to_string()));
//! }
//! ```

use crate::localization::{Localizer, PICKER_TABLE};
use serde::{Deserialize, Serialize};

/// Custom error types for media selection and export
#[derive(thiserror::Error, Debug)]
pub enum PickerError {
    #[error("Read permission for the media library was denied")]
    PermissionDenied,

    #[error("A media request is already in progress")]
    RequestAlreadyInProgress,

    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("Every selected asset exceeds the configured size limit")]
    TooLarge,

    #[error("Encoding failed: {0}")]
    EncodeFailed(String),

    #[error("Picker failed: {0}")]
    PickerFailed(String),

    #[error("File access error: {0}")]
    FileAccess(String),

    #[error("Request aborted: {0}")]
    Aborted(String),

    #[error("Unsupported media format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// Error category delivered to the host in a terminal error payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    PermissionDenied,
    RequestAlreadyInProgress,
    ValidationError,
    TooLarge,
    EncodeFailed,
    PickerFailed,
    FileAccess,
    Aborted,
}

impl PickerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PermissionDenied => ErrorKind::PermissionDenied,
            Self::RequestAlreadyInProgress => ErrorKind::RequestAlreadyInProgress,
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::TooLarge => ErrorKind::TooLarge,
            Self::EncodeFailed(_) | Self::UnsupportedFormat(_) | Self::Image(_) => ErrorKind::EncodeFailed,
            Self::PickerFailed(_) => ErrorKind::PickerFailed,
            Self::FileAccess(_) | Self::Io(_) => ErrorKind::FileAccess,
            Self::Aborted(_) => ErrorKind::Aborted,
        }
    }

    /// Messaggio per l'utente finale, risolto nella tabella `SOSPicker`
    pub fn user_message(&self, localizer: &dyn Localizer) -> String {
        match self {
            Self::PermissionDenied => localizer.localized("permission_denied", PICKER_TABLE),
            Self::RequestAlreadyInProgress => localizer.localized("request_in_progress", PICKER_TABLE),
            Self::Validation(detail) => {
                localizer.format("invalid_configuration", PICKER_TABLE, &[("detail", detail.as_str())])
            }
            Self::TooLarge => localizer.localized("all_too_large", PICKER_TABLE),
            Self::EncodeFailed(_) | Self::UnsupportedFormat(_) | Self::Image(_) => {
                localizer.localized("all_failed", PICKER_TABLE)
            }
            Self::PickerFailed(detail) => {
                localizer.format("picker_failed", PICKER_TABLE, &[("detail", detail.as_str())])
            }
            Self::FileAccess(_) | Self::Io(_) => localizer.localized("file_access", PICKER_TABLE),
            Self::Aborted(_) => localizer.localized("request_aborted", PICKER_TABLE),
        }
    }
}
