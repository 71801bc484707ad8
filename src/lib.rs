//! # Media Picker Bridge Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare della bridge host ↔ libreria media
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per host embedded
//!
//! ## Architettura dei moduli:
//! - `permission`: Permission Gate sulla libreria media
//! - `constraints`: Opzioni host e vincoli per richiesta
//! - `export`: Pipeline decode → scale → encode → size-check → write
//! - `coordinator`: Macchina a stati della richiesta e single-flight
//! - `plugin`: Superficie dei comandi host
//! - `bridge`: Messaggi di risposta e sink verso l'host
//! - `picker` / `library`: Collaboratori esterni (UI di selezione, accesso ai media)
//! - `image_processor` / `video_processor` / `resize`: Elaborazione per tipo di media
//! - `temp_store`: Scope temporaneo per l'output FILE_URI
//! - `localization`: Tabelle di stringhe localizzate
//! - `config`: Configurazione della bridge
//! - `progress`: Statistiche di export e spinner
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use media_picker_bridge::{MediaBridge, RequestCoordinator, CorrelationToken};
//!
//! let coordinator = RequestCoordinator::new(config, gate, picker, library, sink, localizer);
//! let bridge = MediaBridge::new(Arc::new(coordinator));
//! bridge.execute("getMedia", &json!([{"width": 800}]), CorrelationToken::generate()).await;
//! ```

pub mod bridge;
pub mod config;
pub mod constraints;
pub mod coordinator;
pub mod error;
pub mod export;
pub mod file_manager;
pub mod image_processor;
pub mod library;
pub mod localization;
pub mod permission;
pub mod picker;
pub mod plugin;
pub mod progress;
pub mod resize;
pub mod temp_store;
pub mod video_processor;

#[cfg(test)]
mod test_support;

pub use bridge::{BridgeMessage, ChannelSink, CorrelationToken, JsonLineSink, MediaItem, MediaResponse, ResponseSink};
pub use config::BridgeConfig;
pub use constraints::{ConstraintConfig, OutputType, PickerOptions};
pub use coordinator::{RequestCoordinator, RequestState};
pub use error::{ErrorKind, PickerError};
pub use export::{ExportPipeline, ExportResult};
pub use library::{FsMediaLibrary, MediaLibrary};
pub use localization::{Localizer, StringTables};
pub use permission::{MediaAuthorization, PermissionGate, PermissionState, StaticAuthorization};
pub use picker::{AssetHandle, MediaKind, MediaPicker, PresetPicker};
pub use plugin::{BridgeCommand, MediaBridge};
