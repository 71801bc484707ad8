//! # Picker Collaborator Module
//!
//! Interfaccia verso la UI nativa di selezione media. La UI in sé è esterna:
//! qui vivono solo i tipi che attraversano il confine e un picker headless.
//!
//! ## Responsabilità:
//! - `AssetHandle`: riferimento opaco a un elemento della libreria + tipo (foto/video)
//! - `SelectionMode`: limiti di selezione passati al picker (max elementi, video ammessi)
//! - `PickerOutcome`: selezione, cancel dell'utente o errore del picker
//! - `MediaPicker`: trait async implementato dalla piattaforma host
//! - `PresetPicker`: implementazione headless con selezione predefinita (CLI, test)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Kind of a library item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Valore `mediaType` esposto all'host
    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Photo => "image",
            Self::Video => "video",
        }
    }
}

/// Opaque reference to one library item, valid for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetHandle {
    pub id: String,
    pub kind: MediaKind,
}

impl AssetHandle {
    pub fn new(id: impl Into<String>, kind: MediaKind) -> Self {
        Self { id: id.into(), kind }
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionMode {
    pub max_items: u32,
    pub allow_video: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PickerOutcome {
    /// Handles in the order the user selected them
    Selected(Vec<AssetHandle>),
    Cancelled,
    Failed(String),
}

/// Native multi-select picker presented by the host platform
#[async_trait]
pub trait MediaPicker: Send + Sync {
    /// Presents the picker and suspends until the user confirms or cancels
    async fn present(&self, mode: SelectionMode) -> PickerOutcome;

    /// Dismisses a presented picker; a pending `present` resolves as `Cancelled`.
    /// With no picker on screen this is a no-op.
    fn dismiss(&self);
}

/// Picker che restituisce sempre la stessa selezione, senza UI
pub struct PresetPicker {
    selection: Vec<AssetHandle>,
    presenting: AtomicBool,
    dismissed: AtomicBool,
}

impl PresetPicker {
    pub fn new(selection: Vec<AssetHandle>) -> Self {
        Self {
            selection,
            presenting: AtomicBool::new(false),
            dismissed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl MediaPicker for PresetPicker {
    async fn present(&self, mode: SelectionMode) -> PickerOutcome {
        self.dismissed.store(false, Ordering::SeqCst);
        self.presenting.store(true, Ordering::SeqCst);

        // Il picker nativo applica i filtri di selezione prima di restituire
        let selection: Vec<AssetHandle> = self
            .selection
            .iter()
            .filter(|asset| mode.allow_video || !asset.is_video())
            .take(mode.max_items as usize)
            .cloned()
            .collect();

        debug!(
            "Preset picker returning {} of {} assets",
            selection.len(),
            self.selection.len()
        );

        self.presenting.store(false, Ordering::SeqCst);
        if self.dismissed.swap(false, Ordering::SeqCst) || selection.is_empty() {
            PickerOutcome::Cancelled
        } else {
            PickerOutcome::Selected(selection)
        }
    }

    fn dismiss(&self) {
        if self.presenting.load(Ordering::SeqCst) {
            self.dismissed.store(true, Ordering::SeqCst);
        } else {
            debug!("No picker presented, dismiss ignored");
        }
    }
}
