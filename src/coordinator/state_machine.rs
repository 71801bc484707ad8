//! # Pending Request State Machine
//!
//! Macchina a stati di una singola richiesta media, senza I/O.
//!
//! ## Responsabilità:
//! - Stato corrente della richiesta (`RequestState`)
//! - Avanzamento tramite messaggi (`StageEvent`) prodotti da gate, picker e pipeline
//! - Prossima azione da eseguire (`Action`), decisa solo dalla macchina
//! - Raccolta dei risultati per indice di selezione e composizione della risposta
//!
//! ## Transizioni:
//! ```text
//! Idle → AwaitingPermission → AwaitingSelection → Exporting → Aggregating → Done
//!              │ denied              │ cancel / failure / vuota
//!              └──────────→ Done ←───┘
//! ```
//!
//! Il driver esegue le azioni e reinvia gli esiti come eventi: la macchina
//! resta l'unico punto di mutazione dei risultati raccolti.

use crate::bridge::{MediaItem, MediaResponse};
use crate::error::PickerError;
use crate::export::ExportResult;
use crate::localization::{Localizer, PICKER_TABLE};
use crate::permission::PermissionState;
use crate::picker::{AssetHandle, PickerOutcome, SelectionMode};
use crate::progress::ExportStats;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestState {
    Idle,
    AwaitingPermission,
    AwaitingSelection,
    Exporting,
    Aggregating,
    Done,
}

/// Messages that advance a pending request
#[derive(Debug)]
pub enum StageEvent {
    Permission(PermissionState),
    Selection(PickerOutcome),
    /// `index` is the asset's position in the user's selection
    Exported { index: usize, result: ExportResult },
}

/// Work the driver performs on behalf of the state machine
#[derive(Debug)]
pub enum Action {
    RequestPermission,
    PresentPicker(SelectionMode),
    Export(Vec<AssetHandle>),
    Respond(Result<MediaResponse, PickerError>),
}

#[derive(Debug)]
pub struct PendingRequest {
    state: RequestState,
    mode: SelectionMode,
    slots: Vec<Option<ExportResult>>,
    collected: usize,
}

impl PendingRequest {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            state: RequestState::Idle,
            mode,
            slots: Vec::new(),
            collected: 0,
        }
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn expected(&self) -> usize {
        self.slots.len()
    }

    pub fn collected(&self) -> usize {
        self.collected
    }

    pub fn start(&mut self) -> Action {
        self.state = RequestState::AwaitingPermission;
        Action::RequestPermission
    }

    /// Applica un evento; `None` significa che la richiesta resta in attesa
    pub fn handle(&mut self, event: StageEvent) -> Option<Action> {
        match (self.state, event) {
            (RequestState::AwaitingPermission, StageEvent::Permission(permission)) => {
                if permission.is_granted() {
                    self.state = RequestState::AwaitingSelection;
                    Some(Action::PresentPicker(self.mode))
                } else {
                    info!("🔒 Read permission {:?}, request denied", permission);
                    Some(self.respond(Err(PickerError::PermissionDenied)))
                }
            }
            (RequestState::AwaitingSelection, StageEvent::Selection(outcome)) => {
                Some(self.on_selection(outcome))
            }
            (RequestState::Exporting, StageEvent::Exported { index, result }) => {
                self.on_exported(index, result)
            }
            (state, event) => {
                warn!("Ignoring {:?} while {:?}", event, state);
                None
            }
        }
    }

    /// Aborto esplicito: porta la richiesta a `Done` con un errore
    pub fn abort(&mut self, reason: impl Into<String>) -> Action {
        self.respond(Err(PickerError::Aborted(reason.into())))
    }

    fn respond(&mut self, response: Result<MediaResponse, PickerError>) -> Action {
        self.state = RequestState::Done;
        Action::Respond(response)
    }

    fn on_selection(&mut self, outcome: PickerOutcome) -> Action {
        let mut assets = match outcome {
            PickerOutcome::Selected(assets) => assets,
            PickerOutcome::Cancelled => {
                info!("Picker cancelled by the user");
                return self.respond(Ok(MediaResponse::cancelled()));
            }
            PickerOutcome::Failed(message) => {
                warn!("Picker failed: {}", message);
                return self.respond(Err(PickerError::PickerFailed(message)));
            }
        };

        let max_items = self.mode.max_items as usize;
        if assets.len() > max_items {
            warn!(
                "Picker returned {} assets, keeping the first {}",
                assets.len(),
                max_items
            );
            assets.truncate(max_items);
        }
        if !self.mode.allow_video && assets.iter().any(AssetHandle::is_video) {
            warn!("Picker returned videos although video selection is disabled");
        }

        if assets.is_empty() {
            debug!("Empty selection");
            return self.respond(Ok(MediaResponse::default()));
        }

        info!("📸 Exporting {} selected assets", assets.len());
        self.slots = vec![None; assets.len()];
        self.collected = 0;
        self.state = RequestState::Exporting;
        Action::Export(assets)
    }

    fn on_exported(&mut self, index: usize, result: ExportResult) -> Option<Action> {
        let expected = self.slots.len();
        let Some(slot) = self.slots.get_mut(index) else {
            warn!("Export result #{} outside the selection ({})", index, expected);
            return None;
        };
        if slot.is_some() {
            warn!("Duplicate export result for asset #{}", index);
            return None;
        }
        *slot = Some(result);
        self.collected += 1;
        debug!("Collected {}/{} export results", self.collected, self.slots.len());

        if self.collected < self.slots.len() {
            return None;
        }

        self.state = RequestState::Aggregating;
        let response = self.aggregate();
        Some(self.respond(response))
    }

    fn aggregate(&mut self) -> Result<MediaResponse, PickerError> {
        let results: Vec<ExportResult> = self.slots.drain(..).flatten().collect();

        let mut stats = ExportStats::new();
        for result in &results {
            stats.record(result);
        }
        info!("📊 {}", stats.format_summary());

        if stats.all_failed() {
            return Err(if stats.assets_too_large == stats.assets_selected {
                PickerError::TooLarge
            } else {
                PickerError::EncodeFailed(format!(
                    "{} of {} assets could not be exported",
                    stats.assets_failed + stats.assets_too_large,
                    stats.assets_selected
                ))
            });
        }

        Ok(MediaResponse {
            results: results.iter().map(MediaItem::from).collect(),
            cancelled: false,
            media_size_limit_exceeded: stats.assets_too_large > 0,
            video_export_failed: stats.videos_failed > 0,
            export_failed: stats.assets_failed > 0,
            message: None,
        })
    }
}

/// Avviso localizzato per una risposta con flag attivi
pub fn warning_message(response: &MediaResponse, localizer: &dyn Localizer) -> Option<String> {
    let keys = [
        (response.media_size_limit_exceeded, "size_limit_exceeded"),
        (response.video_export_failed, "video_export_failed"),
        (response.export_failed && !response.video_export_failed, "export_failed"),
    ];

    let parts: Vec<String> = keys
        .iter()
        .filter(|(set, _)| *set)
        .map(|(_, key)| localizer.localized(key, PICKER_TABLE))
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}
