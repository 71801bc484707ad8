//! # Permission Gate Module
//!
//! Controllo e richiesta del permesso di lettura sulla libreria media.
//!
//! ## Responsabilità:
//! - `check_read_permission()`: query sincrona, senza side effect, dello stato OS
//! - `request_read_permission()`: mostra il consenso OS solo se lo stato è UNDETERMINED
//! - Nessuna cache tra richieste: lo stato viene letto dall'OS ad ogni query
//! - Richieste concorrenti non producono prompt duplicati
//!
//! DENIED non è un errore a questo livello: è il Coordinator a tradurlo in
//! `PermissionDenied`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionState {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionState {
    pub fn is_granted(&self) -> bool {
        *self == Self::Granted
    }
}

/// Media-library authorization API of the operating system
#[async_trait]
pub trait MediaAuthorization: Send + Sync {
    /// Current authorization, without prompting
    fn status(&self) -> PermissionState;

    /// Shows the consent dialog and resolves with the user's decision
    async fn prompt(&self) -> PermissionState;
}

/// Gate davanti alla libreria media
pub struct PermissionGate {
    authorization: Arc<dyn MediaAuthorization>,
    prompt_lock: tokio::sync::Mutex<()>,
}

impl PermissionGate {
    pub fn new(authorization: Arc<dyn MediaAuthorization>) -> Self {
        Self {
            authorization,
            prompt_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn check_read_permission(&self) -> PermissionState {
        self.authorization.status()
    }

    /// Prompts only while UNDETERMINED; GRANTED/DENIED return immediately
    pub async fn request_read_permission(&self) -> PermissionState {
        let current = self.check_read_permission();
        if current != PermissionState::Undetermined {
            debug!("Read permission already decided: {:?}", current);
            return current;
        }

        let _guard = self.prompt_lock.lock().await;

        // Un'altra richiesta potrebbe aver già mostrato il prompt
        let current = self.check_read_permission();
        if current != PermissionState::Undetermined {
            return current;
        }

        info!("🔐 Requesting media library read permission");
        let decision = self.authorization.prompt().await;
        info!("Read permission decision: {:?}", decision);
        decision
    }
}

/// Autorizzazione headless: stato fisso, con risposta predefinita al prompt
pub struct StaticAuthorization {
    state: Mutex<PermissionState>,
    prompt_answer: PermissionState,
    prompts: AtomicUsize,
}

impl StaticAuthorization {
    pub fn new(state: PermissionState, prompt_answer: PermissionState) -> Self {
        Self {
            state: Mutex::new(state),
            prompt_answer,
            prompts: AtomicUsize::new(0),
        }
    }

    pub fn granted() -> Self {
        Self::new(PermissionState::Granted, PermissionState::Granted)
    }

    pub fn denied() -> Self {
        Self::new(PermissionState::Denied, PermissionState::Denied)
    }

    /// Number of consent dialogs shown so far
    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: PermissionState) {
        match self.state.lock() {
            Ok(mut current) => *current = state,
            Err(poisoned) => *poisoned.into_inner() = state,
        }
    }
}

#[async_trait]
impl MediaAuthorization for StaticAuthorization {
    fn status(&self) -> PermissionState {
        match self.state.lock() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    async fn prompt(&self) -> PermissionState {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.set_state(self.prompt_answer);
        self.prompt_answer
    }
}
