//! # Single-Flight Control
//!
//! Garantisce che al massimo un correlation token sia attivo alla volta.
//!
//! ## Responsabilità:
//! - Slot del token attivo: una nuova richiesta con slot occupato viene rifiutata, non accodata
//! - Stato corrente pubblicato su un canale `watch` per `state()` / `wait_until_idle()`
//! - `FlightGuard` libera lo slot e torna a `Idle` su ogni percorso di uscita

use crate::bridge::CorrelationToken;
use crate::coordinator::state_machine::RequestState;
use crate::error::PickerError;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, warn};

pub struct FlightControl {
    live: Mutex<Option<CorrelationToken>>,
    state: watch::Sender<RequestState>,
}

impl FlightControl {
    pub fn new() -> Arc<Self> {
        let (state, _) = watch::channel(RequestState::Idle);
        Arc::new(Self {
            live: Mutex::new(None),
            state,
        })
    }

    /// Occupa lo slot per `token`, oppure rifiuta se un'altra richiesta è attiva
    pub fn claim(self: &Arc<Self>, token: CorrelationToken) -> Result<FlightGuard, PickerError> {
        let mut live = self.live.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(current) = live.as_ref() {
            warn!("Rejecting request {}: {} is still in progress", token, current);
            return Err(PickerError::RequestAlreadyInProgress);
        }

        *live = Some(token.clone());
        self.state.send_replace(RequestState::AwaitingPermission);
        debug!("Request {} is now live", token);

        Ok(FlightGuard {
            control: Arc::clone(self),
            token,
        })
    }

    pub fn state(&self) -> RequestState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.state.subscribe()
    }
}

/// Holds the single-flight slot for one request
pub struct FlightGuard {
    control: Arc<FlightControl>,
    token: CorrelationToken,
}

impl FlightGuard {
    pub fn token(&self) -> &CorrelationToken {
        &self.token
    }

    pub fn set_state(&self, state: RequestState) {
        self.control.state.send_replace(state);
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        let mut live = self.control.live.lock().unwrap_or_else(|e| e.into_inner());
        *live = None;
        self.control.state.send_replace(RequestState::Idle);
        debug!("Request {} released, coordinator idle", self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_claim_is_rejected() {
        let control = FlightControl::new();
        let guard = control.claim(CorrelationToken::new("first")).unwrap();
        assert_eq!(control.state(), RequestState::AwaitingPermission);

        assert!(matches!(
            control.claim(CorrelationToken::new("second")),
            Err(PickerError::RequestAlreadyInProgress)
        ));
        assert_eq!(guard.token(), &CorrelationToken::new("first"));

        drop(guard);
        assert_eq!(control.state(), RequestState::Idle);
        assert!(control.claim(CorrelationToken::new("third")).is_ok());
    }

    #[tokio::test]
    async fn test_subscribers_observe_idle() {
        let control = FlightControl::new();
        let guard = control.claim(CorrelationToken::new("t")).unwrap();
        guard.set_state(RequestState::Exporting);

        let mut rx = control.subscribe();
        assert_eq!(*rx.borrow(), RequestState::Exporting);

        let waiter = tokio::spawn(async move {
            rx.wait_for(|state| *state == RequestState::Idle).await.is_ok()
        });
        drop(guard);
        assert!(waiter.await.unwrap());
    }
}
