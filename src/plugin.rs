//! # Plugin Command Surface
//!
//! Punto di ingresso dei comandi host → core.
//!
//! ## Responsabilità:
//! - Parsing di azione + argomenti in un `BridgeCommand`
//! - Dispatch verso il `RequestCoordinator` o il `PermissionGate`
//! - Consegna dei rifiuti sincroni al token del comando che li ha causati
//!
//! ## Comandi:
//! - `getMedia` / `getPictures`: richiesta media con opzioni
//! - `hasReadPermission`: stato corrente, senza prompt
//! - `requestReadPermission`: prompt OS se lo stato è indeterminato
//! - `closePicker` / `closeImagePicker`: chiude il picker aperto

use crate::bridge::{BridgeMessage, CorrelationToken};
use crate::coordinator::RequestCoordinator;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeCommand {
    GetMedia(Value),
    HasReadPermission,
    RequestReadPermission,
    ClosePicker,
}

impl BridgeCommand {
    /// `None` per azioni che questo plugin non gestisce
    pub fn parse(action: &str, args: &Value) -> Option<Self> {
        match action {
            "getMedia" | "getPictures" => {
                // Gli host passano le opzioni come primo elemento di un array
                let options = match args {
                    Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
                    other => other.clone(),
                };
                Some(Self::GetMedia(options))
            }
            "hasReadPermission" => Some(Self::HasReadPermission),
            "requestReadPermission" => Some(Self::RequestReadPermission),
            "closePicker" | "closeImagePicker" => Some(Self::ClosePicker),
            _ => None,
        }
    }
}

pub struct MediaBridge {
    coordinator: Arc<RequestCoordinator>,
}

impl MediaBridge {
    pub fn new(coordinator: Arc<RequestCoordinator>) -> Self {
        Self { coordinator }
    }

    pub fn coordinator(&self) -> &Arc<RequestCoordinator> {
        &self.coordinator
    }

    /// Esegue un comando host; restituisce `false` se l'azione è sconosciuta
    pub async fn execute(&self, action: &str, args: &Value, token: CorrelationToken) -> bool {
        let Some(command) = BridgeCommand::parse(action, args) else {
            warn!("Unknown action: {}", action);
            return false;
        };
        debug!("Executing {:?} for {}", command, token);

        let sink = self.coordinator.sink();
        match command {
            BridgeCommand::GetMedia(options) => {
                if let Err(e) = self.coordinator.submit(token.clone(), &options) {
                    let message = BridgeMessage::error(&e, self.coordinator.localizer().as_ref());
                    sink.deliver(&token, message);
                }
            }
            BridgeCommand::HasReadPermission => {
                let state = self.coordinator.permission_gate().check_read_permission();
                sink.deliver(&token, BridgeMessage::permission(state.is_granted()));
            }
            BridgeCommand::RequestReadPermission => {
                let state = self.coordinator.permission_gate().request_read_permission().await;
                sink.deliver(&token, BridgeMessage::permission(state.is_granted()));
            }
            BridgeCommand::ClosePicker => {
                self.coordinator.close_picker();
                sink.deliver(&token, BridgeMessage::Ack);
            }
        }

        true
    }
}
