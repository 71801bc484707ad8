//! # Coordinator Module
//!
//! Modulo che separa le responsabilità del coordinator in sottomoduli:
//! - `request_coordinator`: Orchestratore principale e driver della richiesta
//! - `state_machine`: Stati, eventi e azioni della richiesta attiva
//! - `flight`: Slot single-flight e pubblicazione dello stato

pub mod flight;
pub mod request_coordinator;
pub mod state_machine;

pub use request_coordinator::RequestCoordinator;
pub use state_machine::{PendingRequest, RequestState};
