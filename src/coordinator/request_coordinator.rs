//! # Request Coordinator
//!
//! Orchestratore di una richiesta media: unico componente esposto all'host.
//!
//! ## Responsabilità:
//! - Validazione delle opzioni prima di qualsiasi lavoro (permesso, picker, export)
//! - Single-flight: un solo correlation token attivo, le altre richieste vengono rifiutate
//! - Esecuzione delle azioni della `PendingRequest` (permesso, picker, fan-out dell'export)
//! - Consegna di esattamente una risposta terminale per richiesta
//! - Rilascio dello scope temporaneo dopo la consegna, poi ritorno a `Idle`
//!
//! ## Flusso:
//! ```text
//! submit ─► claim slot ─► driver task
//!                          │  Action ──► stage task(s) ──► StageEvent ──┐
//!                          └──────────── PendingRequest::handle ◄───────┘
//! ```
//!
//! Ogni stage usa un canale dedicato: se tutti i mittenti spariscono senza
//! riportare un esito (task in panic) la richiesta termina con `Aborted`.
//!
//! ## Esempio:
//! ```rust,ignore
//! let coordinator = RequestCoordinator::new(config, gate, picker, library, sink, localizer);
//! coordinator.submit(CorrelationToken::generate(), &json!({"width": 800, "quality": 80}))?;
//! coordinator.wait_until_idle().await;
//! ```

use crate::{
    bridge::{BridgeMessage, CorrelationToken, MediaResponse, ResponseSink},
    config::BridgeConfig,
    constraints::{ConstraintConfig, OutputType, PickerOptions},
    coordinator::flight::{FlightControl, FlightGuard},
    coordinator::state_machine::{warning_message, Action, PendingRequest, RequestState, StageEvent},
    error::PickerError,
    export::{ExportPipeline, ExportResult},
    library::MediaLibrary,
    localization::Localizer,
    permission::PermissionGate,
    picker::{AssetHandle, MediaPicker, SelectionMode},
    temp_store::TempScope,
};
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct RequestCoordinator {
    config: BridgeConfig,
    gate: Arc<PermissionGate>,
    picker: Arc<dyn MediaPicker>,
    pipeline: Arc<ExportPipeline>,
    sink: Arc<dyn ResponseSink>,
    localizer: Arc<dyn Localizer>,
    flight: Arc<FlightControl>,
    export_permits: Arc<Semaphore>,
}

impl RequestCoordinator {
    pub fn new(
        config: BridgeConfig,
        gate: Arc<PermissionGate>,
        picker: Arc<dyn MediaPicker>,
        library: Arc<dyn MediaLibrary>,
        sink: Arc<dyn ResponseSink>,
        localizer: Arc<dyn Localizer>,
    ) -> Self {
        let pipeline = Arc::new(ExportPipeline::from_config(library, &config));
        let export_permits = Arc::new(Semaphore::new(config.workers.max(1)));

        Self {
            config,
            gate,
            picker,
            pipeline,
            sink,
            localizer,
            flight: FlightControl::new(),
            export_permits,
        }
    }

    pub fn permission_gate(&self) -> &Arc<PermissionGate> {
        &self.gate
    }

    pub fn localizer(&self) -> &Arc<dyn Localizer> {
        &self.localizer
    }

    pub fn sink(&self) -> &Arc<dyn ResponseSink> {
        &self.sink
    }

    pub fn state(&self) -> RequestState {
        self.flight.state()
    }

    /// Stream of state changes of the live request
    pub fn watch_state(&self) -> watch::Receiver<RequestState> {
        self.flight.subscribe()
    }

    /// Attende che nessuna richiesta sia attiva
    pub async fn wait_until_idle(&self) {
        let mut state = self.watch_state();
        let _ = state.wait_for(|state| *state == RequestState::Idle).await;
    }

    /// Chiude il picker se è in attesa di selezione; la richiesta termina come cancel
    pub fn close_picker(&self) -> bool {
        if self.state() != RequestState::AwaitingSelection {
            debug!("closePicker ignored while {:?}", self.state());
            return false;
        }
        info!("Dismissing picker");
        self.picker.dismiss();
        true
    }

    /// Avvia una richiesta media.
    ///
    /// I rifiuti sincroni (opzioni non valide, richiesta già in corso, scope
    /// temporaneo non creabile) sono restituiti come `Err` e non toccano la
    /// richiesta attiva; altrimenti la risposta arriva al sink con `token`.
    pub fn submit(&self, token: CorrelationToken, options: &Value) -> Result<JoinHandle<()>, PickerError> {
        let options = PickerOptions::from_json(options)?;
        let constraints = ConstraintConfig::parse(&options)?;
        let mode = options.selection_mode(self.config.default_max_images)?;

        let flight = self.flight.claim(token.clone())?;

        let scope = match constraints.output_type {
            OutputType::FileUri => Some(Arc::new(TempScope::create(self.config.temp_root.as_deref())?)),
            OutputType::Base64 => None,
        };

        info!(
            "🚀 Request {} started ({:?}, max {} items)",
            token, constraints.output_type, mode.max_items
        );

        let driver = RequestDriver {
            machine: PendingRequest::new(mode),
            constraints,
            responder: Responder::new(token, self.sink.clone(), self.localizer.clone()),
            scope,
            flight,
            gate: self.gate.clone(),
            picker: self.picker.clone(),
            pipeline: self.pipeline.clone(),
            localizer: self.localizer.clone(),
            export_permits: self.export_permits.clone(),
        };

        Ok(tokio::spawn(driver.run()))
    }
}

/// Consegna al più una risposta; se viene droppato senza averla inviata
/// notifica `Aborted`, così l'host riceve sempre un messaggio terminale
struct Responder {
    token: CorrelationToken,
    sink: Arc<dyn ResponseSink>,
    localizer: Arc<dyn Localizer>,
    delivered: bool,
}

impl Responder {
    fn new(token: CorrelationToken, sink: Arc<dyn ResponseSink>, localizer: Arc<dyn Localizer>) -> Self {
        Self {
            token,
            sink,
            localizer,
            delivered: false,
        }
    }

    fn deliver(&mut self, message: BridgeMessage) {
        if self.delivered {
            warn!("Response for {} already delivered, dropping {:?}", self.token, message);
            return;
        }
        self.delivered = true;
        self.sink.deliver(&self.token, message);
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if !self.delivered {
            warn!("Request {} ended without a response", self.token);
            let error = PickerError::Aborted("request dropped before completion".to_string());
            let message = BridgeMessage::error(&error, self.localizer.as_ref());
            self.deliver(message);
        }
    }
}

/// Task che possiede la richiesta attiva.
///
/// I campi vengono droppati in ordine di dichiarazione: prima l'eventuale
/// risposta `Aborted`, poi lo scope temporaneo, infine lo slot single-flight.
struct RequestDriver {
    machine: PendingRequest,
    constraints: ConstraintConfig,
    responder: Responder,
    scope: Option<Arc<TempScope>>,
    flight: FlightGuard,
    gate: Arc<PermissionGate>,
    picker: Arc<dyn MediaPicker>,
    pipeline: Arc<ExportPipeline>,
    localizer: Arc<dyn Localizer>,
    export_permits: Arc<Semaphore>,
}

impl RequestDriver {
    async fn run(mut self) {
        let mut action = self.machine.start();

        loop {
            self.flight.set_state(self.machine.state());

            let (events, mut inbox) = mpsc::unbounded_channel();
            match action {
                Action::RequestPermission => self.request_permission(events),
                Action::PresentPicker(mode) => self.present_picker(mode, events),
                Action::Export(assets) => self.export(assets, events),
                Action::Respond(response) => {
                    self.finish(response);
                    return;
                }
            }

            action = loop {
                match inbox.recv().await {
                    Some(event) => {
                        if let Some(next) = self.machine.handle(event) {
                            break next;
                        }
                    }
                    None => {
                        warn!(
                            "Stage {:?} of {} stopped without reporting",
                            self.machine.state(),
                            self.flight.token()
                        );
                        break self.machine.abort("a request stage stopped unexpectedly");
                    }
                }
            };
        }
    }

    fn request_permission(&self, events: mpsc::UnboundedSender<StageEvent>) {
        let gate = self.gate.clone();
        tokio::spawn(async move {
            let permission = gate.request_read_permission().await;
            let _ = events.send(StageEvent::Permission(permission));
        });
    }

    fn present_picker(&self, mode: SelectionMode, events: mpsc::UnboundedSender<StageEvent>) {
        let picker = self.picker.clone();
        tokio::spawn(async move {
            let outcome = picker.present(mode).await;
            let _ = events.send(StageEvent::Selection(outcome));
        });
    }

    /// Fan-out: un task per asset, concorrenza limitata dal semaforo.
    /// I risultati arrivano in ordine di completamento con l'indice di selezione.
    fn export(&self, assets: Vec<AssetHandle>, events: mpsc::UnboundedSender<StageEvent>) {
        let mut tasks = FuturesUnordered::new();

        for (index, asset) in assets.into_iter().enumerate() {
            let pipeline = self.pipeline.clone();
            let permits = self.export_permits.clone();
            let scope = self.scope.clone();
            let constraints = self.constraints;
            let source = asset.clone();

            let handle = tokio::spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                pipeline.export(&source, &constraints, scope.as_deref()).await
            });

            tasks.push(async move { (index, asset, handle.await) });
        }

        tokio::spawn(async move {
            while let Some((index, asset, joined)) = tasks.next().await {
                let result = match joined {
                    Ok(result) => result,
                    Err(e) => {
                        warn!("Export task for {} failed: {}", asset.id, e);
                        ExportResult::encode_failed(asset, format!("export task failed: {}", e))
                    }
                };
                if events.send(StageEvent::Exported { index, result }).is_err() {
                    break;
                }
            }
        });
    }

    fn finish(&mut self, response: Result<MediaResponse, PickerError>) {
        let message = match response {
            Ok(mut response) => {
                response.message = warning_message(&response, self.localizer.as_ref());
                info!(
                    "✅ Request {} completed with {} results",
                    self.flight.token(),
                    response.results.len()
                );
                BridgeMessage::Success(response)
            }
            Err(e) => {
                warn!("Request {} failed: {}", self.flight.token(), e);
                BridgeMessage::error(&e, self.localizer.as_ref())
            }
        };
        self.responder.deliver(message);

        if let Some(scope) = self.scope.take() {
            match Arc::try_unwrap(scope) {
                Ok(scope) => scope.release(),
                Err(_) => warn!("Temp scope still shared, it will be removed on last drop"),
            }
        }
    }
}
