use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{watch, Mutex};

use crate::{
    capture::{CaptureController, CaptureDevice, CaptureSession, StartStep},
    contract::{AnalysisKind, InferenceContract},
    error::{DeviceError, FlowError, FlowResult},
    flow::{AnalysisRequest, FlowInvoker, InferenceEngine},
    presenter::{failed, ResultPresenter, TaggedOutcome, ViewModel},
    settings::Settings,
};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "wellcam::session";

use crate::{log_debug, log_info, log_warn};

/// What `analyze` did with the engine's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    Rendered(ViewModel),
    /// The session moved on (stop, or stop + start) while the call was out.
    Discarded {
        generation: u64,
        live_generation: Option<u64>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub kind: AnalysisKind,
    pub capture: CaptureSession,
    pub view: Option<ViewModel>,
    pub analyzing: bool,
}

/// Capture-and-invoke state machine for one analysis kind.
///
/// Cheap to clone; clones share the same camera, presenter and in-flight flag.
/// Lock order is always capture, then presenter.
pub struct FeatureSession<D: CaptureDevice> {
    contract: Arc<InferenceContract>,
    capture: Arc<Mutex<CaptureController<D>>>,
    invoker: FlowInvoker,
    presenter: Arc<Mutex<ResultPresenter>>,
    in_flight: Arc<AtomicBool>,
    view_tx: Arc<watch::Sender<Option<ViewModel>>>,
}

impl<D: CaptureDevice> Clone for FeatureSession<D> {
    fn clone(&self) -> Self {
        Self {
            contract: Arc::clone(&self.contract),
            capture: Arc::clone(&self.capture),
            invoker: self.invoker.clone(),
            presenter: Arc::clone(&self.presenter),
            in_flight: Arc::clone(&self.in_flight),
            view_tx: Arc::clone(&self.view_tx),
        }
    }
}

impl<D: CaptureDevice> FeatureSession<D> {
    pub fn new(
        contract: InferenceContract,
        device: Arc<D>,
        engine: Arc<dyn InferenceEngine>,
        settings: &Settings,
    ) -> Self {
        let (view_tx, _) = watch::channel(None);
        Self {
            contract: Arc::new(contract),
            capture: Arc::new(Mutex::new(CaptureController::new(device))),
            invoker: FlowInvoker::new(engine, settings.engine_timeout()),
            presenter: Arc::new(Mutex::new(ResultPresenter::new())),
            in_flight: Arc::new(AtomicBool::new(false)),
            view_tx: Arc::new(view_tx),
        }
    }

    /// Session using the built-in contract for `kind` plus settings overrides.
    pub fn for_kind(
        kind: AnalysisKind,
        device: Arc<D>,
        engine: Arc<dyn InferenceEngine>,
        settings: &Settings,
    ) -> Self {
        Self::new(settings.contract_for(kind), device, engine, settings)
    }

    pub fn kind(&self) -> AnalysisKind {
        self.contract.kind
    }

    pub fn contract(&self) -> &InferenceContract {
        &self.contract
    }

    /// View model updates for the UI. `None` means nothing to show.
    pub fn subscribe(&self) -> watch::Receiver<Option<ViewModel>> {
        self.view_tx.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let capture = self.capture.lock().await;
        let presenter = self.presenter.lock().await;
        SessionSnapshot {
            kind: self.contract.kind,
            capture: capture.session().clone(),
            view: presenter.current().cloned(),
            analyzing: self.in_flight.load(Ordering::Acquire),
        }
    }

    /// Open the camera. A no-op returning the current generation when
    /// already streaming; a denial is rendered as a device failure.
    ///
    /// The capture lock is not held while the device prompt is up, so
    /// `stop()` returns immediately during `Requesting`. A start overtaken
    /// that way fails with `DeviceError::Cancelled` and renders nothing.
    pub async fn start(&self) -> FlowResult<u64> {
        let ticket = match self.capture.lock().await.begin_start() {
            StartStep::Live(generation) => return Ok(generation),
            StartStep::Request(ticket) => ticket,
        };

        let granted = ticket.request().await;

        let mut capture = self.capture.lock().await;
        match capture.finish_start(&ticket, granted) {
            Ok(generation) => {
                let mut presenter = self.presenter.lock().await;
                presenter.clear();
                self.view_tx.send_replace(None);
                log_info!("{} session streaming, generation {generation}", self.kind());
                Ok(generation)
            }
            Err(DeviceError::Cancelled) => {
                log_debug!("{} start cancelled while waiting for the camera", self.kind());
                Err(DeviceError::Cancelled.into())
            }
            Err(err) => {
                let err = FlowError::from(err);
                let mut presenter = self.presenter.lock().await;
                let view = presenter.show(failed(&err)).clone();
                self.view_tx.send_replace(Some(view));
                Err(err)
            }
        }
    }

    /// Capture one frame and run it through the engine.
    ///
    /// A second call while one is outstanding is rejected with
    /// [`FlowError::Busy`] and changes nothing. Capture, validation and engine
    /// failures are rendered as `ViewModel::Failed` and also returned as `Err`.
    pub async fn analyze(&self, options: Option<Value>) -> FlowResult<Presentation> {
        let _in_flight = InFlightGuard::acquire(&self.in_flight).ok_or_else(|| {
            log_debug!("{} analysis rejected, one is already in flight", self.kind());
            FlowError::Busy
        })?;

        let (frame, generation) = {
            let mut capture = self.capture.lock().await;
            match capture.capture() {
                Ok(frame) => (frame, capture.generation()),
                Err(err) => {
                    let mut presenter = self.presenter.lock().await;
                    let view = presenter.show(failed(&err)).clone();
                    self.view_tx.send_replace(Some(view));
                    return Err(err);
                }
            }
        };

        let request = AnalysisRequest {
            kind: self.contract.kind,
            frame,
            options,
        };
        let outcome = self.invoker.invoke(&self.contract, &request).await;
        drop(request);

        let tagged = TaggedOutcome {
            generation,
            outcome,
        };

        let capture = self.capture.lock().await;
        let live_generation = capture.live_generation();
        let mut presenter = self.presenter.lock().await;

        let Some(view) = presenter.accept(&tagged, live_generation).cloned() else {
            log_warn!(
                "{} result for generation {generation} discarded (live: {live_generation:?})",
                self.kind()
            );
            return Ok(Presentation::Discarded {
                generation,
                live_generation,
            });
        };
        self.view_tx.send_replace(Some(view.clone()));
        drop(presenter);
        drop(capture);

        match tagged.outcome {
            Ok(_) => Ok(Presentation::Rendered(view)),
            Err(err) => Err(err),
        }
    }

    /// Release the camera, invalidate the generation and clear the view.
    /// Safe while `analyze` or a device request is outstanding.
    pub async fn stop(&self) {
        let mut capture = self.capture.lock().await;
        capture.stop();
        let mut presenter = self.presenter.lock().await;
        presenter.clear();
        self.view_tx.send_replace(None);
    }
}

/// Marks an analysis as outstanding until dropped.
struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
