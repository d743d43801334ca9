use std::sync::Arc;

use serde_json::Value;
use tokio::time::{Duration, Instant};
use uuid::Uuid;

use crate::contract::{AnalysisResult, InferenceContract};
use crate::error::{FlowError, FlowResult};

use super::engine::{EngineRequest, InferenceEngine};
use super::AnalysisRequest;

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "wellcam::flow";

use crate::{log_debug, log_info, log_warn};

/// Turns a captured frame into a contract-checked [`AnalysisResult`].
#[derive(Clone)]
pub struct FlowInvoker {
    engine: Arc<dyn InferenceEngine>,
    timeout: Duration,
}

impl FlowInvoker {
    pub fn new(engine: Arc<dyn InferenceEngine>, timeout: Duration) -> Self {
        Self { engine, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn invoke(
        &self,
        contract: &InferenceContract,
        request: &AnalysisRequest,
    ) -> FlowResult<AnalysisResult> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();

        let engine_request = self.build_request(contract, request)?;
        log_debug!(
            "[{request_id}] {} request, frame captured at {}",
            engine_request.flow_name(),
            request.frame.captured_at()
        );

        let raw = call_engine(self.engine.as_ref(), engine_request, self.timeout)
            .await
            .map_err(|err| {
                log_warn!("[{request_id}] {} engine call failed: {err}", contract.kind);
                err
            })?;

        let result = enforce_contract(contract, &raw).map_err(|err| {
            log_warn!("[{request_id}] {} response rejected: {err}", contract.kind);
            err
        })?;

        log_info!(
            "[{request_id}] {} completed in {}ms (relevant: {})",
            contract.kind,
            started.elapsed().as_millis(),
            result.relevant()
        );
        Ok(result)
    }

    fn build_request(
        &self,
        contract: &InferenceContract,
        request: &AnalysisRequest,
    ) -> FlowResult<EngineRequest> {
        if request.kind != contract.kind {
            return Err(FlowError::validation(format!(
                "{} request sent through the {} contract",
                request.kind, contract.kind
            )));
        }

        contract.validate_input(request.frame.data_uri())?;

        if let Some(options) = &request.options {
            if !options.is_object() {
                return Err(FlowError::validation("options must be a JSON object"));
            }
        }

        Ok(EngineRequest::Analyze {
            kind: request.kind,
            photo_data_uri: request.frame.data_uri().to_string(),
            options: request.options.clone(),
        })
    }
}

/// Engine call bounded by `timeout`; every failure becomes `FlowError::Engine`.
pub(crate) async fn call_engine(
    engine: &dyn InferenceEngine,
    request: EngineRequest,
    timeout: Duration,
) -> FlowResult<Value> {
    match tokio::time::timeout(timeout, engine.call(request)).await {
        Ok(Ok(raw)) => Ok(raw),
        Ok(Err(err)) => Err(FlowError::Engine(format!("{err:#}"))),
        Err(_) => Err(FlowError::Engine(format!(
            "no response within {}ms",
            timeout.as_millis()
        ))),
    }
}

/// Output validation, fixed-field overwrite, then the relevance gate.
pub fn enforce_contract(contract: &InferenceContract, raw: &Value) -> FlowResult<AnalysisResult> {
    let mut fields = contract.normalize_output(raw)?;
    contract.apply_fixed(&mut fields);
    contract.classify(&fields)
}
