pub mod engine;
pub mod invoker;

use serde_json::Value;

use crate::capture::ImageFrame;
use crate::contract::AnalysisKind;

pub use engine::{EngineRequest, InferenceEngine};
pub use invoker::{enforce_contract, FlowInvoker};

/// One frame headed for the engine, with optional kind-specific preferences.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub kind: AnalysisKind,
    pub frame: ImageFrame,
    pub options: Option<Value>,
}

impl AnalysisRequest {
    pub fn new(kind: AnalysisKind, frame: ImageFrame) -> Self {
        Self {
            kind,
            frame,
            options: None,
        }
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }
}
