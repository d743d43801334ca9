//! Camera-driven inference flows.
//!
//! Each feature (stress, posture, sign language, object spelling, wellness
//! observation) captures a still frame, sends it to an opaque inference
//! engine under a per-kind contract, and renders a detected, undetected or
//! failed view model. [`FeatureSession`] is the one state machine all five
//! share; [`InferenceContract`] is what makes them differ.

pub mod boosters;
pub mod capture;
pub mod contract;
pub mod error;
pub mod flow;
pub mod presenter;
pub mod session;
pub mod settings;
pub mod utils;

pub use boosters::{suggest_mood_boosters, BoosterKind, MoodBooster};
pub use capture::{
    CaptureController, CaptureDevice, CaptureSession, CaptureState, DeviceHandle, ImageFrame,
    RawFrame,
};
pub use contract::{
    AnalysisKind, AnalysisResult, InferenceContract, Payload, ScorePolicy, StressLevel,
    WELLNESS_DISCLAIMER,
};
pub use error::{DeviceError, ErrorKind, FlowError, FlowResult};
pub use flow::{AnalysisRequest, EngineRequest, FlowInvoker, InferenceEngine};
pub use presenter::{present, ResultPresenter, TaggedOutcome, ViewModel};
pub use session::{FeatureSession, Presentation, SessionSnapshot};
pub use settings::{Settings, SettingsStore};
pub use utils::logging::init_logging;
