use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Device access failures reported by a [`crate::capture::CaptureDevice`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("camera unavailable: {0}")]
    Unavailable(String),

    /// The access request was overtaken by `stop()` or a newer `start()`.
    #[error("camera request cancelled")]
    Cancelled,
}

/// Every failure the capture-and-invoke pipeline can surface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("capture failed: {0}")]
    Capture(String),

    #[error("contract violation: {0}")]
    Validation(String),

    #[error("inference engine failed: {0}")]
    Engine(String),

    #[error("an analysis is already in flight for this session")]
    Busy,
}

impl FlowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlowError::Device(_) => ErrorKind::Device,
            FlowError::Capture(_) => ErrorKind::Capture,
            FlowError::Validation(_) => ErrorKind::Validation,
            FlowError::Engine(_) => ErrorKind::Engine,
            FlowError::Busy => ErrorKind::Busy,
        }
    }

    /// Whether the user can reasonably retry the same action.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FlowError::Validation(_))
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        FlowError::Validation(message.into())
    }
}

/// Discriminant carried by [`crate::presenter::ViewModel::Failed`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Device,
    Capture,
    Validation,
    Engine,
    Busy,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Device => "DeviceError",
            ErrorKind::Capture => "CaptureError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Engine => "EngineError",
            ErrorKind::Busy => "Busy",
        }
    }
}

pub type FlowResult<T> = std::result::Result<T, FlowError>;
