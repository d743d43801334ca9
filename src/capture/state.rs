use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DeviceError;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CaptureState {
    #[default]
    Idle,
    Requesting,
    Streaming,
    Capturing,
    Stopped,
    Failed,
}

impl CaptureState {
    pub fn can_start(&self) -> bool {
        matches!(
            self,
            CaptureState::Idle | CaptureState::Stopped | CaptureState::Failed
        )
    }

    /// A device handle is held in these states.
    pub fn is_live(&self) -> bool {
        matches!(self, CaptureState::Streaming | CaptureState::Capturing)
    }
}

/// Serializable view of one capture session; the device lease itself lives
/// in the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSession {
    pub state: CaptureState,
    pub generation: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// Set while `Streaming`/`Capturing`, cleared by `stop()` and failures.
    #[serde(skip)]
    pub(crate) live: bool,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self {
            state: CaptureState::Idle,
            generation: 0,
            started_at: None,
            last_error: None,
            live: false,
        }
    }
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation whose results may still be rendered, if any.
    pub fn live_generation(&self) -> Option<u64> {
        if self.live && self.state.is_live() {
            Some(self.generation)
        } else {
            None
        }
    }

    pub(crate) fn begin_request(&mut self) {
        self.state = CaptureState::Requesting;
        self.last_error = None;
    }

    pub(crate) fn begin_stream(&mut self, now: DateTime<Utc>) {
        self.generation = self.generation.wrapping_add(1);
        self.state = CaptureState::Streaming;
        self.started_at = Some(now);
        self.live = true;
    }

    pub(crate) fn fail(&mut self, err: &DeviceError) {
        self.state = CaptureState::Failed;
        self.last_error = Some(err.to_string());
        self.live = false;
    }

    pub(crate) fn stop(&mut self) {
        self.state = CaptureState::Stopped;
        self.started_at = None;
        self.live = false;
    }
}
