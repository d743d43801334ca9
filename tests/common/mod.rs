#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use wellcam::{
    AnalysisKind, CaptureDevice, DeviceError, DeviceHandle, EngineRequest, FeatureSession,
    InferenceEngine, RawFrame, Settings,
};

#[derive(Default)]
pub struct FakeCamera {
    pub deny: AtomicBool,
    pub disconnected: AtomicBool,
    /// Keep `request_access` waiting until `answer` is notified, like an
    /// unanswered permission prompt.
    pub hold_prompt: AtomicBool,
    pub prompted: Notify,
    pub answer: Notify,
    next_handle: AtomicU64,
    pub released: Mutex<Vec<DeviceHandle>>,
}

#[async_trait]
impl CaptureDevice for FakeCamera {
    async fn request_access(&self) -> Result<DeviceHandle, DeviceError> {
        self.prompted.notify_one();
        if self.hold_prompt.load(Ordering::SeqCst) {
            self.answer.notified().await;
        }
        if self.deny.load(Ordering::SeqCst) {
            return Err(DeviceError::PermissionDenied("NotAllowedError".into()));
        }
        Ok(DeviceHandle(self.next_handle.fetch_add(1, Ordering::SeqCst)))
    }

    fn release_access(&self, handle: DeviceHandle) {
        self.released.lock().unwrap().push(handle);
    }

    fn read_frame(&self, _handle: &DeviceHandle) -> Option<RawFrame> {
        if self.disconnected.load(Ordering::SeqCst) {
            return None;
        }
        Some(RawFrame::new(16, 12, vec![90; 16 * 12 * 4]))
    }
}

pub enum Reply {
    Json(Value),
    Fail(String),
    /// Never answers; exercises the timeout.
    Hang,
    /// Answers once `release` is notified.
    Gated(Value),
}

#[derive(Default)]
pub struct ScriptedEngine {
    replies: Mutex<VecDeque<Reply>>,
    pub requests: Mutex<Vec<EngineRequest>>,
    pub entered: Notify,
    pub release: Notify,
}

impl ScriptedEngine {
    pub fn with(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl InferenceEngine for ScriptedEngine {
    async fn call(&self, request: EngineRequest) -> anyhow::Result<Value> {
        self.requests.lock().unwrap().push(request);
        let reply = self.replies.lock().unwrap().pop_front();
        self.entered.notify_one();

        match reply {
            Some(Reply::Json(value)) => Ok(value),
            Some(Reply::Fail(message)) => Err(anyhow!(message)),
            Some(Reply::Hang) => std::future::pending().await,
            Some(Reply::Gated(value)) => {
                self.release.notified().await;
                Ok(value)
            }
            None => Err(anyhow!("no scripted reply left")),
        }
    }
}

pub fn session(
    kind: AnalysisKind,
    engine: Arc<ScriptedEngine>,
) -> (FeatureSession<FakeCamera>, Arc<FakeCamera>) {
    session_with(kind, engine, &Settings::default())
}

pub fn session_with(
    kind: AnalysisKind,
    engine: Arc<ScriptedEngine>,
    settings: &Settings,
) -> (FeatureSession<FakeCamera>, Arc<FakeCamera>) {
    let camera = Arc::new(FakeCamera::default());
    let session = FeatureSession::for_kind(kind, Arc::clone(&camera), engine, settings);
    (session, camera)
}
