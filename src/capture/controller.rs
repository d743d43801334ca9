use std::sync::Arc;

use chrono::Utc;

use crate::error::{DeviceError, FlowError, FlowResult};

use super::{
    device::{CaptureDevice, DeviceHandle, DeviceLease},
    frame::ImageFrame,
    state::{CaptureSession, CaptureState},
};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "wellcam::capture";

use crate::{log_debug, log_info, log_warn};

/// Owns one live video device and hands out still frames from it.
pub struct CaptureController<D: CaptureDevice> {
    device: Arc<D>,
    session: CaptureSession,
    lease: Option<DeviceLease<D>>,
    next_request: u64,
    /// Ticket of the access request whose answer is still wanted.
    pending_request: Option<u64>,
}

/// What `begin_start` decided.
pub enum StartStep<D: CaptureDevice> {
    /// Already streaming under this generation.
    Live(u64),
    Request(AccessTicket<D>),
}

/// One outstanding device access request.
pub struct AccessTicket<D: CaptureDevice> {
    request: u64,
    device: Arc<D>,
}

impl<D: CaptureDevice> AccessTicket<D> {
    /// Ask the device. May suspend for as long as the permission prompt is up.
    pub async fn request(&self) -> Result<DeviceHandle, DeviceError> {
        self.device.request_access().await
    }
}

impl<D: CaptureDevice> CaptureController<D> {
    pub fn new(device: Arc<D>) -> Self {
        Self {
            device,
            session: CaptureSession::new(),
            lease: None,
            next_request: 0,
            pending_request: None,
        }
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn state(&self) -> CaptureState {
        self.session.state
    }

    pub fn generation(&self) -> u64 {
        self.session.generation
    }

    pub fn live_generation(&self) -> Option<u64> {
        self.session.live_generation()
    }

    /// Request the device and begin streaming. Returns the new generation.
    ///
    /// Already streaming: no-op, generation unchanged.
    pub async fn start(&mut self) -> Result<u64, DeviceError> {
        match self.begin_start() {
            StartStep::Live(generation) => Ok(generation),
            StartStep::Request(ticket) => {
                let granted = ticket.request().await;
                self.finish_start(&ticket, granted)
            }
        }
    }

    /// First half of `start`: enter `Requesting` and hand out a ticket for
    /// the device request. The caller awaits the ticket without holding the
    /// controller, so `stop()` can run while the permission prompt is up.
    pub fn begin_start(&mut self) -> StartStep<D> {
        if self.session.state.is_live() {
            log_debug!(
                "start ignored, already streaming (generation {})",
                self.session.generation
            );
            return StartStep::Live(self.session.generation);
        }

        // Any earlier request still outstanding is superseded by this one.
        self.release_lease();
        self.session.begin_request();
        self.next_request += 1;
        self.pending_request = Some(self.next_request);

        StartStep::Request(AccessTicket {
            request: self.next_request,
            device: Arc::clone(&self.device),
        })
    }

    /// Second half of `start`. A grant for a ticket that `stop()` or a newer
    /// `start()` has invalidated is released on the spot and reported as
    /// [`DeviceError::Cancelled`]; the session is left untouched.
    pub fn finish_start(
        &mut self,
        ticket: &AccessTicket<D>,
        granted: Result<DeviceHandle, DeviceError>,
    ) -> Result<u64, DeviceError> {
        if self.pending_request != Some(ticket.request) {
            if let Ok(handle) = granted {
                log_info!("camera granted after the request was cancelled, releasing {handle:?}");
                drop(DeviceLease::new(Arc::clone(&self.device), handle));
            }
            return Err(DeviceError::Cancelled);
        }
        self.pending_request = None;

        match granted {
            Ok(handle) => {
                self.lease = Some(DeviceLease::new(Arc::clone(&self.device), handle));
                self.session.begin_stream(Utc::now());
                log_info!(
                    "camera streaming (handle {:?}, generation {})",
                    handle,
                    self.session.generation
                );
                Ok(self.session.generation)
            }
            Err(err) => {
                log_warn!("camera access failed: {err}");
                self.session.fail(&err);
                Err(err)
            }
        }
    }

    /// Produce one frame from the live buffer. Only valid while streaming;
    /// on failure the session stays as it was.
    pub fn capture(&mut self) -> FlowResult<ImageFrame> {
        if self.session.state != CaptureState::Streaming {
            return Err(FlowError::Capture(format!(
                "camera is not streaming (state: {:?})",
                self.session.state
            )));
        }

        self.session.state = CaptureState::Capturing;
        let result = self
            .lease
            .as_ref()
            .and_then(DeviceLease::read_frame)
            .ok_or_else(|| FlowError::Capture("no frame available from the camera".into()))
            .and_then(|raw| ImageFrame::encode_jpeg(&raw, Utc::now()));
        self.session.state = CaptureState::Streaming;

        match &result {
            Ok(frame) => log_debug!(
                "captured frame ({} bytes encoded, generation {})",
                frame.encoded_len(),
                self.session.generation
            ),
            Err(err) => log_warn!("capture failed: {err}"),
        }

        result
    }

    /// Release the device from any state and invalidate the live generation.
    pub fn stop(&mut self) {
        let had_device = self.lease.is_some();
        if self.pending_request.take().is_some() {
            log_info!("camera request cancelled before it was answered");
        }
        self.release_lease();
        self.session.stop();
        if had_device {
            log_info!(
                "camera stopped (generation {} invalidated)",
                self.session.generation
            );
        }
    }

    fn release_lease(&mut self) {
        if let Some(mut lease) = self.lease.take() {
            lease.release();
        }
    }
}

impl<D: CaptureDevice> Drop for CaptureController<D> {
    fn drop(&mut self) {
        self.release_lease();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::capture::RawFrame;

    #[derive(Default)]
    struct TestDevice {
        deny: AtomicBool,
        disconnected: AtomicBool,
        next_handle: AtomicU64,
        released: Mutex<Vec<DeviceHandle>>,
        grants: AtomicU64,
    }

    #[async_trait]
    impl CaptureDevice for TestDevice {
        async fn request_access(&self) -> Result<DeviceHandle, DeviceError> {
            if self.deny.load(Ordering::SeqCst) {
                return Err(DeviceError::PermissionDenied("denied in test".into()));
            }
            self.grants.fetch_add(1, Ordering::SeqCst);
            Ok(DeviceHandle(self.next_handle.fetch_add(1, Ordering::SeqCst)))
        }

        fn release_access(&self, handle: DeviceHandle) {
            self.released.lock().unwrap().push(handle);
        }

        fn read_frame(&self, _handle: &DeviceHandle) -> Option<RawFrame> {
            if self.disconnected.load(Ordering::SeqCst) {
                None
            } else {
                Some(RawFrame::new(4, 4, vec![200; 64]))
            }
        }
    }

    #[tokio::test]
    async fn start_capture_stop_cycle() {
        let device = Arc::new(TestDevice::default());
        let mut controller = CaptureController::new(Arc::clone(&device));

        assert_eq!(controller.start().await.unwrap(), 1);
        assert_eq!(controller.state(), CaptureState::Streaming);

        let frame = controller.capture().unwrap();
        assert!(frame.data_uri().starts_with("data:image/jpeg;base64,"));
        assert_eq!(controller.state(), CaptureState::Streaming);

        controller.stop();
        assert_eq!(controller.state(), CaptureState::Stopped);
        assert_eq!(controller.live_generation(), None);
        assert_eq!(device.released.lock().unwrap().as_slice(), &[DeviceHandle(0)]);
    }

    #[tokio::test]
    async fn second_start_while_streaming_is_noop() {
        let device = Arc::new(TestDevice::default());
        let mut controller = CaptureController::new(Arc::clone(&device));

        controller.start().await.unwrap();
        controller.start().await.unwrap();

        assert_eq!(controller.generation(), 1);
        assert_eq!(controller.state(), CaptureState::Streaming);
        assert_eq!(device.grants.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn capture_while_idle_is_capture_error() {
        let mut controller = CaptureController::new(Arc::new(TestDevice::default()));
        let err = controller.capture().unwrap_err();
        assert!(matches!(err, FlowError::Capture(_)));
        assert_eq!(controller.state(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn disconnected_device_keeps_streaming() {
        let device = Arc::new(TestDevice::default());
        let mut controller = CaptureController::new(Arc::clone(&device));
        controller.start().await.unwrap();

        device.disconnected.store(true, Ordering::SeqCst);
        assert!(matches!(controller.capture(), Err(FlowError::Capture(_))));
        assert_eq!(controller.state(), CaptureState::Streaming);

        device.disconnected.store(false, Ordering::SeqCst);
        assert!(controller.capture().is_ok());
    }

    #[tokio::test]
    async fn denied_access_fails_then_recovers() {
        let device = Arc::new(TestDevice::default());
        device.deny.store(true, Ordering::SeqCst);
        let mut controller = CaptureController::new(Arc::clone(&device));

        let err = controller.start().await.unwrap_err();
        assert!(matches!(err, DeviceError::PermissionDenied(_)));
        assert_eq!(controller.state(), CaptureState::Failed);
        assert_eq!(controller.generation(), 0);

        device.deny.store(false, Ordering::SeqCst);
        assert_eq!(controller.start().await.unwrap(), 1);
        assert_eq!(controller.state(), CaptureState::Streaming);
    }

    #[tokio::test]
    async fn dropping_controller_releases_device() {
        let device = Arc::new(TestDevice::default());
        {
            let mut controller = CaptureController::new(Arc::clone(&device));
            controller.start().await.unwrap();
        }
        assert_eq!(device.released.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stop_from_idle_is_harmless() {
        let device = Arc::new(TestDevice::default());
        let mut controller = CaptureController::new(Arc::clone(&device));
        controller.stop();
        assert_eq!(controller.state(), CaptureState::Stopped);
        assert!(device.released.lock().unwrap().is_empty());
        assert!(controller.state().can_start());
    }

    #[tokio::test]
    async fn stop_while_requesting_releases_late_grant() {
        let device = Arc::new(TestDevice::default());
        let mut controller = CaptureController::new(Arc::clone(&device));

        let StartStep::Request(ticket) = controller.begin_start() else {
            panic!("idle controller must request access");
        };
        assert_eq!(controller.state(), CaptureState::Requesting);

        controller.stop();
        assert_eq!(controller.state(), CaptureState::Stopped);

        let granted = ticket.request().await;
        let err = controller.finish_start(&ticket, granted).unwrap_err();
        assert_eq!(err, DeviceError::Cancelled);
        assert_eq!(controller.state(), CaptureState::Stopped);
        assert_eq!(controller.generation(), 0);
        assert_eq!(device.released.lock().unwrap().as_slice(), &[DeviceHandle(0)]);
    }

    #[tokio::test]
    async fn newer_start_supersedes_pending_request() {
        let device = Arc::new(TestDevice::default());
        let mut controller = CaptureController::new(Arc::clone(&device));

        let StartStep::Request(first) = controller.begin_start() else {
            panic!("idle controller must request access");
        };
        let StartStep::Request(second) = controller.begin_start() else {
            panic!("requesting controller must request again");
        };

        let late = first.request().await;
        assert_eq!(
            controller.finish_start(&first, late).unwrap_err(),
            DeviceError::Cancelled
        );
        let granted = second.request().await;
        assert_eq!(controller.finish_start(&second, granted).unwrap(), 1);
        assert_eq!(controller.state(), CaptureState::Streaming);
        assert_eq!(device.released.lock().unwrap().as_slice(), &[DeviceHandle(0)]);
    }

    #[tokio::test]
    async fn denial_after_stop_does_not_fail_session() {
        let device = Arc::new(TestDevice::default());
        device.deny.store(true, Ordering::SeqCst);
        let mut controller = CaptureController::new(Arc::clone(&device));

        let StartStep::Request(ticket) = controller.begin_start() else {
            panic!("idle controller must request access");
        };
        controller.stop();
        let denied = ticket.request().await;
        assert_eq!(
            controller.finish_start(&ticket, denied).unwrap_err(),
            DeviceError::Cancelled
        );
        assert_eq!(controller.state(), CaptureState::Stopped);
        assert_eq!(controller.session().last_error, None);
    }
}
