use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DeviceError;

use super::frame::RawFrame;

/// Opaque token a device hands out when access is granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(pub u64);

/// The camera driver seen from the capture controller.
#[async_trait]
pub trait CaptureDevice: Send + Sync + 'static {
    /// Ask for access to the video feed. May suspend on a permission prompt.
    async fn request_access(&self) -> Result<DeviceHandle, DeviceError>;

    /// Give the handle back. Must tolerate being called for a handle that the
    /// driver already considers gone.
    fn release_access(&self, handle: DeviceHandle);

    /// Latest buffer from the live feed, `None` if nothing is available
    /// (device disconnected, stream not warmed up).
    fn read_frame(&self, handle: &DeviceHandle) -> Option<RawFrame>;
}

/// Scoped ownership of a granted handle. Dropping the lease releases it.
pub struct DeviceLease<D: CaptureDevice> {
    device: Arc<D>,
    handle: Option<DeviceHandle>,
}

impl<D: CaptureDevice> DeviceLease<D> {
    pub(crate) fn new(device: Arc<D>, handle: DeviceHandle) -> Self {
        Self {
            device,
            handle: Some(handle),
        }
    }

    pub fn handle(&self) -> Option<DeviceHandle> {
        self.handle
    }

    pub(crate) fn read_frame(&self) -> Option<RawFrame> {
        self.handle
            .as_ref()
            .and_then(|handle| self.device.read_frame(handle))
    }

    /// Release explicitly. Idempotent.
    pub fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.device.release_access(handle);
        }
    }
}

impl<D: CaptureDevice> Drop for DeviceLease<D> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<D: CaptureDevice> std::fmt::Debug for DeviceLease<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceLease")
            .field("handle", &self.handle)
            .finish()
    }
}
