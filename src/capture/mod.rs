pub mod controller;
pub mod device;
pub mod frame;
pub mod state;

pub use controller::{AccessTicket, CaptureController, StartStep};
pub use device::{CaptureDevice, DeviceHandle, DeviceLease};
pub use frame::{ImageFrame, RawFrame};
pub use state::{CaptureSession, CaptureState};
