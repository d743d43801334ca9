pub mod controller;

pub use controller::{FeatureSession, Presentation, SessionSnapshot};
