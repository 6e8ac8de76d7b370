pub mod capture;
pub mod estimator;
pub mod shared;

pub use capture::{CaptureBackend, CaptureSink, CpalCapture};
pub use estimator::{BlockEstimator, EstimatorHandle, EstimatorStatus, PitchEstimator};
pub use shared::SharedPitchState;
