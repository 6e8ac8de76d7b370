pub mod note;
pub mod pitch;

pub use pitch::{PitchEstimate, PitchSample};
