//! Guide playback: renders the loaded score as simple tones on an output
//! device so the singer can hear the target line.

pub mod envelope;
pub mod output;
pub mod player;
pub mod voice;

pub use output::start;
pub use player::ScorePlayer;
