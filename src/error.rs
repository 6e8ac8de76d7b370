use std::path::PathBuf;

use thiserror::Error;

/// Score file could not be read or decoded. Fatal at startup.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read score file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed MIDI data: {0}")]
    Midi(#[from] midly::Error),

    #[error("unsupported MIDI timing: {0}")]
    UnsupportedTiming(String),
}

/// Capture or output device failure.
/// Isolated to the audio side once the render loop is running.
#[derive(Debug, Error)]
pub enum AudioDeviceError {
    #[error("no default {0} device available")]
    NoDevice(&'static str),

    #[error("audio device '{0}' not found")]
    DeviceNotFound(String),

    #[error("audio device index {index} out of range (0-{last})")]
    IndexOutOfRange { index: usize, last: usize },

    #[error("failed to enumerate audio devices: {0}")]
    Enumerate(String),

    #[error("failed to query device configuration: {0}")]
    Config(String),

    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to build audio stream: {0}")]
    Build(String),

    #[error("failed to start audio stream: {0}")]
    Play(String),

    #[error("audio stream fault: {0}")]
    Stream(String),

    #[error("failed to spawn estimator thread")]
    Spawn(#[source] std::io::Error),
}

/// Terminal drawing surface failure. Fatal.
#[derive(Debug, Error)]
pub enum RenderSurfaceError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
