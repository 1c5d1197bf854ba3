//! Error type shared by the synthesizer, playback pipeline and input layers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Frequency derived from a tone is not a positive finite number
    #[error("invalid tone: {0} Hz is not a positive finite frequency")]
    InvalidTone(f32),

    #[error("invalid volume: {0}")]
    InvalidVolume(f32),

    #[error("chunk capacity must be at least one sample")]
    EmptyCapacity,

    /// Output device failed to open or rejected a write. Playback does not retry.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("playback worker is not running")]
    PipelineClosed,

    #[error("MIDI: {0}")]
    Midi(String),

    #[error("settings: {0}")]
    Settings(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
