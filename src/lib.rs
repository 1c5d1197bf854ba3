//! Monophonic sine keyboard: each key press synthesizes a short loopable
//! chunk that a playback worker replays until the key is released.

pub mod core;
pub mod error;
pub mod messaging;
pub mod settings;

pub use error::{Error, Result};
