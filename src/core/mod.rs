pub mod console;
pub mod instrument;
pub mod midi;
pub mod playback;
pub mod synth;
pub mod tone;
pub mod visualization;
pub mod volume;

pub use instrument::Instrument;
