use crate::core::tone::Tone;

/// Events delivered to the instrument by the input layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentMessage {
    NoteOn(Tone),
    NoteOff(Tone),
    VolumeUp,
    VolumeDown,
    Quit,
}
