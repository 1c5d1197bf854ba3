use std::fmt;

/// Reference pitch for offset 0 (A4)
pub const REFERENCE_FREQ: f32 = 440.0;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

// Semitones from C1 up to A4, used to name notes relative to the reference pitch
const A4_FROM_C1: i64 = 45;

/// A pitch expressed as a semitone offset from A4
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tone {
    pub offset: i32,
}

impl Tone {
    pub fn new(offset: i32) -> Self {
        Self { offset }
    }

    /// Build a tone from a MIDI note number (69 = A4)
    pub fn from_midi(note: u8) -> Self {
        Self::new(note as i32 - 69)
    }

    /// Frequency in Hz: 440 * 2^(offset / 12)
    pub fn frequency(&self) -> f32 {
        REFERENCE_FREQ * 2.0f32.powf(self.offset as f32 / 12.0)
    }

    /// Note name with octave, e.g. "A4" or "C#5"
    pub fn name(&self) -> String {
        // Widened so offsets near the i32 limits still get a name
        let index = i64::from(self.offset) + A4_FROM_C1;
        let base = NOTE_NAMES[index.rem_euclid(12) as usize];
        let octave = index.div_euclid(12) + 1;
        format!("{}{}", base, octave)
    }

    /// Label shown to the player: note name and frequency
    pub fn label(&self) -> String {
        format!("{} / {:.3} Hz", self.name(), self.frequency())
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
