pub mod chunk;

pub use chunk::AudioChunk;

use std::f32::consts::PI;
use crate::error::{Error, Result};

pub const SAMPLE_RATE: u32 = 44100;
pub const CHUNK_CAPACITY: usize = 4096;
/// Complete periods a chunk must hold before it is cut at the next crossing
pub const MIN_PERIODS: usize = 10;
pub const MAX_VOLUME: f32 = 128.0;

/// Generates the shortest sine buffer that loops cleanly for a frequency
#[derive(Debug, Clone, Copy)]
pub struct ToneSynthesizer {
    pub sample_rate: f32,
    pub periods: usize,
    pub capacity: usize,
}

impl Default for ToneSynthesizer {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE as f32,
            periods: MIN_PERIODS,
            capacity: CHUNK_CAPACITY,
        }
    }
}

impl ToneSynthesizer {
    pub fn new(sample_rate: u32, periods: usize, capacity: usize) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            periods,
            capacity,
        }
    }

    /// Synthesize a chunk for `frequency` at `volume` (0..=128)
    ///
    /// The phase accumulator is never wrapped. Each time the raw sine goes from
    /// negative to non-negative a period boundary is counted; once more than
    /// `periods` boundaries have been seen the buffer is cut just before the
    /// current sample, so the chunk ends where the next repetition starts.
    pub fn synthesize(&self, frequency: f32, volume: f32) -> Result<AudioChunk> {
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(Error::InvalidTone(frequency));
        }
        if !volume.is_finite() {
            return Err(Error::InvalidVolume(volume));
        }
        if self.capacity == 0 {
            return Err(Error::EmptyCapacity);
        }
        let volume = volume.clamp(0.0, MAX_VOLUME);

        let step = frequency / self.sample_rate;
        let mut samples = Vec::with_capacity(self.capacity);
        let mut phase = 0.0f32;
        let mut previous = 0.0f32;
        let mut crossings = 0;

        for _ in 0..self.capacity {
            let value = (2.0 * PI * phase).sin();
            if previous < 0.0 && value >= 0.0 {
                if crossings == self.periods {
                    samples.shrink_to_fit();
                    return Ok(AudioChunk::new(samples, frequency, volume, crossings, false));
                }
                crossings += 1;
            }
            samples.push(quantize(value, volume));
            phase += step;
            previous = value;
        }

        log::warn!(
            "{:.3} Hz does not complete {} periods in {} samples, chunk will loop with a seam",
            frequency,
            self.periods,
            self.capacity
        );
        Ok(AudioChunk::new(samples, frequency, volume, crossings, true))
    }
}

/// Synthesize with the default sample rate and period count
pub fn synthesize(frequency: f32, volume: f32, capacity: usize) -> Result<AudioChunk> {
    ToneSynthesizer {
        capacity,
        ..Default::default()
    }
    .synthesize(frequency, volume)
}

/// Map a raw sample in [-1, 1] to an unsigned byte centred on `volume`.
/// At the maximum volume the positive peak (256) saturates to 255.
pub fn quantize(value: f32, volume: f32) -> u8 {
    ((value + 1.0) * volume).round().clamp(0.0, u8::MAX as f32) as u8
}
