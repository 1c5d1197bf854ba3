/// A loopable block of unsigned 8-bit samples produced for one tone
///
/// Samples are centred on the chunk's volume: silence sits at `volume` and the
/// peaks at `0` and `2 * volume` (saturated to 255).
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    samples: Vec<u8>,
    frequency: f32,
    volume: f32,
    crossings: usize,
    degraded: bool,
}

impl AudioChunk {
    pub(crate) fn new(
        samples: Vec<u8>,
        frequency: f32,
        volume: f32,
        crossings: usize,
        degraded: bool,
    ) -> Self {
        Self {
            samples,
            frequency,
            volume,
            crossings,
            degraded,
        }
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Volume baked into the samples at synthesis time
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Upward zero-crossings contained in the chunk
    pub fn crossings(&self) -> usize {
        self.crossings
    }

    /// True when capacity ran out before enough periods were completed.
    /// Such a chunk does not end on a period boundary and loops with a seam.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}
