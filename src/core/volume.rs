use std::sync::atomic::{AtomicU32, Ordering};

use super::synth::MAX_VOLUME;

pub const DEFAULT_VOLUME: f32 = 64.0;
pub const VOLUME_STEP: f32 = 8.0;

/// Master volume shared between the input thread, synthesis and display.
///
/// The value is an `f32` stored as raw bits so it can be read and stepped
/// without a lock. It never leaves `[0, max]`.
#[derive(Debug)]
pub struct VolumeController {
    bits: AtomicU32,
    step: f32,
    max: f32,
}

impl Default for VolumeController {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME, VOLUME_STEP, MAX_VOLUME)
    }
}

impl VolumeController {
    /// A negative step is taken by magnitude; a non-finite one falls back
    /// to [`VOLUME_STEP`].
    pub fn new(initial: f32, step: f32, max: f32) -> Self {
        let max = if max.is_nan() { MAX_VOLUME } else { max.clamp(0.0, MAX_VOLUME) };
        let initial = if initial.is_nan() { 0.0 } else { initial.clamp(0.0, max) };
        let step = if step.is_finite() { step.abs() } else { VOLUME_STEP };
        Self {
            bits: AtomicU32::new(initial.to_bits()),
            step,
            max,
        }
    }

    pub fn current(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Raise by one step, saturating at the maximum. Returns the new value.
    pub fn increase(&self) -> f32 {
        self.update(|v| v + self.step)
    }

    /// Lower by one step, saturating at zero. Returns the new value.
    pub fn decrease(&self) -> f32 {
        self.update(|v| v - self.step)
    }

    fn update(&self, f: impl Fn(f32) -> f32) -> f32 {
        let mut current = self.bits.load(Ordering::Acquire);
        loop {
            let next = f(f32::from_bits(current)).clamp(0.0, self.max);
            match self.bits.compare_exchange_weak(
                current,
                next.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}
