//! Waveform traces for whatever front end draws the last chunk

use crate::core::synth::{AudioChunk, MAX_VOLUME};

/// Polyline of `chunk` repeated `repeats` times, as `[x, y]` points.
///
/// `y` is the sample shifted so the waveform stays centred on the
/// `MAX_VOLUME` line whatever volume it was struck at.
pub fn waveform_trace(chunk: &AudioChunk, repeats: usize) -> Vec<[f32; 2]> {
    let offset = MAX_VOLUME - chunk.volume();
    let len = chunk.len();
    let mut points = Vec::with_capacity(len * repeats);

    for repeat in 0..repeats {
        for (i, &sample) in chunk.samples().iter().enumerate() {
            points.push([(i + repeat * len) as f32, sample as f32 + offset]);
        }
    }

    points
}

/// Horizontal axis through the centre line, spanning `width`
pub fn axis(width: f32) -> [[f32; 2]; 2] {
    [[0.0, MAX_VOLUME], [width, MAX_VOLUME]]
}
