use std::sync::Arc;

use crate::core::playback::{Device, PlaybackPipeline, PlaybackState};
use crate::core::synth::{AudioChunk, ToneSynthesizer};
use crate::core::tone::Tone;
use crate::core::visualization::{axis, waveform_trace};
use crate::core::volume::VolumeController;
use crate::error::Result;
use crate::settings::Settings;

/// Read-only view for a display front end
#[derive(Debug, Clone)]
pub struct DisplaySnapshot {
    pub label: String,
    pub volume: f32,
    pub trace: Vec<[f32; 2]>,
    /// Centre line the trace oscillates around, as wide as the trace
    pub axis: [[f32; 2]; 2],
}

/// Monophonic instrument: owns the synthesizer, the volume and the playback
/// worker, and turns note events into chunks for the worker.
pub struct Instrument {
    synthesizer: ToneSynthesizer,
    volume: Arc<VolumeController>,
    pipeline: PlaybackPipeline,
    sounding: Option<Tone>,
    last_tone: Option<Tone>,
    last_chunk: Option<Arc<AudioChunk>>,
    chunks_synthesized: usize,
}

impl Instrument {
    pub fn new<D: Device>(settings: &Settings, device: D) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            synthesizer: ToneSynthesizer::new(
                settings.sample_rate,
                settings.periods,
                settings.chunk_capacity,
            ),
            volume: Arc::new(VolumeController::new(
                settings.initial_volume,
                settings.volume_step,
                settings.max_volume,
            )),
            pipeline: PlaybackPipeline::start(device)?,
            sounding: None,
            last_tone: None,
            last_chunk: None,
            chunks_synthesized: 0,
        })
    }

    /// Synthesize `tone` at the current volume and sustain it, replacing any
    /// tone already sounding
    pub fn note_on(&mut self, tone: Tone) -> Result<Arc<AudioChunk>> {
        let chunk = Arc::new(
            self.synthesizer
                .synthesize(tone.frequency(), self.volume.current())?,
        );
        self.chunks_synthesized += 1;
        log::info!("{}", tone.label());
        log::debug!("{} samples, {} periods", chunk.len(), chunk.crossings());

        self.pipeline.play(Arc::clone(&chunk))?;
        self.sounding = Some(tone);
        self.last_tone = Some(tone);
        self.last_chunk = Some(Arc::clone(&chunk));
        Ok(chunk)
    }

    /// Release `tone`. A release for a key that was already replaced by a
    /// newer note is ignored.
    pub fn note_off(&mut self, tone: Tone) {
        match self.sounding {
            Some(current) if current == tone => {
                self.pipeline.stop();
                self.sounding = None;
            }
            Some(current) => {
                log::debug!("ignoring release of {}, {} is sounding", tone, current);
            }
            None => {}
        }
    }

    pub fn volume_up(&self) -> f32 {
        let volume = self.volume.increase();
        log::info!("volume {}", volume);
        volume
    }

    pub fn volume_down(&self) -> f32 {
        let volume = self.volume.decrease();
        log::info!("volume {}", volume);
        volume
    }

    /// Shared handle for readers on other threads
    pub fn volume(&self) -> Arc<VolumeController> {
        Arc::clone(&self.volume)
    }

    pub fn state(&self) -> PlaybackState {
        self.pipeline.state()
    }

    pub fn sounding(&self) -> Option<Tone> {
        self.sounding
    }

    pub fn last_chunk(&self) -> Option<Arc<AudioChunk>> {
        self.last_chunk.clone()
    }

    pub fn chunks_synthesized(&self) -> usize {
        self.chunks_synthesized
    }

    pub fn is_running(&self) -> bool {
        self.pipeline.is_running()
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        let trace = self
            .last_chunk
            .as_deref()
            .map(|chunk| waveform_trace(chunk, 1))
            .unwrap_or_default();
        DisplaySnapshot {
            label: self.last_tone.map(|t| t.label()).unwrap_or_default(),
            volume: self.volume.current(),
            axis: axis(trace.len() as f32),
            trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::playback::tests::{wait_for, FailingDevice, MemoryDevice};
    use crate::error::Error;
    use std::time::{Duration, Instant};

    fn instrument(device: MemoryDevice) -> Instrument {
        Instrument::new(&Settings::default(), device).unwrap()
    }

    #[test]
    fn test_note_on_off_returns_to_idle() {
        let device = MemoryDevice::default();
        let mut instrument = instrument(device.clone());

        let chunk = instrument.note_on(Tone::new(0)).unwrap();
        assert_eq!(instrument.state(), PlaybackState::Sustaining(Arc::clone(&chunk)));
        instrument.note_off(Tone::new(0));

        assert_eq!(instrument.state(), PlaybackState::Idle);
        assert_eq!(instrument.chunks_synthesized(), 1);
        assert_eq!(instrument.sounding(), None);
    }

    #[test]
    fn test_every_note_on_synthesizes_afresh() {
        let mut instrument = instrument(MemoryDevice::default());

        let first = instrument.note_on(Tone::new(0)).unwrap();
        instrument.note_off(Tone::new(0));
        let second = instrument.note_on(Tone::new(0)).unwrap();

        assert_eq!(instrument.chunks_synthesized(), 2);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.samples(), second.samples());
        assert_eq!(instrument.state(), PlaybackState::Sustaining(second));
    }

    #[test]
    fn test_overlapping_note_preempts() {
        let device = MemoryDevice::default();
        let mut instrument = instrument(device.clone());

        instrument.note_on(Tone::new(0)).unwrap();
        let started = Instant::now();
        let d5 = instrument.note_on(Tone::new(5)).unwrap();
        assert!(started.elapsed() < Duration::from_millis(100));

        assert_eq!(instrument.sounding(), Some(Tone::new(5)));
        assert!(wait_for(|| device.last().as_deref() == Some(d5.samples())));

        // Late release of the replaced key leaves the new note sounding
        instrument.note_off(Tone::new(0));
        assert_eq!(instrument.state(), PlaybackState::Sustaining(Arc::clone(&d5)));
        instrument.note_off(Tone::new(5));
        assert_eq!(instrument.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_volume_applies_to_next_note_only() {
        let mut instrument = instrument(MemoryDevice::default());
        let quiet = instrument.note_on(Tone::new(0)).unwrap();
        assert_eq!(instrument.volume_up(), 72.0);
        assert_eq!(quiet.volume(), 64.0);

        let louder = instrument.note_on(Tone::new(0)).unwrap();
        assert_eq!(louder.volume(), 72.0);
        assert_eq!(instrument.volume_down(), 64.0);
        assert_eq!(instrument.volume().current(), 64.0);
    }

    #[test]
    fn test_snapshot_reflects_last_note() {
        let mut instrument = instrument(MemoryDevice::default());
        let empty = instrument.snapshot();
        assert!(empty.label.is_empty() && empty.trace.is_empty());
        assert_eq!(empty.axis, [[0.0, 128.0], [0.0, 128.0]]);

        let chunk = instrument.note_on(Tone::new(3)).unwrap();
        instrument.note_off(Tone::new(3));
        let snapshot = instrument.snapshot();
        assert_eq!(snapshot.label, "C5 / 523.251 Hz");
        assert_eq!(snapshot.volume, 64.0);
        assert_eq!(snapshot.trace.len(), chunk.len());
        assert_eq!(snapshot.axis, [[0.0, 128.0], [chunk.len() as f32, 128.0]]);
        // The trace starts at sin(0), on the axis
        assert_eq!(snapshot.trace[0], snapshot.axis[0]);
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let settings = Settings {
            volume_step: -8.0,
            ..Settings::default()
        };
        assert!(matches!(
            Instrument::new(&settings, MemoryDevice::default()),
            Err(Error::Settings(_))
        ));
        let settings = Settings {
            initial_volume: 200.0,
            ..Settings::default()
        };
        assert!(matches!(
            Instrument::new(&settings, MemoryDevice::default()),
            Err(Error::Settings(_))
        ));
    }

    #[test]
    fn test_device_failure_surfaces_on_note_on() {
        let mut instrument = Instrument::new(&Settings::default(), FailingDevice { remaining: 0 }).unwrap();
        instrument.note_on(Tone::new(0)).unwrap();
        assert!(wait_for(|| !instrument.is_running()));
        assert!(matches!(
            instrument.note_on(Tone::new(2)),
            Err(Error::DeviceUnavailable(_))
        ));
    }
}
