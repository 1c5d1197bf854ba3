//! Playback worker that sustains one chunk at a time.
//!
//! The producer side (`play`/`stop`) only swaps a shared slot and nudges the
//! worker through a one-slot wake channel, so it never waits on the device.
//! The worker re-reads the slot between device writes: a new chunk takes
//! over at the next buffer boundary and an empty slot returns it to idle.

pub mod device;

pub use device::{CpalDevice, Device, StreamWriter};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::core::synth::AudioChunk;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackState {
    Idle,
    Sustaining(Arc<AudioChunk>),
}

struct Slot {
    chunk: Option<Arc<AudioChunk>>,
    running: bool,
    failure: Option<String>,
}

struct Shared {
    slot: Mutex<Slot>,
}

impl Shared {
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct PlaybackPipeline {
    shared: Arc<Shared>,
    wake: Sender<()>,
    worker: Option<JoinHandle<()>>,
}

impl PlaybackPipeline {
    /// Spawn the playback worker on its own thread, writing to `device`
    pub fn start<D: Device>(device: D) -> Result<Self> {
        let shared = Arc::new(Shared {
            slot: Mutex::new(Slot {
                chunk: None,
                running: true,
                failure: None,
            }),
        });
        let (wake, wake_rx) = bounded(1);

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("playback".to_string())
            .spawn(move || run_worker(device, worker_shared, wake_rx))?;

        Ok(Self {
            shared,
            wake,
            worker: Some(worker),
        })
    }

    /// Start sustaining `chunk`, replacing whatever is playing
    pub fn play(&self, chunk: Arc<AudioChunk>) -> Result<()> {
        {
            let mut slot = self.shared.slot();
            if let Some(failure) = &slot.failure {
                return Err(Error::DeviceUnavailable(failure.clone()));
            }
            if !slot.running {
                return Err(Error::PipelineClosed);
            }
            slot.chunk = Some(chunk);
        }
        self.notify();
        Ok(())
    }

    /// Stop whatever is sustaining. The chunk already handed to the device
    /// finishes playing.
    pub fn stop(&self) {
        self.shared.slot().chunk = None;
        self.notify();
    }

    pub fn state(&self) -> PlaybackState {
        match &self.shared.slot().chunk {
            Some(chunk) => PlaybackState::Sustaining(Arc::clone(chunk)),
            None => PlaybackState::Idle,
        }
    }

    /// False once the worker has exited, normally because the device failed
    pub fn is_running(&self) -> bool {
        self.shared.slot().running
    }

    /// Reason the worker gave up on the device, if it did
    pub fn failure(&self) -> Option<String> {
        self.shared.slot().failure.clone()
    }

    fn notify(&self) {
        // A pending wake-up already covers this change
        self.wake.try_send(()).ok();
    }
}

impl Drop for PlaybackPipeline {
    fn drop(&mut self) {
        {
            let mut slot = self.shared.slot();
            slot.chunk = None;
            slot.running = false;
        }
        self.notify();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("playback worker panicked");
            }
        }
    }
}

fn run_worker<D: Device>(mut device: D, shared: Arc<Shared>, wake: Receiver<()>) {
    log::debug!("playback worker started");
    loop {
        let chunk = {
            let slot = shared.slot();
            if !slot.running {
                break;
            }
            slot.chunk.clone()
        };

        match chunk {
            Some(chunk) => {
                if let Err(err) = device.write(chunk.samples()) {
                    log::error!("playback stopped: {}", err);
                    let mut slot = shared.slot();
                    slot.chunk = None;
                    slot.running = false;
                    slot.failure = Some(match err {
                        Error::DeviceUnavailable(reason) => reason,
                        other => other.to_string(),
                    });
                    break;
                }
            }
            None => {
                if wake.recv().is_err() {
                    break;
                }
            }
        }
    }
    log::debug!("playback worker exited");
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::synth::synthesize;
    use std::time::{Duration, Instant};

    /// Records every buffer and paces writes like a real device would
    #[derive(Clone, Default)]
    pub(crate) struct MemoryDevice {
        pub writes: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl MemoryDevice {
        pub fn count(&self) -> usize {
            self.writes.lock().unwrap().len()
        }

        pub fn last(&self) -> Option<Vec<u8>> {
            self.writes.lock().unwrap().last().cloned()
        }
    }

    impl Device for MemoryDevice {
        fn write(&mut self, buffer: &[u8]) -> Result<()> {
            self.writes.lock().unwrap().push(buffer.to_vec());
            thread::sleep(Duration::from_millis(2));
            Ok(())
        }
    }

    /// Accepts `remaining` writes, then fails
    pub(crate) struct FailingDevice {
        pub remaining: usize,
    }

    impl Device for FailingDevice {
        fn write(&mut self, _buffer: &[u8]) -> Result<()> {
            if self.remaining == 0 {
                return Err(Error::DeviceUnavailable("unplugged".to_string()));
            }
            self.remaining -= 1;
            thread::sleep(Duration::from_millis(1));
            Ok(())
        }
    }

    pub(crate) fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        condition()
    }

    fn chunk(frequency: f32) -> Arc<AudioChunk> {
        Arc::new(synthesize(frequency, 64.0, 4096).unwrap())
    }

    #[test]
    fn test_starts_idle() {
        let pipeline = PlaybackPipeline::start(MemoryDevice::default()).unwrap();
        assert_eq!(pipeline.state(), PlaybackState::Idle);
        assert!(pipeline.is_running());
    }

    #[test]
    fn test_sustains_until_stopped() {
        let device = MemoryDevice::default();
        let pipeline = PlaybackPipeline::start(device.clone()).unwrap();
        let a4 = chunk(440.0);

        pipeline.play(Arc::clone(&a4)).unwrap();
        assert_eq!(pipeline.state(), PlaybackState::Sustaining(Arc::clone(&a4)));
        assert!(wait_for(|| device.count() >= 3), "chunk was not replayed");
        assert_eq!(device.last().unwrap(), a4.samples());

        pipeline.stop();
        assert_eq!(pipeline.state(), PlaybackState::Idle);
        // At most the write in progress completes after the stop
        thread::sleep(Duration::from_millis(20));
        let settled = device.count();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(device.count(), settled);
    }

    #[test]
    fn test_new_chunk_preempts_without_blocking() {
        let device = MemoryDevice::default();
        let pipeline = PlaybackPipeline::start(device.clone()).unwrap();
        let a4 = chunk(440.0);
        let d5 = chunk(587.33);

        pipeline.play(Arc::clone(&a4)).unwrap();
        assert!(wait_for(|| device.count() >= 1));

        let started = Instant::now();
        pipeline.play(Arc::clone(&d5)).unwrap();
        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(pipeline.state(), PlaybackState::Sustaining(Arc::clone(&d5)));
        assert!(wait_for(|| device.last().as_deref() == Some(d5.samples())));
    }

    #[test]
    fn test_stop_while_idle_is_harmless() {
        let pipeline = PlaybackPipeline::start(MemoryDevice::default()).unwrap();
        pipeline.stop();
        pipeline.stop();
        assert_eq!(pipeline.state(), PlaybackState::Idle);
        pipeline.play(chunk(440.0)).unwrap();
        assert!(matches!(pipeline.state(), PlaybackState::Sustaining(_)));
    }

    #[test]
    fn test_device_failure_stops_worker() {
        let pipeline = PlaybackPipeline::start(FailingDevice { remaining: 2 }).unwrap();
        pipeline.play(chunk(440.0)).unwrap();
        assert!(wait_for(|| !pipeline.is_running()));
        assert_eq!(pipeline.state(), PlaybackState::Idle);
        assert_eq!(pipeline.failure().as_deref(), Some("unplugged"));
        assert!(matches!(
            pipeline.play(chunk(440.0)),
            Err(Error::DeviceUnavailable(_))
        ));
    }

    #[test]
    fn test_drop_joins_sustaining_worker() {
        let device = MemoryDevice::default();
        let pipeline = PlaybackPipeline::start(device.clone()).unwrap();
        pipeline.play(chunk(440.0)).unwrap();
        assert!(wait_for(|| device.count() >= 1));
        drop(pipeline);
        let after = device.count();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(device.count(), after);
    }
}
