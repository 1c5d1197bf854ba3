//! Output devices for the playback worker

use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat, Stream};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, SendTimeoutError};

use crate::error::{Error, Result};

// A write that cannot hand its buffer to the stream within this window
// means the stream has stopped pulling data
const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Audio sink fed by the playback worker
pub trait Device: Send + 'static {
    /// Hand `buffer` (unsigned 8-bit mono PCM) to the device and block until
    /// the device has taken it
    fn write(&mut self, buffer: &[u8]) -> Result<()>;
}

/// Default output device opened through cpal
///
/// Owns the `cpal::Stream`, which has to stay on the thread that created it.
/// The playback worker gets a [`StreamWriter`] instead.
pub struct CpalDevice {
    _stream: Stream,
    writer: StreamWriter,
    pub sample_rate: u32,
    pub channels: u16,
}

impl CpalDevice {
    /// Open the default output device at `sample_rate`, preferring `channels`
    pub fn open(sample_rate: u32, channels: u16) -> Result<Self> {
        let host = cpal::default_host();
        log::info!("Using audio host: {}", host.id().name());

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::DeviceUnavailable("no output device available".to_string()))?;
        log::info!(
            "Using output device: {}",
            device.name().unwrap_or_else(|_| "unknown".to_string())
        );

        let rate = cpal::SampleRate(sample_rate);
        let ranges: Vec<_> = device
            .supported_output_configs()
            .map_err(unavailable)?
            .filter(|range| range.min_sample_rate() <= rate && rate <= range.max_sample_rate())
            .collect();
        let range = ranges
            .iter()
            .find(|range| range.channels() == channels)
            .or_else(|| ranges.first())
            .cloned()
            .ok_or_else(|| {
                Error::DeviceUnavailable(format!("no output config supports {} Hz", sample_rate))
            })?;

        let supported = range.with_sample_rate(rate);
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        log::info!("Device config: {:?} ({:?})", config, sample_format);

        let (writer, buffer_rx, error_tx) = StreamWriter::channel();

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, buffer_rx, error_tx),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, buffer_rx, error_tx),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, buffer_rx, error_tx),
            SampleFormat::U8 => build_stream::<u8>(&device, &config, buffer_rx, error_tx),
            other => {
                return Err(Error::DeviceUnavailable(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        }?;
        stream.play().map_err(unavailable)?;

        Ok(Self {
            _stream: stream,
            writer,
            sample_rate,
            channels: config.channels,
        })
    }

    /// Device half that can be moved to the playback worker
    pub fn writer(&self) -> StreamWriter {
        self.writer.clone()
    }
}

/// Sending side of a cpal output stream
#[derive(Clone)]
pub struct StreamWriter {
    buffers: Sender<Vec<u8>>,
    errors: Receiver<String>,
}

impl StreamWriter {
    /// Writer plus the ends the audio callback reads buffers from and
    /// reports errors to. The buffer channel has no capacity, so a write
    /// completes only when the callback picks the buffer up, never while an
    /// earlier one is still waiting in a queue.
    fn channel() -> (Self, Receiver<Vec<u8>>, Sender<String>) {
        let (buffer_tx, buffer_rx) = bounded(0);
        let (error_tx, error_rx) = unbounded();
        let writer = Self {
            buffers: buffer_tx,
            errors: error_rx,
        };
        (writer, buffer_rx, error_tx)
    }
}

impl Device for StreamWriter {
    fn write(&mut self, buffer: &[u8]) -> Result<()> {
        if let Ok(err) = self.errors.try_recv() {
            return Err(Error::DeviceUnavailable(err));
        }
        match self.buffers.send_timeout(buffer.to_vec(), WRITE_TIMEOUT) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => {
                Err(Error::DeviceUnavailable("output stream stalled".to_string()))
            }
            Err(SendTimeoutError::Disconnected(_)) => {
                Err(Error::DeviceUnavailable("output stream closed".to_string()))
            }
        }
    }
}

/// Unsigned 8-bit PCM to [-1, 1), 128 is silence
pub fn decode(sample: u8) -> f32 {
    (sample as f32 - 128.0) / 128.0
}

fn unavailable(err: impl std::fmt::Display) -> Error {
    Error::DeviceUnavailable(err.to_string())
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    buffers: Receiver<Vec<u8>>,
    errors: Sender<String>,
) -> Result<Stream>
where
    T: Sample + Send + 'static + cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut current: Vec<u8> = Vec::new();
    let mut position = 0;

    let err_fn = move |err: cpal::StreamError| {
        log::error!("an error occurred on the audio stream: {}", err);
        errors.send(err.to_string()).ok();
    };

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // Never blocks: on underrun the frame is silence
                for frame in data.chunks_mut(channels) {
                    if position >= current.len() {
                        position = 0;
                        match buffers.try_recv() {
                            Ok(next) => current = next,
                            Err(_) => current.clear(),
                        }
                    }
                    let value = match current.get(position) {
                        Some(&sample) => {
                            position += 1;
                            decode(sample)
                        }
                        None => 0.0,
                    };
                    let value = T::from_sample(value);
                    for sample in frame.iter_mut() {
                        *sample = value;
                    }
                }
            },
            err_fn,
            None,
        )
        .map_err(unavailable)?;

    Ok(stream)
}
