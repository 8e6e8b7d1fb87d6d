//! Platform audio primitives behind traits.
//!
//! Real hardware capture/playback is outside this crate; it is consumed
//! through `CaptureSource` and `AudioSink`. The software implementations
//! here pace themselves in real time so the pipeline can run end to end
//! without a sound card.

use std::thread;
use std::time::Duration;

use crate::error::DeviceError;

/// A capture device producing fixed-rate linear PCM frames
/// (16-bit signed, mono).
///
/// `read_frame` blocks for one frame interval and returns the samples
/// captured during it.
pub trait CaptureSource: Send {
    fn read_frame(&mut self) -> Result<Vec<i16>, DeviceError>;
}

/// A playback device for decoded PCM. `play` blocks until the samples
/// have finished playing, which is what serializes the playback queue.
pub trait AudioSink: Send {
    fn play(&mut self, pcm: &[i16]) -> Result<(), DeviceError>;
}

/// Factory used by the capture pipeline to (re)open its device on every
/// start; opening may fail with `DeviceError::Unavailable`.
pub type SourceFactory = Box<dyn Fn() -> Result<Box<dyn CaptureSource>, DeviceError> + Send>;

/// Software capture source producing silence at the nominal rate.
pub struct SilenceSource {
    sample_rate: u32,
    period_ms: u32,
}

impl SilenceSource {
    pub fn new(sample_rate: u32, period_ms: u32) -> Self {
        Self {
            sample_rate,
            period_ms,
        }
    }
}

impl CaptureSource for SilenceSource {
    fn read_frame(&mut self) -> Result<Vec<i16>, DeviceError> {
        thread::sleep(Duration::from_millis(self.period_ms as u64));
        let samples = (self.sample_rate * self.period_ms / 1000) as usize;
        Ok(vec![0i16; samples])
    }
}

/// Software sink that consumes PCM in real time without emitting sound.
pub struct NullSink {
    sample_rate: u32,
}

impl NullSink {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl AudioSink for NullSink {
    fn play(&mut self, pcm: &[i16]) -> Result<(), DeviceError> {
        let millis = pcm.len() as u64 * 1000 / self.sample_rate as u64;
        thread::sleep(Duration::from_millis(millis));
        Ok(())
    }
}
