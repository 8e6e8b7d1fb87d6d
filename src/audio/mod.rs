//! audio - Capture, playback, and codec library
//!
//! The streaming voice pipeline: mu-law companding, the outbound
//! capture pipeline, the inbound accumulator and playback queue, and
//! the device traits the platform primitives hide behind.

pub mod accumulator;
pub mod capture;
pub mod device;
pub mod mulaw;
pub mod playback;
pub mod stream_decoder;

pub use accumulator::Accumulator;
pub use capture::{AudioEvent, CaptureConfig, CapturePipeline};
pub use device::{AudioSink, CaptureSource, NullSink, SilenceSource, SourceFactory};
pub use playback::{EncodedChunk, PlaybackCommand, PlaybackQueue, playback_thread};
pub use stream_decoder::{StreamDecoder, create_decoder};
