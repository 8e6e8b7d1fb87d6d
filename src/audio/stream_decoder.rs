//! Generic stream decoder trait for multi-format audio playback support.

use anyhow::Result;

use super::mulaw;
use crate::error::DecodeError;

/// A trait for audio stream decoders that convert encoded audio bytes
/// into interleaved i16 PCM samples ready for playback.
pub trait StreamDecoder: Send {
    /// Decode encoded audio bytes into i16 PCM samples.
    fn decode(&mut self, data: &[u8]) -> Result<Vec<i16>, DecodeError>;
}

/// Mu-law stream decoder: one byte per sample, no internal state.
pub struct MulawDecoder;

impl StreamDecoder for MulawDecoder {
    fn decode(&mut self, data: &[u8]) -> Result<Vec<i16>, DecodeError> {
        if data.is_empty() {
            return Err(DecodeError::EmptyChunk);
        }
        Ok(mulaw::decode_buffer(data))
    }
}

/// Factory function: create a decoder based on the configured stream format.
pub fn create_decoder(format: &str) -> Result<Box<dyn StreamDecoder>> {
    match format {
        "mulaw" | "ulaw" => Ok(Box::new(MulawDecoder)),
        other => anyhow::bail!("Unsupported stream format: {}", other),
    }
}
