use thiserror::Error;

/// Capture device failures. Fatal to the capture pipeline only;
/// the session stays open and the next explicit start retries.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("capture device unavailable: {0}")]
    Unavailable(String),
    #[error("device i/o error: {0}")]
    Io(String),
}

/// A playback chunk failed to decode. The chunk is dropped and the
/// queue advances; never fatal to the session.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty audio chunk")]
    EmptyChunk,
    #[error("malformed audio payload: {0}")]
    Malformed(String),
}

/// Error message pushed down by the agent server. Forwarded to the
/// error-display sink; does not close the session by itself.
#[derive(Debug, Error)]
#[error("agent error {code}: {message}")]
pub struct AgentError {
    pub code: i64,
    pub message: String,
}
