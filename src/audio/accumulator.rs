//! Inbound byte accumulator feeding the playback queue.
//!
//! `audioStream` fragments are appended until either the size threshold
//! is reached or the oldest unflushed byte has waited `max_wait`, at
//! which point the whole buffer is flushed as one playable chunk. The
//! deadline bounds latency when a stream ends mid-buffer.

use bytes::{Bytes, BytesMut};
use tokio::time::{Duration, Instant};

pub struct Accumulator {
    buf: BytesMut,
    first_byte_at: Option<Instant>,
    threshold: usize,
    max_wait: Duration,
}

impl Accumulator {
    pub fn new(threshold: usize, max_wait: Duration) -> Self {
        Self {
            buf: BytesMut::new(),
            first_byte_at: None,
            threshold,
            max_wait,
        }
    }

    /// Append a fragment. Returns the flushed buffer when the threshold
    /// is reached; the flush empties the buffer atomically with respect
    /// to this append.
    pub fn append(&mut self, data: &[u8], now: Instant) -> Option<Bytes> {
        if data.is_empty() {
            return None;
        }
        if self.buf.is_empty() {
            self.first_byte_at = Some(now);
        }
        self.buf.extend_from_slice(data);
        if self.buf.len() >= self.threshold {
            Some(self.take())
        } else {
            None
        }
    }

    /// Flush the buffer if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<Bytes> {
        match self.deadline() {
            Some(deadline) if deadline <= now => Some(self.take()),
            _ => None,
        }
    }

    /// Instant by which the current contents must be flushed, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.first_byte_at.map(|t| t + self.max_wait)
    }

    /// Discard buffered bytes, e.g. when a new audio stream supersedes
    /// the one being accumulated.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.first_byte_at = None;
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    fn take(&mut self) -> Bytes {
        self.first_byte_at = None;
        self.buf.split().freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flushes_exactly_at_threshold() {
        let mut acc = Accumulator::new(8, Duration::from_millis(500));
        let now = Instant::now();
        assert!(acc.append(&[1; 4], now).is_none());
        let chunk = acc.append(&[2; 4], now).expect("threshold reached");
        assert_eq!(chunk.len(), 8);
        assert!(acc.is_empty());
        assert!(acc.deadline().is_none());
    }

    #[test]
    fn oversized_fragment_flushes_in_one_piece() {
        let mut acc = Accumulator::new(8, Duration::from_millis(500));
        let chunk = acc.append(&[3; 20], Instant::now()).unwrap();
        assert_eq!(chunk.len(), 20);
    }

    #[test]
    fn deadline_flush_when_under_threshold() {
        let mut acc = Accumulator::new(1000, Duration::from_millis(50));
        let start = Instant::now();
        assert!(acc.append(&[1; 10], start).is_none());

        // Not due yet
        assert!(acc.take_due(start + Duration::from_millis(10)).is_none());
        assert_eq!(acc.len(), 10);

        let chunk = acc
            .take_due(start + Duration::from_millis(50))
            .expect("flush at deadline");
        assert_eq!(chunk.len(), 10);
        assert!(acc.is_empty());
    }

    #[test]
    fn deadline_tracks_first_unflushed_byte() {
        let mut acc = Accumulator::new(1000, Duration::from_millis(100));
        let start = Instant::now();
        acc.append(&[1; 4], start);
        // Later appends do not push the deadline out
        acc.append(&[2; 4], start + Duration::from_millis(60));
        assert_eq!(acc.deadline(), Some(start + Duration::from_millis(100)));
    }

    #[test]
    fn empty_accumulator_has_no_deadline() {
        let mut acc = Accumulator::new(8, Duration::from_millis(50));
        assert!(acc.deadline().is_none());
        assert!(acc.take_due(Instant::now()).is_none());
        acc.append(&[], Instant::now());
        assert!(acc.deadline().is_none());
    }

    #[test]
    fn reset_discards_partial_bytes() {
        let mut acc = Accumulator::new(8, Duration::from_millis(50));
        acc.append(&[1; 4], Instant::now());
        acc.reset();
        assert!(acc.is_empty());
        assert!(acc.deadline().is_none());
        // A fresh append starts a fresh deadline
        let now = Instant::now();
        acc.append(&[2; 2], now);
        assert_eq!(acc.deadline(), Some(now + Duration::from_millis(50)));
    }
}
