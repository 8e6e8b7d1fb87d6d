//! Inbound playback queue: strict FIFO, one decode+play in flight.
//!
//! Chunks arrive faster or slower than real time but must come out of
//! the speaker in receipt order. The queue runs on a dedicated playback
//! thread fed by an mpsc channel, so playback never overlaps and an
//! enqueue during an active playback only appends.

use std::collections::VecDeque;

use bytes::Bytes;
use tokio::sync::mpsc;

use super::device::AudioSink;
use super::stream_decoder::StreamDecoder;

/// One unit of encoded audio moving through the queue. `seq` is the
/// arrival order assigned at accumulator flush time.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedChunk {
    pub seq: u64,
    pub data: Bytes,
}

/// Commands accepted by the playback worker.
#[derive(Debug)]
pub enum PlaybackCommand {
    Chunk(EncodedChunk),
    /// Drop everything still queued (session teardown).
    Clear,
}

pub struct PlaybackQueue {
    queue: VecDeque<EncodedChunk>,
    playing: bool,
    decoder: Box<dyn StreamDecoder>,
    sink: Box<dyn AudioSink>,
}

impl PlaybackQueue {
    pub fn new(decoder: Box<dyn StreamDecoder>, sink: Box<dyn AudioSink>) -> Self {
        Self {
            queue: VecDeque::new(),
            playing: false,
            decoder,
            sink,
        }
    }

    /// Append a chunk without starting playback. Used by the worker to
    /// batch pending commands before the next play.
    pub fn push(&mut self, chunk: EncodedChunk) {
        self.queue.push_back(chunk);
    }

    /// Append a chunk; when idle this drives playback of the head.
    /// During an active playback it only appends.
    pub fn enqueue(&mut self, chunk: EncodedChunk) {
        self.push(chunk);
        if !self.playing {
            self.play_next();
        }
    }

    /// Pop the head and play it to completion. Chunks that fail to
    /// decode (or decode to nothing) are dropped and the next one is
    /// tried immediately; stale audio has no value and one bad chunk
    /// must not stall the session. At most one chunk is played per
    /// call, so the caller regains control between chunks.
    pub fn play_next(&mut self) {
        if self.playing {
            return;
        }
        while let Some(chunk) = self.queue.pop_front() {
            let pcm = match self.decoder.decode(&chunk.data) {
                Ok(pcm) => pcm,
                Err(e) => {
                    log::warn!("Dropping chunk {}: {}", chunk.seq, e);
                    continue;
                }
            };
            if pcm.is_empty() {
                continue;
            }
            self.playing = true;
            if let Err(e) = self.sink.play(&pcm) {
                log::warn!("Playback error on chunk {}: {}", chunk.seq, e);
            }
            self.playing = false;
            break;
        }
    }

    pub fn clear(&mut self) {
        let dropped = self.queue.len();
        self.queue.clear();
        if dropped > 0 {
            log::info!("Cleared {} queued chunks", dropped);
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Playback worker loop. Runs on its own OS thread (real-time audio
/// writes stay off the async runtime); exits when the channel closes.
///
/// Every pending command is drained into the queue before each play, so
/// a `Clear` issued while a chunk was playing discards the backlog
/// before the next chunk starts.
pub fn playback_thread(mut rx: mpsc::Receiver<PlaybackCommand>, mut queue: PlaybackQueue) {
    log::info!("Playback worker started");
    loop {
        if queue.is_empty() {
            match rx.blocking_recv() {
                Some(cmd) => apply(&mut queue, cmd),
                None => break,
            }
        }
        while let Ok(cmd) = rx.try_recv() {
            apply(&mut queue, cmd);
        }
        queue.play_next();
    }
    log::info!("Playback worker stopped");
}

fn apply(queue: &mut PlaybackQueue, cmd: PlaybackCommand) {
    match cmd {
        PlaybackCommand::Chunk(chunk) => queue.push(chunk),
        PlaybackCommand::Clear => queue.clear(),
    }
}
