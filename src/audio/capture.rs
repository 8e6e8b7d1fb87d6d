//! Outbound capture pipeline: PCM frames → mu-law → session channel.
//!
//! Capture runs on a dedicated OS thread (NOT a tokio task) to keep
//! real-time reads away from the async network tasks. Start and stop
//! are idempotent because the voice-activity protocol toggles capture
//! on every turn boundary.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;

use super::device::{CaptureSource, SourceFactory};
use super::mulaw;
use crate::error::DeviceError;

/// Events emitted by the capture thread.
#[derive(Debug, PartialEq)]
pub enum AudioEvent {
    /// One mu-law encoded frame of captured speech.
    Frame(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Nominal capture sample rate (mono)
    pub sample_rate: u32,
    /// How much audio one emitted frame carries
    pub frame_duration_ms: u32,
}

impl CaptureConfig {
    /// Number of PCM samples per emitted frame.
    pub fn frame_samples(&self) -> usize {
        (self.sample_rate * self.frame_duration_ms / 1000) as usize
    }
}

pub struct CapturePipeline {
    config: CaptureConfig,
    tx: mpsc::Sender<AudioEvent>,
    source_factory: SourceFactory,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CapturePipeline {
    pub fn new(config: CaptureConfig, source_factory: SourceFactory, tx: mpsc::Sender<AudioEvent>) -> Self {
        Self {
            config,
            tx,
            source_factory,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Start capturing. A no-op when already started. Fails with
    /// `DeviceError::Unavailable` if the device cannot be opened; no
    /// thread is spawned and no partial frames are emitted in that case.
    pub fn start(&mut self) -> Result<(), DeviceError> {
        if self.handle.is_some() {
            return Ok(());
        }

        let source = (self.source_factory)()?;

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let config = self.config.clone();
        let tx = self.tx.clone();
        let handle = thread::Builder::new()
            .name("audio-capture".into())
            .spawn(move || {
                capture_thread(source, &config, tx, &running);
            })
            .map_err(|e| DeviceError::Io(e.to_string()))?;

        self.handle = Some(handle);
        Ok(())
    }

    /// Stop capturing and wait for the capture thread to exit. A no-op
    /// when already stopped. Once this returns, no further frame is
    /// emitted except the final flush of already-captured samples.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.running.store(false, Ordering::SeqCst);
        let _ = handle.join();
    }
}

impl Drop for CapturePipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

fn capture_thread(
    mut source: Box<dyn CaptureSource>,
    config: &CaptureConfig,
    tx: mpsc::Sender<AudioEvent>,
    running: &AtomicBool,
) {
    let frame_samples = config.frame_samples();

    // Accumulation buffer for PCM samples (i16)
    let mut accum_buf: Vec<i16> = Vec::with_capacity(frame_samples * 2);

    log::info!(
        "Capture started: rate={}, frame_duration={}ms, frame_samples={}",
        config.sample_rate,
        config.frame_duration_ms,
        frame_samples,
    );

    while running.load(Ordering::Relaxed) {
        match source.read_frame() {
            Ok(pcm) => {
                accum_buf.extend_from_slice(&pcm);

                // Encode complete frames
                while accum_buf.len() >= frame_samples {
                    // A stop request must win over a frame captured
                    // concurrently with it
                    if !running.load(Ordering::Relaxed) {
                        break;
                    }
                    let encoded = mulaw::encode_buffer(&accum_buf[..frame_samples]);
                    if tx.blocking_send(AudioEvent::Frame(encoded)).is_err() {
                        log::warn!("Failed to send capture frame, receiver dropped");
                        return;
                    }
                    accum_buf.drain(..frame_samples);
                }
            }
            Err(e) => {
                log::warn!("Capture read error: {}", e);
                break;
            }
        }
    }

    // Flush the partial frame held at stop time so buffered speech is
    // not lost on a voice-activity boundary
    if !accum_buf.is_empty() {
        let encoded = mulaw::encode_buffer(&accum_buf);
        if tx.blocking_send(AudioEvent::Frame(encoded)).is_err() {
            log::warn!("Failed to flush final capture frame, receiver dropped");
        }
    }

    log::info!("Capture stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Scripted source: yields the given frames once, then blocks in
    /// short sleeps so the thread stays responsive to stop.
    struct ScriptedSource {
        frames: Vec<Vec<i16>>,
    }

    impl CaptureSource for ScriptedSource {
        fn read_frame(&mut self) -> Result<Vec<i16>, DeviceError> {
            if self.frames.is_empty() {
                thread::sleep(Duration::from_millis(5));
                Ok(Vec::new())
            } else {
                Ok(self.frames.remove(0))
            }
        }
    }

    fn pipeline_with_frames(
        frames: Vec<Vec<i16>>,
        frame_duration_ms: u32,
    ) -> (CapturePipeline, mpsc::Receiver<AudioEvent>) {
        let (tx, rx) = mpsc::channel(64);
        let config = CaptureConfig {
            sample_rate: 1000,
            frame_duration_ms,
        };
        let frames = std::sync::Mutex::new(Some(frames));
        let factory: SourceFactory = Box::new(move || {
            let frames = frames.lock().unwrap().take().unwrap_or_default();
            Ok(Box::new(ScriptedSource { frames }))
        });
        (CapturePipeline::new(config, factory, tx), rx)
    }

    #[test]
    fn emits_encoded_frames_of_configured_size() {
        // 1000 Hz, 10 ms frames -> 10 samples per frame
        let (mut pipeline, mut rx) = pipeline_with_frames(vec![vec![0i16; 25]], 10);
        pipeline.start().unwrap();

        let AudioEvent::Frame(first) = rx.blocking_recv().unwrap();
        assert_eq!(first.len(), 10);
        assert!(first.iter().all(|&b| b == 0xFF));
        let AudioEvent::Frame(second) = rx.blocking_recv().unwrap();
        assert_eq!(second.len(), 10);

        // Remaining 5 samples flush on stop
        pipeline.stop();
        let AudioEvent::Frame(tail) = rx.blocking_recv().unwrap();
        assert_eq!(tail.len(), 5);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let (mut pipeline, mut rx) = pipeline_with_frames(vec![], 10);
        pipeline.start().unwrap();
        pipeline.start().unwrap();
        assert!(pipeline.is_running());

        pipeline.stop();
        pipeline.stop();
        assert!(!pipeline.is_running());

        // No frames, no duplicate flush
        assert!(rx.try_recv().is_err());

        // Restart after stop works
        pipeline.start().unwrap();
        assert!(pipeline.is_running());
        pipeline.stop();
    }

    #[test]
    fn no_frames_after_stop_returns() {
        let (mut pipeline, mut rx) = pipeline_with_frames(vec![vec![1i16; 10]], 10);
        pipeline.start().unwrap();
        let _ = rx.blocking_recv().unwrap();

        pipeline.stop();
        // stop() joined the thread; whatever was sent is already in the
        // channel and nothing more ever arrives
        while rx.try_recv().is_ok() {}
        thread::sleep(Duration::from_millis(20));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unavailable_device_fails_start_cleanly() {
        let (tx, mut rx) = mpsc::channel(4);
        let config = CaptureConfig {
            sample_rate: 1000,
            frame_duration_ms: 10,
        };
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        let factory: SourceFactory = Box::new(move || {
            attempts_clone.fetch_add(1, Ordering::SeqCst);
            Err(DeviceError::Unavailable("no microphone".into()))
        });
        let mut pipeline = CapturePipeline::new(config, factory, tx);

        assert!(matches!(
            pipeline.start(),
            Err(DeviceError::Unavailable(_))
        ));
        assert!(!pipeline.is_running());
        assert!(rx.try_recv().is_err());

        // Next explicit start retries the device
        let _ = pipeline.start();
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
