//! Session controller: owns the turn-taking state machine, the inbound
//! accumulator, and the capture pipeline, and routes transport messages
//! to the playback worker.

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::audio::capture::{AudioEvent, CapturePipeline};
use crate::audio::playback::{EncodedChunk, PlaybackCommand};
use crate::audio::Accumulator;
use crate::error::AgentError;
use crate::net_link::{NetCommand, NetEvent};
use crate::protocol::{self, AudioInMessage, ServerMessage};
use crate::state_machine::SessionState;

pub struct SessionController {
    state: SessionState,
    next_seq: u64,
    accumulator: Accumulator,
    capture: CapturePipeline,
    net_tx: mpsc::Sender<NetCommand>,
    playback_tx: mpsc::Sender<PlaybackCommand>,
    error_tx: mpsc::Sender<AgentError>,
}

impl SessionController {
    pub fn new(
        accumulator: Accumulator,
        capture: CapturePipeline,
        net_tx: mpsc::Sender<NetCommand>,
        playback_tx: mpsc::Sender<PlaybackCommand>,
        error_tx: mpsc::Sender<AgentError>,
    ) -> Self {
        Self {
            state: SessionState::Idle,
            next_seq: 0,
            accumulator,
            capture,
            net_tx,
            playback_tx,
            error_tx,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn capture_running(&self) -> bool {
        self.capture.is_running()
    }

    /// The transport task has been launched; the setup handshake is on
    /// its way.
    pub fn connect_requested(&mut self) {
        self.state = SessionState::Connecting;
    }

    pub async fn handle_net_event(&mut self, event: NetEvent) {
        match event {
            NetEvent::Connected => {
                log::info!("WebSocket connected, session is listening");
                self.state = SessionState::Listening;
                self.start_capture();
            }
            NetEvent::Message(msg) => {
                if !self.state.is_active() {
                    log::warn!("Dropping server message in state {:?}", self.state);
                    return;
                }
                self.handle_server_message(msg).await;
            }
            NetEvent::Disconnected => {
                log::info!("WebSocket disconnected, closing session");
                self.close().await;
            }
        }
    }

    async fn handle_server_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::VoiceActivityStart => {
                // Barge-in: flush what was already captured of the
                // user's speech and keep the microphone hot
                log::info!("Voice activity started");
                self.restart_capture();
            }
            ServerMessage::VoiceActivityEnd => {
                log::info!("Voice activity ended");
                self.restart_capture();
                self.state = SessionState::Listening;
            }
            ServerMessage::AudioStream { data } => {
                let bytes = match protocol::decode_audio_payload(&data) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        log::warn!("Ignoring undecodable audioStream payload: {}", e);
                        return;
                    }
                };
                if self.state == SessionState::Listening {
                    self.state = SessionState::Speaking;
                }
                if let Some(chunk) = self.accumulator.append(&bytes, Instant::now()) {
                    self.send_chunk(chunk).await;
                }
            }
            ServerMessage::NewAudioStream => {
                // Partial bytes of the previous stream belong to an
                // utterance that was superseded
                log::info!("New audio stream, resetting accumulation");
                self.accumulator.reset();
            }
            ServerMessage::Error { code, message } => {
                log::error!("Server error {}: {}", code, message);
                let _ = self.error_tx.send(AgentError { code, message }).await;
            }
            ServerMessage::Unknown => {
                log::warn!("Unhandled server message type");
            }
        }
    }

    /// Forward one captured frame as an `audioIn` message.
    pub async fn handle_audio_event(&mut self, event: AudioEvent) {
        let AudioEvent::Frame(encoded) = event;
        if encoded.is_empty() || !self.state.is_active() {
            return;
        }
        let msg = AudioInMessage::new(&encoded);
        match serde_json::to_string(&msg) {
            Ok(json) => {
                if let Err(e) = self.net_tx.send(NetCommand::SendText(json)).await {
                    log::error!("Failed to send audio to NetLink: {}", e);
                }
            }
            Err(e) => log::error!("Failed to serialize audioIn: {}", e),
        }
    }

    /// Next instant at which buffered inbound audio must be flushed.
    pub fn flush_deadline(&self) -> Option<Instant> {
        self.accumulator.deadline()
    }

    /// Deadline-driven flush: a short tail of streamed audio is never
    /// held past the configured maximum wait.
    pub async fn flush_accumulator(&mut self) {
        if let Some(chunk) = self.accumulator.take_due(Instant::now()) {
            self.send_chunk(chunk).await;
        }
    }

    /// Tear the session down after transport loss. Terminal.
    pub async fn close(&mut self) {
        self.capture.stop();
        self.accumulator.reset();
        let _ = self.playback_tx.send(PlaybackCommand::Clear).await;
        self.state = SessionState::Closed;
    }

    async fn send_chunk(&mut self, data: Bytes) {
        let chunk = EncodedChunk {
            seq: self.next_seq,
            data,
        };
        self.next_seq += 1;
        if let Err(e) = self.playback_tx.send(PlaybackCommand::Chunk(chunk)).await {
            log::error!("Failed to enqueue playback chunk: {}", e);
        }
    }

    fn start_capture(&mut self) {
        if let Err(e) = self.capture.start() {
            // Fatal to the pipeline only; the session stays open and a
            // later start retries the device
            log::error!("Capture unavailable: {}", e);
        }
    }

    /// Stop-flush-restart on a voice-activity boundary. The stop joins
    /// the capture thread, so its final flushed frame is already in the
    /// audio channel before capture resumes.
    fn restart_capture(&mut self) {
        self.capture.stop();
        self.start_capture();
    }
}
