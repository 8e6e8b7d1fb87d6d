/// Session lifecycle. Exactly one session per process; transitions are
/// driven only by transport lifecycle events and voice-activity signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Listening,
    Speaking,
    Closed,
}

impl SessionState {
    /// True while the transport is open and messages should be processed.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Listening | SessionState::Speaking)
    }
}
