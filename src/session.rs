//! Scan session state owned by the tag reader.

use cardlink_macros::impl_default_for;
use cardlink_ndef::NdefMessage;

/// Lifecycle of a single scanning attempt. `Invalidated` is terminal, a new
/// session is required to scan again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, uniffi::Enum)]
pub enum SessionState {
    Idle,
    Active,
    AwaitingTag,
    Connecting,
    Reading,
    Reporting,
    Invalidated,
}

/// Why the hardware session ended.
#[derive(Debug, Clone, PartialEq, Eq, Hash, uniffi::Enum)]
pub enum InvalidationReason {
    /// Ended after successfully reading the first tag
    FirstTagRead,
    /// The user dismissed the scanning UI
    UserCanceled,
    /// The radio gave up waiting for a tag
    Timeout,
    Other { description: String },
}

impl InvalidationReason {
    /// Benign reasons are not surfaced to the user.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::FirstTagRead | Self::UserCanceled)
    }

    pub fn description(&self) -> String {
        match self {
            Self::FirstTagRead => "session ended after first tag read".to_string(),
            Self::UserCanceled => "session canceled by user".to_string(),
            Self::Timeout => "session timed out".to_string(),
            Self::Other { description } => description.clone(),
        }
    }
}

/// One active scanning attempt and everything it accumulated.
#[derive(Debug, Clone)]
pub struct ScanSession {
    pub state: SessionState,
    pub messages: Vec<NdefMessage>,
    pub status_message: Option<String>,
}

impl ScanSession {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            state: SessionState::Active,
            messages: Vec::new(),
            status_message: Some(prompt.into()),
        }
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status_message = Some(status.into());
    }

    pub fn is_live(&self) -> bool {
        self.state != SessionState::Invalidated
    }
}

/// Operator facing messages and timing knobs for a scan session.
#[derive(Debug, Clone, uniffi::Record)]
pub struct SessionConfig {
    /// Shown when the session starts
    pub prompt_message: String,
    /// Shown while more than one tag is in the field
    pub multi_tag_message: String,
    /// Delay before polling restarts after a multi tag detection
    pub retry_delay_ms: u32,
    /// Emit a detection notification on every append to the session
    pub emit_on_every_detection: bool,
}

impl_default_for!(SessionConfig);
impl SessionConfig {
    pub fn new() -> Self {
        Self {
            prompt_message: "Hold your card near the reader.".to_string(),
            multi_tag_message: "More than 1 tag is detected, please remove all tags and try again."
                .to_string(),
            retry_delay_ms: 500,
            emit_on_every_detection: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.retry_delay_ms, 500);
        assert!(config.emit_on_every_detection);
    }

    #[test]
    fn benign_reasons() {
        assert!(InvalidationReason::FirstTagRead.is_benign());
        assert!(InvalidationReason::UserCanceled.is_benign());
        assert!(!InvalidationReason::Timeout.is_benign());
        assert!(
            !InvalidationReason::Other {
                description: "radio error".to_string()
            }
            .is_benign()
        );
    }

    #[test]
    fn new_session_starts_active_with_prompt() {
        let session = ScanSession::new("present your card");
        assert_eq!(session.state, SessionState::Active);
        assert!(session.messages.is_empty());
        assert_eq!(session.status_message.as_deref(), Some("present your card"));
        assert!(session.is_live());
    }
}
