//! Tag session lifecycle: single tag detection, multi tag retry, connect,
//! read, decode, report, invalidate.
//!
//! Hardware delegate callbacks are forwarded in as events on [`TagReader`];
//! the reader runs them through the session state machine and talks back to
//! the radio through [`NfcHardwareProtocol`].

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use flume::Sender;
use parking_lot::Mutex;
use tracing::{debug, warn};

use cardlink_ndef::{NdefMessage, decode_text};

use crate::{
    manager::{NfcManagerReconcileMessage, NfcSessionError},
    reporter,
    session::{InvalidationReason, ScanSession, SessionConfig, SessionState},
    task,
};

const CONNECT_FAILED_MESSAGE: &str = "Unable to connect to tag.";
const READ_FAILED_MESSAGE: &str = "Fail to read NDEF from tag";
const FOUND_MESSAGE: &str = "Found 1 NDEF message";

uniffi::custom_newtype!(TagHandle, u64);

/// Opaque handle for a tag object the host is holding on our behalf.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    derive_more::Display,
    derive_more::From,
    derive_more::Into,
)]
pub struct TagHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error, uniffi::Error)]
pub enum TagTransportError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("read failed: {0}")]
    ReadFailed(String),

    #[error("tag left the field: {0}")]
    TagLost(String),
}

/// The hardware radio, implemented by the host.
#[uniffi::export(callback_interface)]
pub trait NfcHardwareProtocol: Send + Sync + Debug + 'static {
    /// Whether this device can scan for NDEF tags right now
    fn is_reading_available(&self) -> bool;

    /// Begin a hardware scanning session
    fn begin_session(&self);

    /// Restart polling within the current session
    fn restart_polling(&self);

    /// Update the operator facing status of the scanning UI
    fn set_status_message(&self, message: String);

    /// Connect to a detected tag
    fn connect(&self, tag: TagHandle) -> Result<(), TagTransportError>;

    /// Read the raw NDEF bytes from a connected tag
    fn read_ndef(&self, tag: TagHandle) -> Result<Vec<u8>, TagTransportError>;

    /// End the hardware session
    fn invalidate_session(&self);
}

#[derive(Debug)]
struct ReaderInner {
    hardware: Box<dyn NfcHardwareProtocol>,
    config: SessionConfig,
    session: Mutex<Option<ScanSession>>,
    reconciler: Sender<NfcManagerReconcileMessage>,
}

/// Owns the one active [`ScanSession`] and drives it through its lifecycle.
#[derive(Debug, Clone)]
pub struct TagReader(Arc<ReaderInner>);

impl TagReader {
    pub fn new(
        hardware: Box<dyn NfcHardwareProtocol>,
        config: SessionConfig,
        reconciler: Sender<NfcManagerReconcileMessage>,
    ) -> Self {
        Self(Arc::new(ReaderInner {
            hardware,
            config,
            session: Mutex::new(None),
            reconciler,
        }))
    }

    /// Current lifecycle state, `Idle` when no session exists.
    pub fn state(&self) -> SessionState {
        self.0
            .session
            .lock()
            .as_ref()
            .map(|session| session.state)
            .unwrap_or(SessionState::Idle)
    }

    pub fn status_message(&self) -> Option<String> {
        self.0
            .session
            .lock()
            .as_ref()
            .and_then(|session| session.status_message.clone())
    }

    /// Everything the current session accumulated so far.
    pub fn detected_messages(&self) -> Vec<NdefMessage> {
        self.0
            .session
            .lock()
            .as_ref()
            .map(|session| session.messages.clone())
            .unwrap_or_default()
    }

    /// Start scanning. Fails synchronously when the device cannot scan;
    /// every later failure arrives through status updates and notifications
    /// instead.
    pub fn start(&self) -> Result<(), NfcSessionError> {
        if !self.0.hardware.is_reading_available() {
            warn!("NFC reading is not available on this device");
            return Err(NfcSessionError::CapabilityUnavailable);
        }

        let replaced_live = {
            let mut session = self.0.session.lock();
            let was_live = session.as_ref().map(ScanSession::is_live).unwrap_or(false);
            *session = Some(ScanSession::new(&self.0.config.prompt_message));
            was_live
        };

        if replaced_live {
            debug!("replacing a live scan session");
            self.0.hardware.invalidate_session();
        }

        self.0
            .hardware
            .set_status_message(self.0.config.prompt_message.clone());
        self.0.hardware.begin_session();

        debug!("scan session started");
        Ok(())
    }

    /// Hardware delegate: the session began polling.
    pub fn session_became_active(&self) {
        let mut guard = self.0.session.lock();
        if let Some(session) = guard.as_mut() {
            if session.state == SessionState::Active {
                session.state = SessionState::AwaitingTag;
            }
        }
    }

    /// Hardware delegate: one or more tags entered the field.
    ///
    /// More than one tag is rejected and polling restarts after the
    /// configured delay; exactly one tag moves the session into the
    /// connect and read flow on a background task.
    pub fn tags_detected(&self, tags: Vec<TagHandle>) {
        let selected = {
            let mut guard = self.0.session.lock();
            let Some(session) = guard.as_mut() else {
                debug!("tag detection without a session, ignoring");
                return;
            };

            if !matches!(
                session.state,
                SessionState::Active | SessionState::AwaitingTag
            ) {
                debug!(state = ?session.state, "tag detection in a non-waiting state, ignoring");
                return;
            }

            if tags.len() > 1 {
                session.state = SessionState::AwaitingTag;
                session.set_status(&self.0.config.multi_tag_message);
                None
            } else if let Some(tag) = tags.first().copied() {
                session.state = SessionState::Connecting;
                Some(tag)
            } else {
                debug!("empty tag detection event, ignoring");
                return;
            }
        };

        match selected {
            None => self.schedule_polling_restart(),
            Some(tag) => {
                let me = self.clone();
                task::spawn(async move { me.connect_and_read(tag) });
            }
        }
    }

    /// Hardware delegate: raw NDEF messages detected by the radio. This
    /// stream is independent of the connect and read flow; both append to
    /// the same session.
    pub fn ndef_detected(&self, payloads: Vec<Vec<u8>>) {
        for payload in payloads {
            match NdefMessage::parse(&payload) {
                Ok(message) => self.append_message(message),
                Err(error) => debug!("skipping undecodable detected message: {error}"),
            }
        }
    }

    /// Hardware delegate: the session ended. Idempotent, only the first call
    /// for a session is observed; non-benign reasons are surfaced to the
    /// frontend as a display-only notice.
    pub fn session_invalidated(&self, reason: InvalidationReason) {
        let cleared = self.0.session.lock().take();
        if cleared.is_none() {
            debug!("invalidation for an already cleared session, ignoring");
            return;
        }

        if reason.is_benign() {
            debug!("session invalidated: {}", reason.description());
            return;
        }

        warn!("session invalidated with error: {}", reason.description());
        self.emit(NfcManagerReconcileMessage::SessionFailed {
            description: reason.description(),
        });
    }
}

impl TagReader {
    fn schedule_polling_restart(&self) {
        self.0
            .hardware
            .set_status_message(self.0.config.multi_tag_message.clone());

        let me = self.clone();
        let delay = Duration::from_millis(self.0.config.retry_delay_ms as u64);

        task::spawn(async move {
            tokio::time::sleep(delay).await;

            let still_waiting = me
                .0
                .session
                .lock()
                .as_ref()
                .map(|session| session.state == SessionState::AwaitingTag)
                .unwrap_or(false);

            if still_waiting {
                debug!("restarting polling after multi tag detection");
                me.0.hardware.restart_polling();
            }
        });
    }

    fn connect_and_read(&self, tag: TagHandle) {
        debug!("connecting to tag {tag}");

        if let Err(error) = self.0.hardware.connect(tag) {
            warn!("unable to connect to tag {tag}: {error}");
            self.update_status(CONNECT_FAILED_MESSAGE);
            self.set_state(SessionState::Invalidated);
            self.0.hardware.invalidate_session();
            return;
        }

        self.set_state(SessionState::Reading);

        let message = match self.0.hardware.read_ndef(tag) {
            Ok(bytes) => match NdefMessage::parse(&bytes) {
                Ok(message) => Some(message),
                Err(error) => {
                    warn!("tag returned undecodable NDEF data: {error}");
                    None
                }
            },
            Err(error) => {
                warn!("failed to read NDEF from tag {tag}: {error}");
                None
            }
        };

        let status = match message {
            None => READ_FAILED_MESSAGE.to_string(),
            Some(message) => {
                let text = decode_text(&message.records);
                self.append_message(message);

                if text.is_empty() {
                    FOUND_MESSAGE.to_string()
                } else {
                    format!("Message: {text}")
                }
            }
        };

        self.set_state(SessionState::Reporting);
        self.update_status(status);
        self.set_state(SessionState::Invalidated);
        self.0.hardware.invalidate_session();
    }

    /// Append to the session's accumulated messages, notifying listeners
    /// when configured to do so. Dropped silently once the session is gone.
    fn append_message(&self, message: NdefMessage) {
        let notification = {
            let mut guard = self.0.session.lock();
            let Some(session) = guard.as_mut().filter(|session| session.is_live()) else {
                debug!("dropping message for an invalidated session");
                return;
            };

            session.messages.push(message);

            self.0
                .config
                .emit_on_every_detection
                .then(|| reporter::report(&session.messages))
        };

        if let Some(messages) = notification {
            self.emit(NfcManagerReconcileMessage::NfcDetected { messages });
        }
    }

    fn set_state(&self, state: SessionState) {
        let mut guard = self.0.session.lock();
        if let Some(session) = guard.as_mut() {
            if session.is_live() {
                session.state = state;
            }
        }
    }

    fn update_status(&self, status: impl Into<String>) {
        let status = status.into();

        {
            let mut guard = self.0.session.lock();
            if let Some(session) = guard.as_mut() {
                session.set_status(status.clone());
            }
        }

        self.0.hardware.set_status_message(status);
    }

    fn emit(&self, message: NfcManagerReconcileMessage) {
        if let Err(error) = self.0.reconciler.try_send(message) {
            warn!("unable to send reconcile message: {error}");
        }
    }
}
