//! Application boundary for NFC scanning.
//!
//! Hosts with an NFC radio construct the manager over their
//! [`NfcHardwareProtocol`] implementation; hosts without one use
//! [`NfcSessionManager::new_unavailable`] and get an inert façade with the
//! same surface.

use std::sync::Arc;

use flume::{Receiver, Sender};
use parking_lot::RwLock;
use tracing::debug;

use crate::{
    reader::{NfcHardwareProtocol, TagHandle, TagReader},
    reporter::{self, DetectedMessage},
    session::{InvalidationReason, SessionConfig, SessionState},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash, uniffi::Enum)]
pub enum NfcManagerReconcileMessage {
    /// One or more NDEF messages were appended to the session
    NfcDetected { messages: Vec<DetectedMessage> },
    /// The session ended for a reason worth showing to the user
    SessionFailed { description: String },
}

#[uniffi::export(callback_interface)]
pub trait NfcManagerReconciler: Send + Sync + std::fmt::Debug + 'static {
    /// Tells the frontend to reconcile with the new state
    fn reconcile(&self, message: NfcManagerReconcileMessage);
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error, uniffi::Error)]
pub enum NfcSessionError {
    #[error("this device doesn't support tag scanning")]
    CapabilityUnavailable,
}

pub type Error = NfcSessionError;

#[derive(Debug)]
enum Backend {
    Native(TagReader),
    Stub,
}

#[derive(Debug, uniffi::Object)]
pub struct NfcSessionManager {
    backend: Backend,
    pub reconciler: Sender<NfcManagerReconcileMessage>,
    pub reconcile_receiver: Arc<Receiver<NfcManagerReconcileMessage>>,
    listeners: Arc<RwLock<Vec<Box<dyn NfcManagerReconciler>>>>,
}

#[uniffi::export]
impl NfcSessionManager {
    #[uniffi::constructor(default(config = None))]
    pub fn new(hardware: Box<dyn NfcHardwareProtocol>, config: Option<SessionConfig>) -> Self {
        crate::logging::init();

        let (sender, receiver) = flume::bounded(1000);
        let reader = TagReader::new(hardware, config.unwrap_or_default(), sender.clone());

        Self::with_backend(Backend::Native(reader), sender, receiver)
    }

    /// Façade for environments without an NFC radio. Starting a session is a
    /// no-op that succeeds, and no detection event ever fires.
    #[uniffi::constructor]
    pub fn new_unavailable() -> Self {
        crate::logging::init();

        let (sender, receiver) = flume::bounded(1000);
        Self::with_backend(Backend::Stub, sender, receiver)
    }

    /// Begin a scan. Resolves as soon as the session starts and never
    /// carries the scan result.
    #[uniffi::method]
    pub fn start_nfc_session(&self) -> Result<(), NfcSessionError> {
        match &self.backend {
            Backend::Native(reader) => reader.start(),
            Backend::Stub => {
                debug!("NFC unavailable, starting a session is a no-op");
                Ok(())
            }
        }
    }

    #[uniffi::method]
    pub fn listen_for_updates(&self, reconciler: Box<dyn NfcManagerReconciler>) {
        self.listeners.write().push(reconciler);
    }

    #[uniffi::method]
    pub fn remove_all_listeners(&self) {
        self.listeners.write().clear();
    }

    /// Push the current accumulated messages to the listeners, for hosts
    /// that turned off per-detection notifications.
    #[uniffi::method]
    pub fn notify_detected_messages(&self) {
        let messages = self.detected_messages();
        if let Err(error) = self
            .reconciler
            .try_send(NfcManagerReconcileMessage::NfcDetected { messages })
        {
            tracing::warn!("unable to send reconcile message: {error}");
        }
    }

    // MARK: hardware delegate forwards

    #[uniffi::method]
    pub fn session_became_active(&self) {
        if let Backend::Native(reader) = &self.backend {
            reader.session_became_active();
        }
    }

    #[uniffi::method]
    pub fn tags_detected(&self, tags: Vec<TagHandle>) {
        if let Backend::Native(reader) = &self.backend {
            reader.tags_detected(tags);
        }
    }

    #[uniffi::method]
    pub fn ndef_detected(&self, payloads: Vec<Vec<u8>>) {
        if let Backend::Native(reader) = &self.backend {
            reader.ndef_detected(payloads);
        }
    }

    #[uniffi::method]
    pub fn session_invalidated(&self, reason: InvalidationReason) {
        if let Backend::Native(reader) = &self.backend {
            reader.session_invalidated(reason);
        }
    }

    // MARK: introspection

    #[uniffi::method]
    pub fn state(&self) -> SessionState {
        match &self.backend {
            Backend::Native(reader) => reader.state(),
            Backend::Stub => SessionState::Idle,
        }
    }

    #[uniffi::method]
    pub fn status_message(&self) -> Option<String> {
        match &self.backend {
            Backend::Native(reader) => reader.status_message(),
            Backend::Stub => None,
        }
    }

    #[uniffi::method]
    pub fn detected_messages(&self) -> Vec<DetectedMessage> {
        match &self.backend {
            Backend::Native(reader) => reporter::report(&reader.detected_messages()),
            Backend::Stub => Vec::new(),
        }
    }
}

impl NfcSessionManager {
    fn with_backend(
        backend: Backend,
        sender: Sender<NfcManagerReconcileMessage>,
        receiver: Receiver<NfcManagerReconcileMessage>,
    ) -> Self {
        let receiver = Arc::new(receiver);
        let listeners: Arc<RwLock<Vec<Box<dyn NfcManagerReconciler>>>> =
            Arc::new(RwLock::new(Vec::new()));

        let drain_receiver = receiver.clone();
        let drain_listeners = listeners.clone();
        std::thread::spawn(move || {
            while let Ok(message) = drain_receiver.recv() {
                // fan out to every registered frontend listener
                for listener in drain_listeners.read().iter() {
                    listener.reconcile(message.clone());
                }
            }
        });

        Self {
            backend,
            reconciler: sender,
            reconcile_receiver: receiver,
            listeners,
        }
    }
}

mod ffi {
    /// Version and build provenance for host side debug screens.
    #[uniffi::export]
    fn build_info() -> String {
        format!(
            "cardlink {} ({} {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHORT_HASH"),
            env!("BUILD_PROFILE")
        )
    }
}
