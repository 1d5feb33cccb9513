//! Boundary trait for the chat transport.
//!
//! The route layer that talks to the actual chat platform implements
//! [`Transport`]; the pipeline only ever fetches inbound audio and
//! delivers outbound replies through it.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use crate::ids::UserId;

/// Boxed future type for transport operations.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Error type for transport operations.
#[derive(Debug)]
pub struct TransportError(pub String);

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TransportError {}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Opaque reference to an inbound audio attachment, as named by the
/// transport (a platform file id, a URL, a path).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioRef(pub String);

impl AudioRef {
    /// Wrap a transport-level audio reference.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }
}

/// Delivery boundary consumed by the pipeline.
pub trait Transport: Send + Sync {
    /// Download an inbound audio attachment into `dest`.
    fn fetch_audio(
        &self,
        user: UserId,
        audio: &AudioRef,
        dest: &Path,
    ) -> TransportFuture<'_, TransportResult<()>>;

    /// Deliver a plain text message to the user.
    fn send_text(&self, user: UserId, text: &str) -> TransportFuture<'_, TransportResult<()>>;

    /// Deliver a voice reply from a local audio file.
    fn send_voice(&self, user: UserId, audio: &Path) -> TransportFuture<'_, TransportResult<()>>;
}

/// Transport stub that records outbound traffic instead of sending it.
/// Useful in tests and for dry runs.
#[derive(Default)]
pub struct RecordingTransport {
    /// Audio bytes handed out by `fetch_audio`; `None` makes fetching fail.
    pub inbound_audio: Option<Vec<u8>>,
    /// Text messages delivered, in order.
    pub sent_texts: std::sync::Mutex<Vec<(UserId, String)>>,
    /// Voice files delivered, in order.
    pub sent_voices: std::sync::Mutex<Vec<(UserId, PathBuf)>>,
}

impl RecordingTransport {
    /// Create a transport that serves the given inbound audio bytes.
    #[must_use]
    pub fn with_audio(audio: Vec<u8>) -> Self {
        Self {
            inbound_audio: Some(audio),
            ..Self::default()
        }
    }

    /// Texts delivered so far.
    #[must_use]
    pub fn texts(&self) -> Vec<(UserId, String)> {
        self.sent_texts.lock().map(|texts| texts.clone()).unwrap_or_default()
    }

    /// Voice deliveries so far.
    #[must_use]
    pub fn voices(&self) -> Vec<(UserId, PathBuf)> {
        self.sent_voices
            .lock()
            .map(|voices| voices.clone())
            .unwrap_or_default()
    }
}

impl Transport for RecordingTransport {
    fn fetch_audio(
        &self,
        _user: UserId,
        audio: &AudioRef,
        dest: &Path,
    ) -> TransportFuture<'_, TransportResult<()>> {
        let reference = audio.0.clone();
        let dest = dest.to_path_buf();
        Box::pin(async move {
            let bytes = self
                .inbound_audio
                .clone()
                .ok_or_else(|| TransportError(format!("no audio for {reference}")))?;
            tokio::fs::write(&dest, bytes)
                .await
                .map_err(|err| TransportError(err.to_string()))
        })
    }

    fn send_text(&self, user: UserId, text: &str) -> TransportFuture<'_, TransportResult<()>> {
        let text = text.to_string();
        Box::pin(async move {
            if let Ok(mut texts) = self.sent_texts.lock() {
                texts.push((user, text));
            }
            Ok(())
        })
    }

    fn send_voice(&self, user: UserId, audio: &Path) -> TransportFuture<'_, TransportResult<()>> {
        let audio = audio.to_path_buf();
        Box::pin(async move {
            if let Ok(mut voices) = self.sent_voices.lock() {
                voices.push((user, audio));
            }
            Ok(())
        })
    }
}
