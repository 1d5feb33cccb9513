//! Boundary to the external AI inference provider.
//!
//! One uniform contract for the four AI capabilities the coach consumes:
//! speech-to-text, grammar analysis, reply generation, and text-to-speech.
//! Every call is a single request-response against the provider with no
//! retries at this layer; retry and fallback policy belongs to the callers.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::OpenAiGateway;
pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use types::{ChatRole, ChatTurn, CorrectionReport};

use std::future::Future;
use std::pin::Pin;

/// Boxed future type for gateway operations.
pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Uniform contract for submitting inference requests to an external
/// provider. Implementations are stateless per call.
pub trait InferenceGateway: Send + Sync {
    /// Transcribe recorded speech to text, optionally steered by a
    /// conversation context hint.
    fn transcribe(
        &self,
        audio: Vec<u8>,
        hint: Option<String>,
    ) -> GatewayFuture<'_, GatewayResult<String>>;

    /// Check a learner message for grammar mistakes.
    fn check_grammar(&self, text: &str) -> GatewayFuture<'_, GatewayResult<CorrectionReport>>;

    /// Generate a conversational reply to the learner.
    fn generate_reply(
        &self,
        message: &str,
        history: &[ChatTurn],
        persona: &str,
    ) -> GatewayFuture<'_, GatewayResult<String>>;

    /// Synthesize speech audio for a reply.
    fn synthesize_speech(&self, text: &str) -> GatewayFuture<'_, GatewayResult<Vec<u8>>>;

    /// Generic single-shot completion, used for auxiliary generation such
    /// as vocabulary entries.
    fn generate_text(&self, system: &str, prompt: &str)
    -> GatewayFuture<'_, GatewayResult<String>>;
}
