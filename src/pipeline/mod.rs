//! Per-message orchestration.
//!
//! One inbound message produces exactly one outbound reply or one
//! user-visible notice, plus exactly the analytics and context side
//! effects its progress implies. Stages that depend on each other run
//! sequentially; grammar analysis and reply generation run concurrently
//! behind an explicit join barrier. Temporary audio never outlives the
//! run, wherever the run exits.

pub mod error;
pub mod reply_cache;
pub mod temp_audio;
pub mod transport;

pub use error::{PipelineError, PipelineResult};
pub use reply_cache::{ReplyCache, ReplyCacheConfig};
pub use temp_audio::TempAudio;
pub use transport::{
    AudioRef, RecordingTransport, Transport, TransportError, TransportFuture, TransportResult,
};

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::analytics::{AnalyticsAggregator, MessageKind};
use crate::context::ContextStore;
use crate::gateway::{CorrectionReport, InferenceGateway};
use crate::ids::{MessageId, UserId};
use crate::sync::SyncRelay;

/// Notice sent when a user without a profile writes to the coach.
pub const NO_PROFILE_NOTICE: &str = "Please start with /start to create your profile first! 😊";

/// Notice sent when speech could not be recognized.
pub const RECOGNITION_FAILED_NOTICE: &str =
    "Извините, не удалось распознать речь. Попробуйте еще раз.";

/// Generic apology for a failed voice pipeline run.
pub const VOICE_FAILURE_NOTICE: &str = "😔 Извините, произошла ошибка при обработке голосового \
сообщения. Пожалуйста, попробуйте еще раз.";

/// Generic apology for a failed text pipeline run.
pub const TEXT_FAILURE_NOTICE: &str =
    "😔 Sorry, an error occurred while processing your message. Please try again!";

/// Correction notice for a voice message: transcript plus findings.
fn voice_correction_notice(transcript: &str, report: &CorrectionReport) -> String {
    format!(
        "📝 Распознанный текст:\n{transcript}\n\n❌ Найдены ошибки:\n{}\n\nПродолжаю диалог...",
        report.text()
    )
}

/// Correction notice for a text message.
fn text_correction_notice(text: &str, report: &CorrectionReport) -> String {
    format!(
        "📝 Your message:\n{text}\n\n❌ Grammar check:\n{}\n\nI'll respond anyway... 😊",
        report.text()
    )
}

/// Orchestrates one inbound message end-to-end.
pub struct MessagePipeline {
    gateway: Arc<dyn InferenceGateway>,
    transport: Arc<dyn Transport>,
    context: Arc<ContextStore>,
    analytics: Arc<AnalyticsAggregator>,
    relay: Arc<SyncRelay>,
    replies: ReplyCache,
    temp_dir: PathBuf,
    turn_locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl MessagePipeline {
    /// Wire a pipeline from its collaborators.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn InferenceGateway>,
        transport: Arc<dyn Transport>,
        context: Arc<ContextStore>,
        analytics: Arc<AnalyticsAggregator>,
        relay: Arc<SyncRelay>,
        temp_dir: PathBuf,
        cache_config: &ReplyCacheConfig,
    ) -> Self {
        Self {
            gateway,
            transport,
            context,
            analytics,
            relay,
            replies: ReplyCache::new(cache_config),
            temp_dir,
            turn_locks: DashMap::new(),
        }
    }

    /// Per-user lock keeping one user's messages in arrival order; users
    /// never contend with each other.
    fn turn_lock(&self, user: UserId) -> Arc<Mutex<()>> {
        self.turn_locks.entry(user).or_default().clone()
    }

    /// Best-effort notice delivery; a transport failure here is logged
    /// and swallowed so it cannot mask the original outcome.
    async fn notify(&self, user: UserId, text: &str) {
        if let Err(err) = self.transport.send_text(user, text).await {
            warn!(%user, %err, "Failed to deliver notice");
        }
    }

    /// Process one voice message. Sends exactly one reply or notice.
    pub async fn process_voice_message(&self, user: UserId, message: MessageId, audio: AudioRef) {
        let lock = self.turn_lock(user);
        let _guard = lock.lock().await;

        if let Err(err) = self.run_voice(user, message, &audio).await {
            error!(%user, %message, %err, "Voice pipeline failed");
            self.notify(user, VOICE_FAILURE_NOTICE).await;
        }
    }

    /// Process one text message. Sends exactly one reply or notice.
    pub async fn process_text_message(&self, user: UserId, message: MessageId, text: &str) {
        let lock = self.turn_lock(user);
        let _guard = lock.lock().await;

        if let Err(err) = self.run_text(user, text).await {
            error!(%user, %message, %err, "Text pipeline failed");
            self.notify(user, TEXT_FAILURE_NOTICE).await;
        }
    }

    /// Text form of an already-delivered voice reply, for "show
    /// transcription" requests from the route layer.
    pub async fn transcription(&self, user: UserId, message: MessageId) -> Option<String> {
        self.replies.get(user, message).await
    }

    async fn run_voice(
        &self,
        user: UserId,
        message: MessageId,
        audio: &AudioRef,
    ) -> PipelineResult<()> {
        if !self.context.has_profile(user) {
            self.notify(user, NO_PROFILE_NOTICE).await;
            return Ok(());
        }

        // Download into a scoped temp file; the guard removes it on every
        // exit path below.
        let inbound = TempAudio::create(&self.temp_dir, "voice", "ogg").await?;
        self.transport.fetch_audio(user, audio, inbound.path()).await?;
        let audio_bytes = tokio::fs::read(inbound.path()).await?;

        let hint = self.context.transcription_hint(user);
        let transcript = match self.gateway.transcribe(audio_bytes, hint).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                info!(%user, "Transcription came back empty");
                self.notify(user, RECOGNITION_FAILED_NOTICE).await;
                return Ok(());
            }
            Err(err) => {
                warn!(%user, %err, "Transcription failed");
                self.notify(user, RECOGNITION_FAILED_NOTICE).await;
                return Ok(());
            }
        };
        drop(inbound);
        info!(%user, chars = transcript.len(), "Transcribed voice message");

        // The message counts from here on, even if a later stage fails.
        self.analytics.record_message(user, MessageKind::Voice).await?;
        let _ = self.relay.track_message(user, MessageKind::Voice).await;

        let reply = self
            .converse(user, &transcript, |report| {
                voice_correction_notice(&transcript, report)
            })
            .await?;

        let speech = self.gateway.synthesize_speech(&reply).await?;
        let outbound = TempAudio::create(&self.temp_dir, "reply", "mp3").await?;
        outbound.write(&speech).await?;
        self.transport.send_voice(user, outbound.path()).await?;

        // Keep the text form around for a "show transcription" request.
        self.replies.insert(user, message, reply).await;
        info!(%user, %message, "Voice reply delivered");
        Ok(())
    }

    async fn run_text(&self, user: UserId, text: &str) -> PipelineResult<()> {
        if !self.context.has_profile(user) {
            self.notify(user, NO_PROFILE_NOTICE).await;
            return Ok(());
        }

        self.analytics.record_message(user, MessageKind::Text).await?;
        let _ = self.relay.track_message(user, MessageKind::Text).await;

        let reply = self
            .converse(user, text, |report| text_correction_notice(text, report))
            .await?;

        self.transport.send_text(user, &reply).await?;
        info!(%user, "Text reply delivered");
        Ok(())
    }

    /// Shared middle of both pipelines: run grammar analysis and reply
    /// generation concurrently, surface findings, then commit both turns
    /// to the context. Returns the generated reply.
    async fn converse<F>(
        &self,
        user: UserId,
        message_text: &str,
        correction_notice: F,
    ) -> PipelineResult<String>
    where
        F: FnOnce(&CorrectionReport) -> String,
    {
        let history = self.context.history(user);
        let persona = self
            .context
            .profile(user)
            .unwrap_or_default()
            .persona_line();

        // Explicit join: both operations finish (or fail) before anything
        // downstream runs.
        let (grammar_result, reply_result) = tokio::join!(
            self.gateway.check_grammar(message_text),
            self.gateway.generate_reply(message_text, &history, &persona),
        );
        let report = grammar_result?;
        let reply = reply_result?;

        if !report.is_clean() {
            self.notify(user, &correction_notice(&report)).await;
            let counted = self.analytics.record_errors(user, report.text()).await?;
            info!(%user, counted, "Grammar findings recorded");
            let _ = self.relay.track_errors(user, report.text()).await;
        }

        self.context.push_user_turn(user, message_text);
        self.context.push_assistant_turn(user, &reply);

        Ok(reply)
    }
}
