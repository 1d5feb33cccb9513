//! Startup helpers for the coach runtime.
//!
//! Wires the core components together and, when run as a binary, drives
//! them with a local console transport so text messages can be exercised
//! end-to-end during development. Production transports (chat platform
//! adapters) embed [`CoachRuntime`] and bring their own [`Transport`].

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::io::AsyncBufReadExt;
use tokio_rusqlite::Connection;
use tracing::{error, info};

use crate::analytics::AnalyticsAggregator;
use crate::config::AppConfig;
use crate::context::{ContextStore, LearnerProfile};
use crate::gateway::{InferenceGateway, OpenAiGateway};
use crate::ids::{MessageId, UserId};
use crate::pipeline::{
    MessagePipeline, Transport, TransportError, TransportFuture, TransportResult,
};
use crate::storage::{DocumentStore, SqliteDocumentStore};
use crate::sync::SyncRelay;
use crate::vocabulary::VocabularyScheduler;

/// Table holding analytics documents.
const ANALYTICS_TABLE: &str = "analytics_docs";
/// Table holding vocabulary documents.
const VOCABULARY_TABLE: &str = "vocabulary_docs";

/// The wired core: everything a transport adapter needs.
pub struct CoachRuntime {
    /// Conversation state store.
    pub context: Arc<ContextStore>,
    /// Analytics aggregator.
    pub analytics: Arc<AnalyticsAggregator>,
    /// Vocabulary scheduler.
    pub vocabulary: Arc<VocabularyScheduler>,
    /// Message pipeline.
    pub pipeline: Arc<MessagePipeline>,
}

impl CoachRuntime {
    /// Build the runtime from configuration and a transport.
    ///
    /// # Errors
    /// Returns an error if the gateway, relay, or persistence cannot be
    /// initialized.
    pub async fn new(config: &AppConfig, transport: Arc<dyn Transport>) -> anyhow::Result<Self> {
        let gateway =
            Arc::new(OpenAiGateway::new(config.gateway.clone())?) as Arc<dyn InferenceGateway>;

        tokio::fs::create_dir_all(&config.data_dir).await?;
        let conn = Arc::new(Connection::open(config.sqlite_path()).await?);
        let analytics_store = Arc::new(
            SqliteDocumentStore::new(Arc::clone(&conn), ANALYTICS_TABLE).await?,
        ) as Arc<dyn DocumentStore>;
        let vocabulary_store =
            Arc::new(SqliteDocumentStore::new(conn, VOCABULARY_TABLE).await?)
                as Arc<dyn DocumentStore>;

        let context = Arc::new(ContextStore::new(config.context_window));
        let analytics = Arc::new(AnalyticsAggregator::new(analytics_store)?);
        let relay = Arc::new(SyncRelay::new(
            config.sync_base_url.clone(),
            config.bot_token.clone(),
            config.sync_timeout,
        )?);
        let vocabulary = Arc::new(VocabularyScheduler::new(
            Arc::clone(&gateway),
            vocabulary_store,
        ));
        let pipeline = Arc::new(MessagePipeline::new(
            gateway,
            transport,
            Arc::clone(&context),
            Arc::clone(&analytics),
            relay,
            config.temp_dir.clone(),
            &config.reply_cache,
        ));

        Ok(Self {
            context,
            analytics,
            vocabulary,
            pipeline,
        })
    }
}

/// Run the coach with the console transport (used by the `lingua-coach`
/// binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting Lingua Coach v{}", env!("CARGO_PKG_VERSION"));

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("Configuration error: {err}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            error!("Failed to create runtime: {err}");
            return ExitCode::from(1);
        }
    };

    if let Err(err) = rt.block_on(run_console(&config)) {
        error!("Runtime error: {err}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Local user id for the console session.
const CONSOLE_USER: UserId = UserId::new(0);

/// Console transport: replies are printed to stdout; there is no audio.
struct ConsoleTransport;

#[allow(clippy::print_stdout)]
impl Transport for ConsoleTransport {
    fn fetch_audio(
        &self,
        _user: UserId,
        _audio: &crate::pipeline::AudioRef,
        _dest: &Path,
    ) -> TransportFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            Err(TransportError(
                "console transport carries no audio".to_string(),
            ))
        })
    }

    fn send_text(&self, _user: UserId, text: &str) -> TransportFuture<'_, TransportResult<()>> {
        let text = text.to_string();
        Box::pin(async move {
            println!("coach> {text}");
            Ok(())
        })
    }

    fn send_voice(&self, _user: UserId, audio: &Path) -> TransportFuture<'_, TransportResult<()>> {
        let audio = audio.display().to_string();
        Box::pin(async move {
            println!("coach> [voice reply at {audio}]");
            Ok(())
        })
    }
}

async fn run_console(config: &AppConfig) -> anyhow::Result<()> {
    let runtime = CoachRuntime::new(config, Arc::new(ConsoleTransport)).await?;
    runtime
        .context
        .register_profile(CONSOLE_USER, LearnerProfile::default());

    info!("Console session ready; type a message, Ctrl-C to quit");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut sequence: i64 = 0;

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) if !line.trim().is_empty() => {
                    sequence += 1;
                    runtime
                        .pipeline
                        .process_text_message(CONSOLE_USER, MessageId::new(sequence), line.trim())
                        .await;
                }
                Some(_) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
