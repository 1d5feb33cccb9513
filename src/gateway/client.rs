//! OpenAI-compatible HTTP implementation of the inference gateway.

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::GatewayConfig;
use super::error::{GatewayError, GatewayResult};
use super::types::{ChatTurn, CorrectionReport};
use super::{GatewayFuture, InferenceGateway};

/// System prompt for the grammar-check capability. The answer contract
/// (numbered findings or the clean marker) is what the analytics
/// classifier parses downstream.
const GRAMMAR_CHECKER_PROMPT: &str = "You are an English grammar checker for Russian-speaking learners. \
Check the user's message for grammar mistakes. \
If there are mistakes, list each one on its own line, numbered, in this exact format: \
\"1. Ошибка: <the mistake> Правильно: <the correction>\" and name the kind of mistake \
(verb tense, articles, prepositions, word order, agreement, incomplete sentence) in Russian or English. \
If the message is grammatically correct, reply with exactly: No errors found.";

/// System prompt for the conversational reply capability; the persona line
/// built from the learner profile is appended per request.
const PRACTICE_PARTNER_PROMPT: &str = "You are a friendly English conversation partner helping a learner practice. \
Keep replies natural, encouraging and short (two or three sentences), ask a follow-up question, \
and match the learner's level.";

/// Temperature for deterministic-ish auxiliary generation.
const AUX_TEMPERATURE: f32 = 0.3;
/// Temperature for conversational replies.
const CHAT_TEMPERATURE: f32 = 0.7;

#[derive(Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Serialize)]
struct SpeechRequest {
    model: String,
    voice: String,
    input: String,
}

/// Gateway implementation backed by an OpenAI-compatible HTTP API.
pub struct OpenAiGateway {
    config: GatewayConfig,
    client: reqwest::Client,
}

impl OpenAiGateway {
    /// Create a gateway from a validated configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self { config, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Fail on a non-success status, carrying the body for logs.
    async fn check_status(response: reqwest::Response) -> GatewayResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::Provider {
            status: status.as_u16(),
            body,
        })
    }

    async fn chat_completion(
        &self,
        system: String,
        turns: Vec<WireMessage>,
        temperature: f32,
        max_tokens: u32,
    ) -> GatewayResult<String> {
        let mut messages = vec![WireMessage {
            role: "system".to_string(),
            content: system,
        }];
        messages.extend(turns);

        let request = ChatCompletionRequest {
            model: self.config.chat_model.clone(),
            messages,
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let completion: ChatCompletionResponse = response.json().await?;
        extract_reply(completion)
    }

    async fn run_transcription(
        &self,
        audio: Vec<u8>,
        hint: Option<String>,
    ) -> GatewayResult<String> {
        let part = Part::bytes(audio)
            .file_name("voice.ogg")
            .mime_str("audio/ogg")?;
        let mut form = Form::new()
            .part("file", part)
            .text("model", self.config.transcription_model.clone())
            .text("response_format", "json");
        if let Some(hint) = hint {
            form = form.text("prompt", hint);
        }

        let response = self
            .client
            .post(self.endpoint("audio/transcriptions"))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let transcription: TranscriptionResponse = response.json().await?;
        debug!(chars = transcription.text.len(), "Transcription received");
        Ok(transcription.text.trim().to_string())
    }

    async fn run_synthesis(&self, text: String) -> GatewayResult<Vec<u8>> {
        let request = SpeechRequest {
            model: self.config.speech_model.clone(),
            voice: self.config.speech_voice.clone(),
            input: text,
        };

        let response = self
            .client
            .post(self.endpoint("audio/speech"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        Ok(response.bytes().await?.to_vec())
    }
}

/// Pull the first choice's content out of a completion payload.
fn extract_reply(completion: ChatCompletionResponse) -> GatewayResult<String> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| GatewayError::MalformedResponse("completion has no content".to_string()))
}

impl InferenceGateway for OpenAiGateway {
    fn transcribe(
        &self,
        audio: Vec<u8>,
        hint: Option<String>,
    ) -> GatewayFuture<'_, GatewayResult<String>> {
        Box::pin(self.run_transcription(audio, hint))
    }

    fn check_grammar(&self, text: &str) -> GatewayFuture<'_, GatewayResult<CorrectionReport>> {
        let turns = vec![WireMessage {
            role: "user".to_string(),
            content: text.to_string(),
        }];
        Box::pin(async move {
            let answer = self
                .chat_completion(
                    GRAMMAR_CHECKER_PROMPT.to_string(),
                    turns,
                    AUX_TEMPERATURE,
                    300,
                )
                .await?;
            Ok(CorrectionReport::new(answer))
        })
    }

    fn generate_reply(
        &self,
        message: &str,
        history: &[ChatTurn],
        persona: &str,
    ) -> GatewayFuture<'_, GatewayResult<String>> {
        let system = format!("{PRACTICE_PARTNER_PROMPT} {persona}");
        let mut turns: Vec<WireMessage> = history
            .iter()
            .map(|turn| WireMessage {
                role: turn.role.as_str().to_string(),
                content: turn.content.clone(),
            })
            .collect();
        turns.push(WireMessage {
            role: "user".to_string(),
            content: message.to_string(),
        });
        Box::pin(self.chat_completion(system, turns, CHAT_TEMPERATURE, 300))
    }

    fn synthesize_speech(&self, text: &str) -> GatewayFuture<'_, GatewayResult<Vec<u8>>> {
        Box::pin(self.run_synthesis(text.to_string()))
    }

    fn generate_text(
        &self,
        system: &str,
        prompt: &str,
    ) -> GatewayFuture<'_, GatewayResult<String>> {
        let system = system.to_string();
        let turns = vec![WireMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        }];
        Box::pin(self.chat_completion(system, turns, AUX_TEMPERATURE, 150))
    }
}
