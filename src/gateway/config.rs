//! Configuration for the inference gateway.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::error::{GatewayError, GatewayResult};

/// Default base URL for an OpenAI-compatible provider.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for the gateway: one model selector per AI capability,
/// plus shared HTTP client settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Provider API key.
    pub api_key: String,
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Speech-to-text model.
    pub transcription_model: String,
    /// Chat completion model.
    pub chat_model: String,
    /// Text-to-speech model.
    pub speech_model: String,
    /// Text-to-speech voice.
    pub speech_voice: String,
    /// Request timeout.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            transcription_model: "whisper-1".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            speech_model: "tts-1".to_string(),
            speech_voice: "nova".to_string(),
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl GatewayConfig {
    /// Create a config with the given API key and default models.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Set the provider base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the chat completion model.
    #[must_use]
    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if the API key is empty or the base URL is invalid.
    pub fn validate(&self) -> GatewayResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(GatewayError::InvalidConfig(
                "api_key must not be empty".to_string(),
            ));
        }
        Url::parse(&self.base_url)
            .map_err(|err| GatewayError::InvalidConfig(format!("base_url: {err}")))?;
        Ok(())
    }
}

mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_key() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_err());
        assert!(GatewayConfig::new("sk-test").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = GatewayConfig::new("sk-test").with_base_url("not a url");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_models() {
        let config = GatewayConfig::default();
        assert_eq!(config.transcription_model, "whisper-1");
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert_eq!(config.speech_model, "tts-1");
        assert_eq!(config.speech_voice, "nova");
    }
}
