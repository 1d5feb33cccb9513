//! Best-effort forwarding of analytics events to a remote service.
//!
//! The relay mirrors locally recorded events to the companion web API.
//! It is fire-and-forget: a failure is logged and swallowed. Nothing here
//! is retried, surfaced to the user, or allowed to block the pipeline.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::analytics::MessageKind;
use crate::ids::UserId;

/// Header carrying the shared bot-identity secret.
pub const BOT_TOKEN_HEADER: &str = "X-Bot-Token";

#[derive(Serialize)]
struct TrackMessageBody<'a> {
    message_type: &'a str,
}

#[derive(Serialize)]
struct TrackErrorsBody<'a> {
    errors: &'a str,
}

/// Relay for analytics events. Disabled (every call is a cheap no-op)
/// when no base address is configured.
pub struct SyncRelay {
    client: reqwest::Client,
    base_url: Option<Url>,
    bot_token: String,
}

impl SyncRelay {
    /// Create a relay. `base_url = None` disables it.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(
        base_url: Option<Url>,
        bot_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            bot_token: bot_token.into(),
        })
    }

    /// Whether a remote address is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.base_url.is_some()
    }

    fn endpoint(&self, user: UserId, action: &str) -> Option<String> {
        let base = self.base_url.as_ref()?;
        Some(format!(
            "{}/api/analytics/{user}/{action}",
            base.as_str().trim_end_matches('/')
        ))
    }

    async fn post<B: Serialize>(&self, url: String, body: &B) -> bool {
        let result = self
            .client
            .post(&url)
            .header(BOT_TOKEN_HEADER, &self.bot_token)
            .json(body)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(%url, "Synced analytics event");
                true
            }
            Ok(response) => {
                warn!(%url, status = %response.status(), "Analytics sync rejected");
                false
            }
            Err(err) => {
                warn!(%url, %err, "Analytics sync failed");
                false
            }
        }
    }

    /// Mirror a tracked message. Returns whether the remote accepted it;
    /// callers are free to ignore the result.
    pub async fn track_message(&self, user: UserId, kind: MessageKind) -> bool {
        let Some(url) = self.endpoint(user, "track-message") else {
            return false;
        };
        self.post(
            url,
            &TrackMessageBody {
                message_type: kind.as_str(),
            },
        )
        .await
    }

    /// Mirror a tracked correction report. Returns whether the remote
    /// accepted it; callers are free to ignore the result.
    pub async fn track_errors(&self, user: UserId, report: &str) -> bool {
        let Some(url) = self.endpoint(user, "track-errors") else {
            return false;
        };
        self.post(url, &TrackErrorsBody { errors: report }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_relay() -> SyncRelay {
        SyncRelay::new(None, "secret", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_disabled_relay_is_noop() {
        let relay = disabled_relay();
        assert!(!relay.is_enabled());
        assert!(!relay.track_message(UserId::new(1), MessageKind::Voice).await);
        assert!(!relay.track_errors(UserId::new(1), "1. Ошибка: ...").await);
    }

    #[test]
    fn test_endpoint_shape() {
        let relay = SyncRelay::new(
            Some(Url::parse("https://api.example.com/").unwrap()),
            "secret",
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(relay.is_enabled());
        assert_eq!(
            relay.endpoint(UserId::new(42), "track-message").unwrap(),
            "https://api.example.com/api/analytics/42/track-message"
        );
    }
}
