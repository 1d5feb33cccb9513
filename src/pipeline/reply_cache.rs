//! Bounded, time-expiring cache of delivered voice replies.
//!
//! A voice reply is delivered as audio; the text form is kept around so
//! the route layer can answer a later "show transcription" request. The
//! cache is keyed by `(user, message)` and bounded both ways: LRU
//! capacity against unbounded growth, per-entry TTL against stale
//! transcripts.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use tokio::sync::Mutex;

use crate::ids::{MessageId, UserId};

/// Configuration for the reply cache.
#[derive(Clone, Debug)]
pub struct ReplyCacheConfig {
    /// Maximum number of cached replies.
    pub capacity: usize,
    /// How long a cached reply stays retrievable.
    pub ttl: Duration,
}

impl Default for ReplyCacheConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            ttl: Duration::from_secs(3600),
        }
    }
}

struct CachedReply {
    text: String,
    expires_at: Instant,
}

impl CachedReply {
    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Bounded TTL cache of reply texts keyed by `(user, message)`.
pub struct ReplyCache {
    entries: Mutex<LruCache<(UserId, MessageId), CachedReply>>,
    ttl: Duration,
}

impl ReplyCache {
    /// Create a cache from its configuration.
    #[must_use]
    pub fn new(config: &ReplyCacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl: config.ttl,
        }
    }

    /// Remember the text form of a delivered reply.
    pub async fn insert(&self, user: UserId, message: MessageId, text: String) {
        let mut entries = self.entries.lock().await;
        entries.put(
            (user, message),
            CachedReply {
                text,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Look up a reply's text form. Expired entries are evicted on access.
    pub async fn get(&self, user: UserId, message: MessageId) -> Option<String> {
        let mut entries = self.entries.lock().await;
        let key = (user, message);
        let expired = entries.get(&key).is_some_and(CachedReply::is_expired);
        if expired {
            entries.pop(&key);
            return None;
        }
        entries.get(&key).map(|entry| entry.text.clone())
    }

    /// Number of cached replies, expired entries included.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the cache holds no replies.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
