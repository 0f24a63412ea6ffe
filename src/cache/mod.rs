//! Bearer token cache shared by all requests
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, MutexGuard, RwLock};

/// Tokens are treated as expired this long before upstream says they are.
pub const EXPIRY_BUFFER_SECONDS: i64 = 60;

#[derive(Debug, Clone)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - Duration::seconds(EXPIRY_BUFFER_SECONDS)
    }
}

/// Single-entry token cache.
///
/// Reads never block each other. Refreshes go through `refresh_guard` so
/// concurrent callers that all miss end up waiting on one upstream request
/// instead of issuing their own; `store` overwrites, last writer wins.
#[derive(Debug, Default)]
pub struct TokenCache {
    entry: RwLock<Option<CachedToken>>,
    refresh: Mutex<()>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token if it is still outside the expiry buffer
    pub async fn valid_token(&self, now: DateTime<Utc>) -> Option<String> {
        let entry = self.entry.read().await;
        entry
            .as_ref()
            .filter(|cached| cached.is_fresh(now))
            .map(|cached| cached.access_token.clone())
    }

    /// Replace the cached entry with a token valid for `expires_in_seconds` from `now`
    pub async fn store(
        &self,
        access_token: String,
        expires_in_seconds: i64,
        now: DateTime<Utc>,
    ) -> CachedToken {
        let cached = CachedToken {
            access_token,
            expires_at: now + Duration::seconds(expires_in_seconds),
        };
        *self.entry.write().await = Some(cached.clone());
        cached
    }

    pub async fn current(&self) -> Option<CachedToken> {
        self.entry.read().await.clone()
    }

    /// Serialize token refreshes; hold the guard across check, fetch and store.
    pub async fn refresh_guard(&self) -> MutexGuard<'_, ()> {
        self.refresh.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_empty_cache_has_no_token() {
        let cache = TokenCache::new();
        assert_eq!(cache.valid_token(t0()).await, None);
    }

    #[tokio::test]
    async fn test_token_valid_until_buffer() {
        let cache = TokenCache::new();
        cache.store("abc".to_string(), 1800, t0()).await;

        assert_eq!(cache.valid_token(t0()).await.as_deref(), Some("abc"));

        let just_before = t0() + Duration::seconds(1800 - EXPIRY_BUFFER_SECONDS - 1);
        assert_eq!(cache.valid_token(just_before).await.as_deref(), Some("abc"));

        let at_buffer = t0() + Duration::seconds(1800 - EXPIRY_BUFFER_SECONDS);
        assert_eq!(cache.valid_token(at_buffer).await, None);
    }

    #[tokio::test]
    async fn test_store_overwrites() {
        let cache = TokenCache::new();
        cache.store("first".to_string(), 1800, t0()).await;
        cache.store("second".to_string(), 1800, t0()).await;
        assert_eq!(cache.valid_token(t0()).await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_short_lived_token_is_never_fresh() {
        let cache = TokenCache::new();
        cache.store("abc".to_string(), 30, t0()).await;
        assert_eq!(cache.valid_token(t0()).await, None);
        assert!(cache.current().await.is_some());
    }
}
