//! Text-to-speech synthesis (spec.md §4.7, §9: "treat TTS as an external
//! interface" and "dedupe concurrent requests for the same cache key").
//!
//! Grounded on the earlier `Player` trait seam, same as [`crate::fuzzy`].
//! The in-flight dedup cache uses `futures::future::Shared`, the crate the
//! teacher already depends on for its own future combinators. Held as a
//! trait object (`Arc<dyn TtsSynthesizer>`) rather than a generic
//! parameter so a room actor's type doesn't need to carry it.

use async_trait::async_trait;
use futures::future::{FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;

#[async_trait]
pub trait TtsSynthesizer: Send + Sync {
    /// Synthesizes `text` and returns a URL (or data URI) the client can
    /// play. Errors are collapsed to `String` so results can be cached in
    /// a `Shared` future, which requires `Output: Clone`.
    async fn synthesize(&self, text: &str) -> Result<String, String>;
}

/// Always returns no URL. Default when no real synthesizer is configured
/// — spec.md §7: `tts_unavailable` just means clients skip narration.
#[derive(Debug, Default)]
pub struct NullTts;

#[async_trait]
impl TtsSynthesizer for NullTts {
    async fn synthesize(&self, _text: &str) -> Result<String, String> {
        Err("tts not configured".to_string())
    }
}

type PendingVoiceLine = Shared<Pin<Box<dyn Future<Output = Result<String, String>> + Send>>>;

/// Dedupes concurrent synthesis requests that share a cache key (e.g.
/// `scoreboard-{room_code}-{round}`) and caches the result for the
/// lifetime of the process.
pub struct TtsCache {
    synth: Arc<dyn TtsSynthesizer>,
    entries: Mutex<HashMap<String, PendingVoiceLine>>,
}

impl TtsCache {
    pub fn new(synth: Arc<dyn TtsSynthesizer>) -> Self {
        Self {
            synth,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached URL for `cache_key` if present, otherwise
    /// synthesizes `text` once and shares the in-flight future with any
    /// other caller that arrives with the same key before it resolves.
    pub async fn get_or_synthesize(&self, cache_key: &str, text: &str) -> Result<String, String> {
        let mut entries = self.entries.lock().await;
        if let Some(pending) = entries.get(cache_key) {
            let pending = pending.clone();
            drop(entries);
            return pending.await;
        }
        let synth = Arc::clone(&self.synth);
        let text = text.to_string();
        let fut: Pin<Box<dyn Future<Output = Result<String, String>> + Send>> =
            Box::pin(async move { synth.synthesize(&text).await });
        let shared = fut.shared();
        entries.insert(cache_key.to_string(), shared.clone());
        drop(entries);
        shared.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSynth {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TtsSynthesizer for CountingSynth {
        async fn synthesize(&self, text: &str) -> Result<String, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            Ok(format!("https://tts.example/{text}"))
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_requests_for_same_key_dedupe() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(TtsCache::new(Arc::new(CountingSynth {
            calls: calls.clone(),
        })));
        let a = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_or_synthesize("scoreboard-ABCD-1", "hello").await })
        };
        let b = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_or_synthesize("scoreboard-ABCD-1", "hello").await })
        };
        let (ra, rb) = tokio::join!(a, b);
        assert_eq!(ra.unwrap().unwrap(), "https://tts.example/hello");
        assert_eq!(rb.unwrap().unwrap(), "https://tts.example/hello");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_keys_both_synthesize() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = TtsCache::new(Arc::new(CountingSynth {
            calls: calls.clone(),
        }));
        cache.get_or_synthesize("k1", "a").await.unwrap();
        cache.get_or_synthesize("k2", "b").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn null_tts_reports_unavailable() {
        let cache = TtsCache::new(Arc::new(NullTts));
        assert!(cache.get_or_synthesize("k", "text").await.is_err());
    }
}
