//! The provider contract and its composable implementations.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use pulse_cache::{CacheKey, TieredCache};
use pulse_traits::{RawSignalValue, SignalKey, Snapshot};
use tracing::debug;

use crate::Result;
use crate::rate_limiter::RateLimiter;
use crate::retry::RetryingFetcher;

/// Future returned by [`SignalSource::fetch`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<RawSignalValue>> + Send + 'a>>;

/// A provider of raw signal values.
///
/// The future is boxed so sources can be held as `Arc<dyn SignalSource>` and
/// fetched from spawned tasks.
pub trait SignalSource: Send + Sync + Debug {
    /// Name used in logs and cache keys.
    fn name(&self) -> &str;

    /// Whether this source serves `key`.
    fn provides(&self, key: SignalKey) -> bool;

    /// Fetch the current value of one signal.
    fn fetch(&self, key: SignalKey) -> FetchFuture<'_>;
}

/// Source that serves a fixed snapshot. Used for offline runs and tests.
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    snapshot: Snapshot,
}

impl StaticSource {
    /// Serve `snapshot` under `name`.
    pub fn new(name: impl Into<String>, snapshot: Snapshot) -> Self {
        Self {
            name: name.into(),
            snapshot,
        }
    }
}

impl SignalSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn provides(&self, key: SignalKey) -> bool {
        self.snapshot.get(key).is_some()
    }

    fn fetch(&self, key: SignalKey) -> FetchFuture<'_> {
        let result = self
            .snapshot
            .get(key)
            .copied()
            .ok_or(crate::ProviderError::NoData(key));
        Box::pin(std::future::ready(result))
    }
}

/// Wraps a source with a cache, a rate limiter and retries.
///
/// A fetch is served from the cache when possible. On a miss the inner
/// source is called through the retrying fetcher, and every attempt takes
/// its own turn in the rate limiter, so retries count against the budget.
/// Successful values are written back to the cache.
#[derive(Debug, Clone)]
pub struct GatedSource {
    inner: Arc<dyn SignalSource>,
    limiter: Arc<RateLimiter>,
    retry: RetryingFetcher,
    cache: Arc<TieredCache<RawSignalValue>>,
    ttl: Duration,
}

impl GatedSource {
    /// Gate `inner`.
    #[must_use]
    pub fn new(
        inner: Arc<dyn SignalSource>,
        limiter: Arc<RateLimiter>,
        retry: RetryingFetcher,
        cache: Arc<TieredCache<RawSignalValue>>,
        ttl: Duration,
    ) -> Self {
        Self {
            inner,
            limiter,
            retry,
            cache,
            ttl,
        }
    }

    /// The limiter guarding the inner source.
    #[must_use]
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    fn cache_key(&self, key: SignalKey) -> CacheKey {
        CacheKey::quote(format!("{}.{key}", self.inner.name()))
    }
}

impl SignalSource for GatedSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn provides(&self, key: SignalKey) -> bool {
        self.inner.provides(key)
    }

    fn fetch(&self, key: SignalKey) -> FetchFuture<'_> {
        Box::pin(async move {
            let cache_key = self.cache_key(key);
            if let Some(value) = self.cache.get(&cache_key) {
                return Ok(value);
            }

            let value = self
                .retry
                .run(|attempt| {
                    debug!(source = self.name(), signal = %key, attempt, "fetching");
                    self.limiter.execute(|| self.inner.fetch(key))
                })
                .await?;

            self.cache.set(&cache_key, value, self.ttl);
            Ok(value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderError;
    use crate::retry::RetryPolicy;
    use pulse_traits::SystemClock;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails with a network error `failures` times, then succeeds.
    #[derive(Debug)]
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    impl SignalSource for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn provides(&self, _key: SignalKey) -> bool {
            true
        }

        fn fetch(&self, key: SignalKey) -> FetchFuture<'_> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let result = if n < self.failures {
                Err(ProviderError::Network("timeout".into()))
            } else {
                Ok(RawSignalValue::new(key, 1.5))
            };
            Box::pin(std::future::ready(result))
        }
    }

    fn gate(inner: Arc<dyn SignalSource>, budget: usize) -> GatedSource {
        GatedSource::new(
            inner,
            Arc::new(RateLimiter::new(budget)),
            RetryingFetcher::new(RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(10),
            }),
            Arc::new(TieredCache::new(Arc::new(SystemClock))),
            Duration::from_secs(300),
        )
    }

    #[tokio::test]
    async fn test_static_source() {
        let snapshot: Snapshot = [RawSignalValue::new(SignalKey::VixLevel, 14.0)]
            .into_iter()
            .collect();
        let source = StaticSource::new("fixture", snapshot);
        assert!(source.provides(SignalKey::VixLevel));
        assert!(!source.provides(SignalKey::HySpread));
        assert_eq!(
            source.fetch(SignalKey::VixLevel).await.unwrap().value.as_number(),
            Some(14.0)
        );
        assert!(matches!(
            source.fetch(SignalKey::HySpread).await,
            Err(ProviderError::NoData(SignalKey::HySpread))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gated_retries_then_caches() {
        let flaky = Arc::new(Flaky {
            failures: 2,
            calls: AtomicU32::new(0),
        });
        let gated = gate(flaky.clone(), 10);

        let value = gated.fetch(SignalKey::PutCallRatio).await.unwrap();
        assert_eq!(value.value.as_number(), Some(1.5));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
        // every attempt took a turn in the limiter
        assert_eq!(gated.limiter().state().calls_in_window, 3);

        // second fetch is a cache hit
        gated.fetch(SignalKey::PutCallRatio).await.unwrap();
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gated_gives_up() {
        let flaky = Arc::new(Flaky {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
        });
        let gated = gate(flaky.clone(), 10);
        let result = gated.fetch(SignalKey::FearGreed).await;
        assert!(matches!(result, Err(ProviderError::Network(_))));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }
}
