//! Single-flight cache with absolute TTL expiry
//!
//! At most one computation runs per key at a time: concurrent callers for
//! the same key wait for the in-flight computation instead of starting their
//! own. The computation itself runs on a detached task, so a caller going
//! away (client disconnect) never cancels work that other callers are
//! waiting on.
//!
//! Successful values are cached for the configured TTL, measured from the
//! moment the value was produced. Errors are never cached; the next caller
//! triggers a fresh computation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use application::ApplicationError;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

enum Slot<T> {
    /// A computation is running; subscribe to receive its outcome
    InFlight(broadcast::Sender<Result<T, ApplicationError>>),
    /// A value is cached until `inserted_at + ttl`
    Ready { value: T, inserted_at: Instant },
}

struct Inner<T> {
    slots: Mutex<HashMap<String, Slot<T>>>,
    ttl: Duration,
}

/// Keyed single-flight cache for fallible async computations.
pub struct SingleFlightCache<T> {
    inner: Arc<Inner<T>>,
}

impl<T> std::fmt::Debug for SingleFlightCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFlightCache")
            .field("ttl", &self.inner.ttl)
            .finish_non_exhaustive()
    }
}

impl<T> Clone for SingleFlightCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SingleFlightCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a cache whose entries live for `ttl` after insertion.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(HashMap::new()),
                ttl,
            }),
        }
    }

    /// Return the cached value for `key`, or run `compute` to produce it.
    ///
    /// When another caller is already computing the same key, this waits for
    /// that computation's outcome instead of starting a second one. The
    /// computation runs on its own task and completes even if every waiter
    /// is cancelled.
    ///
    /// # Errors
    ///
    /// Propagates the computation's error to every waiter. Failed
    /// computations leave nothing in the cache.
    pub async fn get_or_compute<F>(&self, key: &str, compute: F) -> Result<T, ApplicationError>
    where
        F: Future<Output = Result<T, ApplicationError>> + Send + 'static,
    {
        // The lock block must not contain an await: the guard is not Send,
        // so it only ever produces a receiver to wait on afterwards.
        let mut receiver = {
            let mut slots = self.inner.slots.lock();

            if let Some(Slot::Ready { value, inserted_at }) = slots.get(key) {
                if inserted_at.elapsed() < self.inner.ttl {
                    metrics::counter!("aggregator_cache_total", "outcome" => "hit").increment(1);
                    debug!(key = %key, "Cache hit");
                    return Ok(value.clone());
                }
                slots.remove(key);
            }

            if let Some(Slot::InFlight(tx)) = slots.get(key) {
                metrics::counter!("aggregator_cache_total", "outcome" => "join").increment(1);
                debug!(key = %key, "Joining in-flight computation");
                tx.subscribe()
            } else {
                metrics::counter!("aggregator_cache_total", "outcome" => "miss").increment(1);
                debug!(key = %key, "Cache miss, starting computation");
                let (tx, rx) = broadcast::channel(1);
                slots.insert(key.to_string(), Slot::InFlight(tx.clone()));

                let inner = Arc::clone(&self.inner);
                let key = key.to_string();
                // Detached so that waiter cancellation cannot abort the shared
                // computation.
                tokio::spawn(async move {
                    let result = compute.await;
                    let mut slots = inner.slots.lock();
                    match &result {
                        Ok(value) => {
                            slots.insert(
                                key,
                                Slot::Ready {
                                    value: value.clone(),
                                    inserted_at: Instant::now(),
                                },
                            );
                        },
                        Err(_) => {
                            slots.remove(&key);
                        },
                    }
                    // Publish while holding the lock: every receiver subscribed
                    // while the slot was InFlight is guaranteed to get this.
                    let _ = tx.send(result);
                });

                rx
            }
        };

        match receiver.recv().await {
            Ok(result) => result,
            Err(_) => Err(ApplicationError::Internal(
                "cached computation was dropped before completing".to_string(),
            )),
        }
    }

    /// Drop any cached value or in-flight marker for `key`.
    pub fn invalidate(&self, key: &str) {
        self.inner.slots.lock().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting_compute(
        calls: &Arc<AtomicU32>,
        value: i32,
    ) -> impl Future<Output = Result<i32, ApplicationError>> + Send + 'static {
        let calls = Arc::clone(calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        }
    }

    #[test]
    fn lookup_future_is_send() {
        // Axum handlers require Send futures, so a guard must never be held
        // across an await inside get_or_compute.
        fn assert_send<F: Send>(_: &F) {}

        let cache = SingleFlightCache::<i32>::new(Duration::from_secs(1));
        let fut = cache.get_or_compute("k", async { Ok(1) });
        assert_send(&fut);
        drop(fut);
    }

    #[tokio::test]
    async fn caches_successful_values_within_ttl() {
        let cache = SingleFlightCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicU32::new(0));

        let first = cache.get_or_compute("k", counting_compute(&calls, 7)).await;
        let second = cache.get_or_compute("k", counting_compute(&calls, 8)).await;

        assert_eq!(first.unwrap(), 7);
        assert_eq!(second.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entries_are_recomputed() {
        let cache = SingleFlightCache::new(Duration::from_millis(30));
        let calls = Arc::new(AtomicU32::new(0));

        let first = cache.get_or_compute("k", counting_compute(&calls, 1)).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = cache.get_or_compute("k", counting_compute(&calls, 2)).await;

        assert_eq!(first.unwrap(), 1);
        assert_eq!(second.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache = SingleFlightCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicU32::new(0));

        let failing = {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(ApplicationError::UpstreamUnavailable("down".to_string()))
            }
        };
        let first = cache.get_or_compute("k", failing).await;
        assert!(first.is_err());

        let second = cache.get_or_compute("k", counting_compute(&calls, 9)).await;
        assert_eq!(second.unwrap(), 9);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_computation() {
        let cache = SingleFlightCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute("k", async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(40)).await;
                        Ok(42)
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn initiator_cancellation_does_not_abort_computation() {
        let cache = SingleFlightCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicU32::new(0));

        let initiator = {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                cache
                    .get_or_compute("k", async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(40)).await;
                        Ok(5)
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        initiator.abort();

        // A later caller joins or reads the completed computation.
        let value = cache
            .get_or_compute("k", counting_compute(&calls, 99))
            .await;
        assert_eq!(value.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_interfere() {
        let cache = SingleFlightCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicU32::new(0));

        let a = cache.get_or_compute("a", counting_compute(&calls, 1)).await;
        let b = cache.get_or_compute("b", counting_compute(&calls, 2)).await;

        assert_eq!(a.unwrap(), 1);
        assert_eq!(b.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_recomputation() {
        let cache = SingleFlightCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicU32::new(0));

        let _ = cache.get_or_compute("k", counting_compute(&calls, 1)).await;
        cache.invalidate("k");
        let second = cache.get_or_compute("k", counting_compute(&calls, 2)).await;

        assert_eq!(second.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
