//! Request memoization with single-flight semantics.
//!
//! [`Memo`] maps keys to shared in-flight futures: the first caller for a
//! key starts the work, every concurrent caller for the same key awaits the
//! same future, and the settled value stays cached until evicted by LRU
//! pressure. Registration happens under the same lock as the miss check, so
//! two callers can never race into two invocations for one key.
//!
//! Failures are never cached: a future that resolves to `Err` is dropped
//! from the cache and the next caller re-invokes. A successful `None` is an
//! ordinary value and is cached like any other.

use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use lru::LruCache;
use tracing::{debug, trace};

/// Default number of cached keys.
pub const DEFAULT_CAPACITY: usize = 500;

struct Entry<V, E> {
    /// Distinguishes this in-flight future from a replacement registered
    /// after an eviction of the same key.
    id: u64,
    future: Shared<BoxFuture<'static, Result<V, E>>>,
}

struct MemoInner<K: Hash + Eq, V, E> {
    entries: LruCache<K, Entry<V, E>>,
    next_id: u64,
}

/// Capacity-bounded memoizer for fallible async work.
pub struct Memo<K, V, E>
where
    K: Hash + Eq,
{
    inner: Mutex<MemoInner<K, V, E>>,
}

impl<K, V, E> Memo<K, V, E>
where
    K: Hash + Eq + Clone + fmt::Debug,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates a memoizer with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a memoizer holding at most `capacity` keys.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).expect("cache capacity must be non-zero");
        Memo {
            inner: Mutex::new(MemoInner {
                entries: LruCache::new(capacity),
                next_id: 0,
            }),
        }
    }

    /// Returns the cached or in-flight result for `key`, invoking `f` only
    /// when the key is absent.
    ///
    /// `f` is called synchronously under the cache lock on a miss, so it
    /// must only construct the future, not poll it.
    pub async fn get_or_run<F>(&self, key: K, f: F) -> Result<V, E>
    where
        F: FnOnce() -> BoxFuture<'static, Result<V, E>>,
    {
        let (id, shared) = self.lookup_or_register(&key, f);
        let result = shared.await;

        if result.is_err() {
            let mut inner = self.inner.lock().unwrap();
            // Only drop the entry we registered; a newer future under the
            // same key stays.
            if inner.entries.peek(&key).map(|entry| entry.id) == Some(id) {
                inner.entries.pop(&key);
                debug!(key = ?key, "evicted failed entry");
            }
        }

        result
    }

    fn lookup_or_register<F>(
        &self,
        key: &K,
        f: F,
    ) -> (u64, Shared<BoxFuture<'static, Result<V, E>>>)
    where
        F: FnOnce() -> BoxFuture<'static, Result<V, E>>,
    {
        let mut inner = self.inner.lock().unwrap();
        let hit = inner
            .entries
            .get(key)
            .map(|entry| (entry.id, entry.future.clone()));
        match hit {
            Some(found) => {
                trace!(key = ?key, "cache hit");
                found
            }
            None => {
                debug!(key = ?key, "cache miss");
                let id = inner.next_id;
                inner.next_id = inner.next_id.wrapping_add(1);
                let shared = f().shared();
                inner.entries.put(
                    key.clone(),
                    Entry {
                        id,
                        future: shared.clone(),
                    },
                );
                (id, shared)
            }
        }
    }

    /// Number of cached or in-flight keys.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().entries.is_empty()
    }

    /// Drops one key. Callers already awaiting its future are unaffected.
    pub fn evict(&self, key: &K) -> bool {
        self.inner.lock().unwrap().entries.pop(key).is_some()
    }

    /// Drops every cached entry.
    pub fn clear(&self) {
        self.inner.lock().unwrap().entries.clear();
    }
}

impl<K, V, E> Default for Memo<K, V, E>
where
    K: Hash + Eq + Clone + fmt::Debug,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// An async function paired with a key-derivation rule and a [`Memo`].
///
/// `call` behaves like the wrapped function except that at most one
/// invocation runs per derived key and settled successes are reused.
pub struct Cached<A, K, V, E>
where
    K: Hash + Eq,
{
    memo: Memo<K, V, E>,
    run: Arc<dyn Fn(A) -> BoxFuture<'static, Result<V, E>> + Send + Sync>,
    key_of: Arc<dyn Fn(&A) -> K + Send + Sync>,
}

impl<A, K, V, E> Cached<A, K, V, E>
where
    K: Hash + Eq + Clone + fmt::Debug,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Wraps `run` with the default cache capacity.
    pub fn new(
        run: impl Fn(A) -> BoxFuture<'static, Result<V, E>> + Send + Sync + 'static,
        key_of: impl Fn(&A) -> K + Send + Sync + 'static,
    ) -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, run, key_of)
    }

    /// Wraps `run` with an explicit cache capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(
        capacity: usize,
        run: impl Fn(A) -> BoxFuture<'static, Result<V, E>> + Send + Sync + 'static,
        key_of: impl Fn(&A) -> K + Send + Sync + 'static,
    ) -> Self {
        Cached {
            memo: Memo::with_capacity(capacity),
            run: Arc::new(run),
            key_of: Arc::new(key_of),
        }
    }

    /// Invokes the wrapped function, deduplicated by derived key.
    pub async fn call(&self, args: A) -> Result<V, E>
    where
        A: Send + 'static,
    {
        let key = (self.key_of)(&args);
        let run = self.run.clone();
        self.memo.get_or_run(key, move || run(args)).await
    }

    pub fn memo(&self) -> &Memo<K, V, E> {
        &self.memo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counting_loader(
        calls: Arc<AtomicUsize>,
    ) -> impl Fn(u64) -> BoxFuture<'static, Result<u64, String>> {
        move |key| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(key * 2)
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_single_invocation_per_key() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting_loader(calls.clone());
        let memo: Memo<u64, u64, String> = Memo::new();

        assert_eq!(memo.get_or_run(7, || loader(7)).await, Ok(14));
        assert_eq!(memo.get_or_run(7, || loader(7)).await, Ok(14));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(memo.get_or_run(8, || loader(8)).await, Ok(16));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(memo.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_flight() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting_loader(calls.clone());
        let memo: Memo<u64, u64, String> = Memo::new();

        let (a, b) = tokio::join!(
            memo.get_or_run(3, || loader(3)),
            memo.get_or_run(3, || loader(3)),
        );
        assert_eq!(a, Ok(6));
        assert_eq!(b, Ok(6));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_none_is_a_cached_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo: Memo<&'static str, Option<u64>, String> = Memo::new();

        let loader = |calls: Arc<AtomicUsize>| {
            move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<Option<u64>, String>(None)
                }
                .boxed()
            }
        };

        assert_eq!(memo.get_or_run("missing", loader(calls.clone())).await, Ok(None));
        assert_eq!(memo.get_or_run("missing", loader(calls.clone())).await, Ok(None));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_is_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo: Memo<u64, u64, String> = Memo::new();

        let failing = {
            let calls = calls.clone();
            move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("boom".to_string())
                }
                .boxed()
            }
        };

        assert_eq!(
            memo.get_or_run(1, failing.clone()).await,
            Err("boom".to_string())
        );
        assert_eq!(memo.len(), 0);

        assert_eq!(
            memo.get_or_run(1, failing).await,
            Err("boom".to_string())
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_lru_eviction_reinvokes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting_loader(calls.clone());
        let memo: Memo<u64, u64, String> = Memo::with_capacity(1);

        memo.get_or_run(1, || loader(1)).await.unwrap();
        memo.get_or_run(2, || loader(2)).await.unwrap();
        assert_eq!(memo.len(), 1);

        memo.get_or_run(1, || loader(1)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_explicit_eviction() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting_loader(calls.clone());
        let memo: Memo<u64, u64, String> = Memo::new();

        memo.get_or_run(5, || loader(5)).await.unwrap();
        assert!(memo.evict(&5));
        assert!(!memo.evict(&5));

        memo.get_or_run(5, || loader(5)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        memo.clear();
        assert!(memo.is_empty());
    }

    #[tokio::test]
    async fn test_cached_wrapper_derives_keys() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counting = {
            let calls = calls.clone();
            move |(rid, sha): (String, String)| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(format!("{rid}@{sha}"))
                }
                .boxed()
            }
        };
        let cached = Cached::new(counting, |(rid, sha): &(String, String)| {
            format!("{rid}/{sha}")
        });

        let args = ("arb:z3gq".to_string(), "49e1a5".to_string());
        assert_eq!(cached.call(args.clone()).await.unwrap(), "arb:z3gq@49e1a5");
        assert_eq!(cached.call(args).await.unwrap(), "arb:z3gq@49e1a5");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cached.memo().len(), 1);
    }
}
