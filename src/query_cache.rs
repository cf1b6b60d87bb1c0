use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDelay {
    Fixed(Duration),
    /// `base * 2^attempt`, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

impl RetryDelay {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            RetryDelay::Fixed(delay) => *delay,
            RetryDelay::Exponential { base, max } => {
                let factor = 2u32.saturating_pow(attempt);
                base.saturating_mul(factor).min(*max)
            }
        }
    }
}

impl Default for RetryDelay {
    fn default() -> Self {
        RetryDelay::Exponential {
            base: Duration::from_secs(1),
            max: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicy {
    /// Age below which a cached value is served without fetching.
    pub stale_time: Duration,
    /// Additional attempts after the first failure.
    pub retry: u32,
    pub retry_delay: RetryDelay,
    pub refetch_interval: Option<Duration>,
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            retry: 3,
            retry_delay: RetryDelay::default(),
            refetch_interval: None,
        }
    }
}

struct Entry<V> {
    value: V,
    fetched_at: Instant,
}

type Slot<V> = Arc<tokio::sync::Mutex<Option<Entry<V>>>>;

/// Read-through cache keyed by `K`. Callers sharing a key while a fetch is in flight
/// wait on the same slot and receive that fetch's value.
pub struct QueryCache<K, V> {
    name: &'static str,
    policy: QueryPolicy,
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new(name: &'static str, policy: QueryPolicy) -> Self {
        Self {
            name,
            policy,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &QueryPolicy {
        &self.policy
    }

    fn slot(&self, key: &K) -> Slot<V> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.entry(key.clone()).or_default().clone()
    }

    pub async fn get_or_fetch<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        self.get_or_fetch_retrying(key, fetch, |_| true).await
    }

    /// Like [`get_or_fetch`](Self::get_or_fetch), but errors for which `retryable`
    /// returns `false` are returned at once.
    pub async fn get_or_fetch_retrying<F, Fut, E, R>(
        &self,
        key: K,
        fetch: F,
        retryable: R,
    ) -> Result<V, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
        R: Fn(&E) -> bool,
    {
        let slot = self.slot(&key);
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref() {
            if cached.fetched_at.elapsed() < self.policy.stale_time {
                debug!(query = self.name, ?key, "cache hit");
                return Ok(cached.value.clone());
            }
        }

        let value = self.fetch_with_retry(&key, fetch, retryable).await?;
        *entry = Some(Entry {
            value: value.clone(),
            fetched_at: Instant::now(),
        });

        Ok(value)
    }

    async fn fetch_with_retry<F, Fut, E, R>(&self, key: &K, fetch: F, retryable: R) -> Result<V, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
        R: Fn(&E) -> bool,
    {
        let mut attempt = 0;
        loop {
            match fetch().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.policy.retry && retryable(&e) => {
                    let delay = self.policy.retry_delay.delay_for(attempt);
                    warn!(
                        query = self.name,
                        ?key,
                        attempt = attempt + 1,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %e,
                        "query failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(query = self.name, ?key, error = %e, "query failed");
                    return Err(e);
                }
            }
        }
    }

    /// Last stored value for `key`, fresh or stale.
    pub async fn peek(&self, key: &K) -> Option<V> {
        let slot = self.slot(key);
        let entry = slot.lock().await;
        entry.as_ref().map(|e| e.value.clone())
    }

    /// Forces the next read of `key` to fetch.
    pub async fn invalidate(&self, key: &K) {
        let slot = self.slot(key);
        *slot.lock().await = None;
    }

    pub fn clear(&self) {
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}
