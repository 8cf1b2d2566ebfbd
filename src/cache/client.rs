//! Query client that owns the process-wide cache store.

use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::traits::{CacheResult, QueryKey};

type AnyValue = Arc<dyn Any + Send + Sync>;

/// A fetch that every caller for the same key awaits together
type SharedFetch = Shared<BoxFuture<'static, Result<AnyValue, String>>>;

type Store<K> = Arc<Mutex<HashMap<K, Entry>>>;

struct CachedValue {
  value: AnyValue,
  cached_at: DateTime<Utc>,
  /// Entry generation the value was fetched under
  generation: u64,
}

#[derive(Default)]
struct Entry {
  value: Option<CachedValue>,
  /// Bumped by every invalidation
  generation: u64,
  in_flight: Option<SharedFetch>,
}

/// Client for cached, deduplicated queries.
///
/// Cloning is cheap: clones share one store, so the client can be handed to
/// every view and background task that needs it.
pub struct QueryClient<K: QueryKey> {
  entries: Store<K>,
  /// How long before cached data is considered stale
  stale_time: Duration,
  invalidations: broadcast::Sender<K>,
}

impl<K: QueryKey> QueryClient<K> {
  /// Create a new client with a two minute staleness window.
  pub fn new() -> Self {
    let (invalidations, _) = broadcast::channel(16);
    Self {
      entries: Arc::new(Mutex::new(HashMap::new())),
      stale_time: Duration::minutes(2),
      invalidations,
    }
  }

  /// Set the stale time for cached data.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<K, Entry>> {
    lock(&self.entries)
  }

  fn is_value_stale(&self, cached: &CachedValue, generation: u64) -> bool {
    cached.generation != generation || Utc::now() - cached.cached_at > self.stale_time
  }

  /// Fetch a query with cache-first strategy.
  ///
  /// 1. Fresh cached value - return immediately
  /// 2. Fetch already in flight for this key - join it
  /// 3. Otherwise start the fetcher, exactly once
  /// 4. If the fetch fails but an older value exists, serve that instead
  pub async fn fetch_query<T, F, Fut>(&self, key: &K, fetcher: F) -> Result<CacheResult<Arc<T>>, String>
  where
    T: Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    let in_flight = {
      let mut entries = self.entries();
      let entry = entries.entry(key.clone()).or_default();

      if let Some(cached) = &entry.value {
        if !self.is_value_stale(cached, entry.generation) {
          let cached_at = cached.cached_at;
          return downcast(key, Arc::clone(&cached.value))
            .map(|data| CacheResult::from_cache(data, cached_at));
        }
      }

      if let Some(in_flight) = entry.in_flight.clone() {
        debug!(query = %key.description(), "joining in-flight fetch");
        in_flight
      } else {
        let in_flight = start_fetch(
          Arc::clone(&self.entries),
          key.clone(),
          entry.generation,
          fetcher(),
        );
        entry.in_flight = Some(in_flight.clone());
        in_flight
      }
    };

    match in_flight.await {
      Ok(value) => downcast(key, value).map(CacheResult::from_network),
      Err(error) => {
        let stale = self
          .entries()
          .get(key)
          .and_then(|entry| entry.value.as_ref())
          .map(|cached| (Arc::clone(&cached.value), cached.cached_at));

        match stale {
          Some((value, cached_at)) => {
            downcast(key, value).map(|data| CacheResult::offline(data, cached_at))
          }
          None => Err(error),
        }
      }
    }
  }

  /// Mark a query stale right away and notify its observers.
  ///
  /// A fetch already running for the key is detached, so the next
  /// observation starts a new one instead of joining outdated work.
  pub fn invalidate(&self, key: &K) {
    if let Some(entry) = self.entries().get_mut(key) {
      entry.generation += 1;
      entry.in_flight = None;
    }
    debug!(query = %key.description(), "query invalidated");
    // No receivers just means nobody is observing right now
    let _ = self.invalidations.send(key.clone());
  }

  /// Whether the next observation of `key` would fetch.
  pub fn is_stale(&self, key: &K) -> bool {
    let entries = self.entries();
    match entries.get(key) {
      Some(entry) => match &entry.value {
        Some(cached) => self.is_value_stale(cached, entry.generation),
        None => true,
      },
      None => true,
    }
  }

  /// Last successful value for `key`, regardless of staleness.
  pub fn query_data<T: Send + Sync + 'static>(&self, key: &K) -> Option<Arc<T>> {
    let value = self
      .entries()
      .get(key)
      .and_then(|entry| entry.value.as_ref())
      .map(|cached| Arc::clone(&cached.value))?;
    value.downcast::<T>().ok()
  }

  /// When the last successful value for `key` was stored.
  pub fn cached_at(&self, key: &K) -> Option<DateTime<Utc>> {
    self
      .entries()
      .get(key)
      .and_then(|entry| entry.value.as_ref())
      .map(|cached| cached.cached_at)
  }

  /// Subscribe to invalidation notices.
  pub fn subscribe(&self) -> broadcast::Receiver<K> {
    self.invalidations.subscribe()
  }
}

impl<K: QueryKey> Default for QueryClient<K> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K: QueryKey> Clone for QueryClient<K> {
  fn clone(&self) -> Self {
    Self {
      entries: Arc::clone(&self.entries),
      stale_time: self.stale_time,
      invalidations: self.invalidations.clone(),
    }
  }
}

fn lock<K>(entries: &Store<K>) -> MutexGuard<'_, HashMap<K, Entry>> {
  // The store holds plain data, a panic elsewhere cannot leave it half-written
  entries.lock().unwrap_or_else(PoisonError::into_inner)
}

fn downcast<K: QueryKey, T: Send + Sync + 'static>(key: &K, value: AnyValue) -> Result<Arc<T>, String> {
  value
    .downcast::<T>()
    .map_err(|_| format!("Cached value for {} has an unexpected type", key.description()))
}

/// Wrap a fetch future so that its completion writes back into the store.
fn start_fetch<K, T, Fut>(entries: Store<K>, key: K, generation: u64, future: Fut) -> SharedFetch
where
  K: QueryKey,
  T: Send + Sync + 'static,
  Fut: Future<Output = Result<T, String>> + Send + 'static,
{
  debug!(query = %key.description(), "starting fetch");

  async move {
    let result = future.await.map(|data| Arc::new(data) as AnyValue);

    {
      let mut entries = lock(&entries);
      if let Some(entry) = entries.get_mut(&key) {
        // An invalidation may have detached us and started a newer fetch
        if entry.generation == generation {
          entry.in_flight = None;
        }
        if let Ok(value) = &result {
          let newer_value_stored = entry
            .value
            .as_ref()
            .is_some_and(|cached| cached.generation > generation);
          if !newer_value_stored {
            entry.value = Some(CachedValue {
              value: Arc::clone(value),
              cached_at: Utc::now(),
              generation,
            });
          }
        }
      }
    }

    if let Err(error) = &result {
      warn!(query = %key.description(), %error, "fetch failed");
    }
    result
  }
  .boxed()
  .shared()
}
