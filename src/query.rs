//! Async query and mutation handles for views.
//!
//! Inspired by TanStack Query: a `Query<K, T>` observes one key of a shared
//! [`QueryClient`], and a `Mutation<V, R>` runs side-effecting work whose
//! outcome the caller inspects.
//!
//! # Example
//!
//! ```ignore
//! let api = cat_api.clone();
//! let mut query = Query::new(client.clone(), CatQueryKey::Cats, move || {
//!     let api = api.clone();
//!     async move { api.search_images().await.map_err(|e| e.to_string()) }
//! });
//!
//! // Start observing
//! query.fetch();
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! // In render
//! match query.state() {
//!     QueryState::Loading => render_spinner(),
//!     QueryState::Success(data) => render_data(data),
//!     QueryState::Error(e) => render_error(e),
//!     QueryState::Idle => {}
//! }
//! ```

use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

use crate::cache::{CacheResult, CacheSource, QueryClient, QueryKey};

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// First fetch running, nothing to show yet
  Loading,
  /// Data available (possibly stale while a refetch runs)
  Success(T),
  /// Fetch failed and there is no data
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }
}

/// A boxed future that returns a Result<T, String>
type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

type FetchResult<T> = Result<CacheResult<Arc<T>>, String>;

/// Observer of one cached query.
///
/// Query<K, T> encapsulates:
/// - The fetching logic (via a closure), run through the shared client
/// - Loading/success/error states
/// - Async result handling via channels
/// - Reacting to invalidations of its key
pub struct Query<K: QueryKey, T> {
  client: QueryClient<K>,
  key: K,
  state: QueryState<Arc<T>>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<FetchResult<T>>>,
  invalidations: broadcast::Receiver<K>,
  refetch_pending: bool,
  fetched_at: Option<DateTime<Utc>>,
  source: Option<CacheSource>,
}

impl<K: QueryKey, T: Send + Sync + 'static> Query<K, T> {
  /// Create a new query observing `key` on `client`.
  ///
  /// The fetcher is only invoked when the client has no fresh value and no
  /// fetch for the key is already running.
  pub fn new<F, Fut>(client: QueryClient<K>, key: K, fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    let invalidations = client.subscribe();
    Self {
      client,
      key,
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      receiver: None,
      invalidations,
      refetch_pending: false,
      fetched_at: None,
      source: None,
    }
  }

  /// Get the current state of the query.
  pub fn state(&self) -> &QueryState<Arc<T>> {
    &self.state
  }

  /// Get the data if the query succeeded.
  pub fn data(&self) -> Option<&T> {
    self.state.data().map(|d| d.as_ref())
  }

  /// Check if the query is waiting for its first result.
  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  /// Check if a fetch is running (first load or background refetch).
  pub fn is_fetching(&self) -> bool {
    self.receiver.is_some()
  }

  /// When the displayed data was fetched.
  pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
    self.fetched_at
  }

  /// Where the displayed data came from.
  pub fn source(&self) -> Option<CacheSource> {
    self.source
  }

  /// Observe the key: use cached data if fresh, fetch otherwise.
  ///
  /// This is a no-op while a fetch is already running.
  pub fn fetch(&mut self) {
    if self.is_fetching() {
      return;
    }
    self.start_fetch();
  }

  /// Invalidate the key so every observer (this one included) refetches.
  pub fn refetch(&mut self) {
    self.client.invalidate(&self.key);
    self.refetch_pending = true;
  }

  /// Re-observe the key once its cached value went stale.
  ///
  /// Only a settled query showing network or fresh-cache data refetches this
  /// way. Errors and offline fallbacks wait for an explicit refetch.
  pub fn refetch_if_stale(&mut self) -> bool {
    let settled = !self.is_fetching()
      && self.state.data().is_some()
      && self.source != Some(CacheSource::Offline);
    if settled && self.client.is_stale(&self.key) {
      self.start_fetch();
      return true;
    }
    false
  }

  /// Poll for invalidations and results from a pending fetch.
  ///
  /// Returns `true` if the state changed (data arrived, error occurred or a
  /// refetch started). Call this in your event loop tick handler.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;

    loop {
      match self.invalidations.try_recv() {
        Ok(key) if key == self.key => self.refetch_pending = true,
        Ok(_) => {}
        // Missed notices may have been ours
        Err(broadcast::error::TryRecvError::Lagged(_)) => self.refetch_pending = true,
        Err(_) => break,
      }
    }

    if let Some(receiver) = &mut self.receiver {
      // Try to receive without blocking
      match receiver.try_recv() {
        Ok(Ok(result)) => {
          self.fetched_at = Some(result.cached_at.unwrap_or_else(Utc::now));
          self.source = Some(result.source);
          self.state = QueryState::Success(result.data);
          self.receiver = None;
          changed = true;
        }
        Ok(Err(error)) => {
          self.state = QueryState::Error(error);
          self.source = None;
          self.receiver = None;
          changed = true;
        }
        Err(mpsc::error::TryRecvError::Empty) => {}
        Err(mpsc::error::TryRecvError::Disconnected) => {
          // Sender dropped without sending - treat as error
          self.state = QueryState::Error("Query was cancelled".to_string());
          self.receiver = None;
          changed = true;
        }
      }
    }

    // A refetch requested mid-flight waits for the running fetch to land
    if self.refetch_pending && !self.is_fetching() {
      self.refetch_pending = false;
      self.start_fetch();
      changed = true;
    }

    changed
  }

  /// Internal: start the fetch operation
  fn start_fetch(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    if self.state.data().is_none() {
      self.state = QueryState::Loading;
    }

    let client = self.client.clone();
    let key = self.key.clone();
    let future = (self.fetcher)();
    tokio::spawn(async move {
      let result = client.fetch_query(&key, move || future).await;
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(result);
    });
  }
}

impl<K: QueryKey, T: std::fmt::Debug> std::fmt::Debug for Query<K, T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("key", &self.key)
      .field("state", &self.state)
      .field("source", &self.source)
      .finish_non_exhaustive()
  }
}

/// A factory function that creates futures for one mutation run
type MutatorFn<V, R> = Arc<dyn Fn(V) -> BoxFuture<R> + Send + Sync>;

/// A finished mutation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome<V, R> {
  /// The variables the run was started with
  pub variables: V,
  pub result: Result<R, String>,
}

/// Side-effecting async operation with result delivery via polling.
///
/// Every `mutate` call runs independently; concurrent runs are neither
/// deduplicated nor cached.
pub struct Mutation<V, R> {
  mutator: MutatorFn<V, R>,
  sender: mpsc::UnboundedSender<MutationOutcome<V, R>>,
  receiver: mpsc::UnboundedReceiver<MutationOutcome<V, R>>,
  pending: usize,
}

impl<V, R> Mutation<V, R>
where
  V: Clone + Send + 'static,
  R: Send + 'static,
{
  pub fn new<F, Fut>(mutator: F) -> Self
  where
    F: Fn(V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, String>> + Send + 'static,
  {
    let (sender, receiver) = mpsc::unbounded_channel();
    Self {
      mutator: Arc::new(move |variables| Box::pin(mutator(variables))),
      sender,
      receiver,
      pending: 0,
    }
  }

  /// Start one run with the given variables.
  pub fn mutate(&mut self, variables: V) {
    self.pending += 1;

    let future = (self.mutator)(variables.clone());
    let sender = self.sender.clone();
    tokio::spawn(async move {
      let result = run_to_result(future).await;
      let _ = sender.send(MutationOutcome { variables, result });
    });
  }

  /// Take the next finished run, if any.
  pub fn poll(&mut self) -> Option<MutationOutcome<V, R>> {
    let outcome = self.receiver.try_recv().ok()?;
    self.pending = self.pending.saturating_sub(1);
    Some(outcome)
  }

  /// Whether some run has not been delivered through `poll` yet.
  pub fn is_pending(&self) -> bool {
    self.pending > 0
  }
}

/// Await a run on its own task so a panic becomes an ordinary error.
async fn run_to_result<R: Send + 'static>(future: BoxFuture<R>) -> Result<R, String> {
  match tokio::spawn(future).await {
    Ok(result) => result,
    Err(e) if e.is_panic() => Err("the operation panicked".to_string()),
    Err(e) => Err(e.to_string()),
  }
}

impl<V, R> std::fmt::Debug for Mutation<V, R> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Mutation")
      .field("pending", &self.pending)
      .finish_non_exhaustive()
  }
}
