//! In-memory query cache shared by every view.
//!
//! This module provides a TanStack-Query-style client that:
//! - Caches the last successful result per query key
//! - Serves cached data until it passes the staleness window
//! - Collapses concurrent fetches for the same key into one request
//! - Supports explicit invalidation, broadcast to active observers

mod client;
mod traits;

pub use client::QueryClient;
pub use traits::{CacheResult, CacheSource, QueryKey};
