//! Signing key resolution and caching.
//!
//! This module provides [`KeyResolver`], which caches the identity
//! provider's published key set and resolves individual keys by key ID.
//!
//! # Architecture
//!
//! ```text
//! token arrives → extract kid
//!              → check cached key map (fresh + present? → done)
//!              → miss? fetch the FULL key set once, replace the map wholesale
//!              → retry the lookup once
//!              → still missing? → UnknownKey
//! ```
//!
//! # Refresh coalescing
//!
//! Concurrent lookups that miss during the same window share a single
//! outbound fetch: the first caller through the refresh guard fetches,
//! every waiter observes the bumped generation and serves from the freshly
//! replaced map. The number of outbound fetches is observable via
//! [`fetch_count`](KeyResolver::fetch_count).
//!
//! # Failure semantics
//!
//! A fetch failure ([`ResolverError::KeyFetch`]) is a dependency outage and
//! is reported as such — it is never collapsed into "no such key".

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use cakewalk_storage::clock::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use url::Url;

use crate::{
    error::{KeyFetchError, ResolverError},
    keyset::{KeySet, SigningKey},
};

/// Default staleness bound for the cached key map (5 minutes).
///
/// This balances responsiveness to key rotation with provider load.
pub const DEFAULT_KEY_TTL: Duration = Duration::from_secs(300);

/// Fetches the full key-set document from the identity provider.
///
/// Implementations must be cheap to call concurrently; the resolver
/// guarantees it never issues overlapping fetches itself.
#[async_trait]
pub trait KeySetFetcher: Send + Sync {
    /// Retrieves and parses the provider's current key-set document.
    ///
    /// # Errors
    ///
    /// Returns [`KeyFetchError`] if the endpoint is unreachable or the
    /// document is malformed.
    async fn fetch_key_set(&self) -> Result<KeySet, KeyFetchError>;
}

/// [`KeySetFetcher`] that performs an HTTP GET against a published
/// key-set endpoint.
pub struct HttpKeySetFetcher {
    client: reqwest::Client,
    url: Url,
}

impl HttpKeySetFetcher {
    /// Creates a fetcher for the given key-set endpoint with a default client.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self { client: reqwest::Client::new(), url }
    }

    /// Creates a fetcher with a caller-supplied client (custom timeouts,
    /// proxies, etc.).
    #[must_use]
    pub fn with_client(url: Url, client: reqwest::Client) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl KeySetFetcher for HttpKeySetFetcher {
    async fn fetch_key_set(&self) -> Result<KeySet, KeyFetchError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| KeyFetchError::new(format!("key set endpoint unreachable: {e}")))?;

        let response = response
            .error_for_status()
            .map_err(|e| KeyFetchError::new(format!("key set endpoint returned error: {e}")))?;

        response
            .json::<KeySet>()
            .await
            .map_err(|e| KeyFetchError::new(format!("malformed key set document: {e}")))
    }
}

/// Cached state: the key map plus the bookkeeping needed to decide
/// staleness and detect refreshes that happened while a caller waited.
struct CacheState {
    keys: HashMap<String, Arc<SigningKey>>,
    refreshed_at: Option<DateTime<Utc>>,
    /// Bumped on every wholesale replacement of `keys`.
    generation: u64,
}

/// Resolves signing keys by key ID against a TTL-cached remote key set.
///
/// Process-wide state: share a single resolver (behind [`Arc`]) across all
/// request handlers so refreshes are coalesced globally.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use cakewalk_authn::{HttpKeySetFetcher, KeyResolver};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = HttpKeySetFetcher::new(Url::parse("https://id.example.com/keys")?);
/// let resolver = Arc::new(KeyResolver::new(Arc::new(fetcher)));
///
/// let key = resolver.resolve("key-2024-001").await?;
/// # Ok(())
/// # }
/// ```
pub struct KeyResolver {
    fetcher: Arc<dyn KeySetFetcher>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    state: RwLock<CacheState>,
    /// Single-flight guard: at most one outbound fetch at a time.
    refresh_lock: tokio::sync::Mutex<()>,
    fetch_count: AtomicU64,
}

impl KeyResolver {
    /// Creates a resolver with the default TTL and the system clock.
    #[must_use]
    pub fn new(fetcher: Arc<dyn KeySetFetcher>) -> Self {
        Self::with_ttl(fetcher, DEFAULT_KEY_TTL)
    }

    /// Creates a resolver with a custom staleness bound.
    #[must_use]
    pub fn with_ttl(fetcher: Arc<dyn KeySetFetcher>, ttl: Duration) -> Self {
        Self {
            fetcher,
            clock: Arc::new(SystemClock),
            ttl,
            state: RwLock::new(CacheState { keys: HashMap::new(), refreshed_at: None, generation: 0 }),
            refresh_lock: tokio::sync::Mutex::new(()),
            fetch_count: AtomicU64::new(0),
        }
    }

    /// Replaces the time source. Intended for tests.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Resolves the signing key for `kid`.
    ///
    /// Serves from the cached map when it is fresh; otherwise performs
    /// exactly one (coalesced) fetch of the full key set, replaces the map
    /// wholesale, and retries the lookup once.
    ///
    /// # Errors
    ///
    /// - [`ResolverError::UnknownKey`] if `kid` is absent even after a fresh fetch
    /// - [`ResolverError::KeyFetch`] if the key-set fetch fails
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, kid: &str) -> Result<Arc<SigningKey>, ResolverError> {
        // Fast path: fresh cache hit.
        if let Some(key) = self.lookup_fresh(kid) {
            tracing::debug!("key cache hit");
            return Ok(key);
        }

        let gen_before = self.state.read().generation;

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited on the guard.
        // If so, serve from the refreshed map instead of fetching again —
        // all waiters observe the same replacement.
        {
            let state = self.state.read();
            if state.generation != gen_before {
                tracing::debug!("refresh coalesced with concurrent caller");
                return state
                    .keys
                    .get(kid)
                    .cloned()
                    .ok_or_else(|| ResolverError::unknown_key(kid));
            }
        }

        self.refresh().await?;

        let state = self.state.read();
        state.keys.get(kid).cloned().ok_or_else(|| {
            tracing::warn!("key absent after fresh key set fetch");
            ResolverError::unknown_key(kid)
        })
    }

    /// Marks the cached map stale so the next lookup re-fetches.
    ///
    /// Call this when the provider is known to have rotated keys.
    pub fn invalidate(&self) {
        let mut state = self.state.write();
        state.refreshed_at = None;
    }

    /// Number of outbound key-set fetches performed so far.
    #[must_use]
    pub fn fetch_count(&self) -> u64 {
        self.fetch_count.load(Ordering::Relaxed)
    }

    /// Number of usable keys in the current map.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.state.read().keys.len()
    }

    /// Returns the key if the cache is fresh and contains it.
    fn lookup_fresh(&self, kid: &str) -> Option<Arc<SigningKey>> {
        let state = self.state.read();
        let refreshed_at = state.refreshed_at?;
        let age = self.clock.now().signed_duration_since(refreshed_at);
        // A negative age means the clock moved backwards; treat as stale.
        let fresh = age.to_std().map(|age| age < self.ttl).unwrap_or(false);
        if !fresh {
            return None;
        }
        state.keys.get(kid).cloned()
    }

    /// Fetches the key set and replaces the cached map wholesale.
    ///
    /// Must only be called while holding `refresh_lock`.
    async fn refresh(&self) -> Result<(), ResolverError> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        let key_set = self.fetcher.fetch_key_set().await?;

        let mut keys = HashMap::with_capacity(key_set.keys.len());
        for jwk in &key_set.keys {
            match jwk.to_signing_key() {
                Ok(key) => {
                    keys.insert(key.kid.clone(), Arc::new(key));
                },
                Err(reason) => {
                    tracing::warn!(kid = %jwk.kid, %reason, "skipping unusable key set entry");
                },
            }
        }

        let key_count = keys.len();
        let mut state = self.state.write();
        state.keys = keys;
        state.refreshed_at = Some(self.clock.now());
        state.generation = state.generation.wrapping_add(1);
        drop(state);

        tracing::debug!(key_count, "key set refreshed");
        Ok(())
    }
}
