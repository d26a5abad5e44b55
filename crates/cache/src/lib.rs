//! Tag-aware response cache.
//!
//! Entries hold fully encoded response bodies. Every entry is filed under one
//! or more [`CacheTag`]s, and each tag carries a version number that is part
//! of the storage key. Invalidating a tag bumps its version: older entries are
//! never looked up again and age out through their expiry or capacity
//! eviction.

use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use bytes::Bytes;
use moka::future::Cache;
use moka::Expiry;

/// Label shared by entries that are invalidated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheTag(&'static str);

impl CacheTag {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Logical cache key, before tag versions are folded in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key of one listing page: `get{resource}List-{page}-{limit}-{audience}`.
    pub fn list(resource: &str, page: i64, limit: i64, audience: &str) -> Self {
        Self(format!("get{resource}List-{page}-{limit}-{audience}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
struct CachedPayload {
    body: Bytes,
    ttl: Duration,
}

/// Per-entry expiry read from the payload itself.
struct PayloadExpiry;

impl Expiry<String, CachedPayload> for PayloadExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedPayload,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Process-wide cache of encoded responses with tag invalidation.
///
/// Cloning is cheap; clones share entries and tag versions.
#[derive(Clone)]
pub struct ResponseCache {
    entries: Cache<String, CachedPayload>,
    versions: Arc<RwLock<HashMap<CacheTag, u64>>>,
}

impl ResponseCache {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(PayloadExpiry)
                .build(),
            versions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Return the cached body for `key`, or run `compute`, store its output
    /// under `tags` for `ttl` and return it.
    ///
    /// Concurrent misses on the same key share a single `compute` call.
    /// Errors are returned to every waiter and nothing is stored.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &CacheKey,
        tags: &[CacheTag],
        ttl: Duration,
        compute: F,
    ) -> anyhow::Result<Bytes>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Bytes>>,
    {
        let storage_key = self.storage_key(key, tags);

        if let Some(hit) = self.entries.get(&storage_key).await {
            tracing::debug!(target: "libris-cache", key = %key, "cache hit");
            return Ok(hit.body);
        }

        tracing::debug!(target: "libris-cache", key = %key, "cache miss");

        let payload = self
            .entries
            .try_get_with(storage_key, async move {
                let body = compute().await?;
                Ok::<_, anyhow::Error>(CachedPayload { body, ttl })
            })
            .await
            .map_err(|err| anyhow::anyhow!("{err:#}"))?;

        Ok(payload.body)
    }

    /// Retire every entry filed under any of `tags`.
    pub fn invalidate_tags(&self, tags: &[CacheTag]) {
        let mut versions = self
            .versions
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        for tag in tags {
            let version = versions.entry(*tag).or_insert(0);
            *version += 1;
            tracing::debug!(target: "libris-cache", tag = %tag, version = *version, "tag invalidated");
        }
    }

    /// Number of times `tag` has been invalidated.
    pub fn tag_version(&self, tag: CacheTag) -> u64 {
        self.versions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&tag)
            .copied()
            .unwrap_or(0)
    }

    fn storage_key(&self, key: &CacheKey, tags: &[CacheTag]) -> String {
        let versions = self
            .versions
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let mut storage_key = key.0.clone();
        for tag in tags {
            let version = versions.get(tag).copied().unwrap_or(0);
            // Writing into a String cannot fail.
            let _ = write!(storage_key, "|{tag}#{version}");
        }
        storage_key
    }
}

impl fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entry_count", &self.entries.entry_count())
            .finish_non_exhaustive()
    }
}
