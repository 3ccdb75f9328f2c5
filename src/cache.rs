use std::time::{Duration, Instant};

use moka::{future::Cache, Expiry};

/// Cache key for a rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Global feed, one entry per requested page number. The content never
    /// depends on who is looking at it.
    pub fn index_page(page: i32) -> Self {
        CacheKey(format!("index_page:{page}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[axum::async_trait]
pub trait PageCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Option<String>;
    async fn set(&self, key: CacheKey, content: String, ttl: Duration);
    async fn invalidate(&self, key: &CacheKey);
    /// Drops every entry, the next request of any page regenerates it.
    async fn clear(&self);
}

#[derive(Debug, Clone)]
struct CachedPage {
    content: String,
    ttl: Duration,
}

struct PerEntryTtl;

impl Expiry<String, CachedPage> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedPage,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedPage,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

pub struct MokaPageCache {
    inner: Cache<String, CachedPage>,
}

impl MokaPageCache {
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { inner }
    }
}

impl Default for MokaPageCache {
    fn default() -> Self {
        Self::new(1_000)
    }
}

#[axum::async_trait]
impl PageCache for MokaPageCache {
    async fn get(&self, key: &CacheKey) -> Option<String> {
        self.inner.get(key.as_str()).await.map(|page| page.content)
    }

    async fn set(&self, key: CacheKey, content: String, ttl: Duration) {
        self.inner.insert(key.0, CachedPage { content, ttl }).await;
    }

    async fn invalidate(&self, key: &CacheKey) {
        self.inner.invalidate(key.as_str()).await;
    }

    async fn clear(&self) {
        self.inner.invalidate_all();
    }
}
