use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::Client as RedisClient;
use tokio::sync::Mutex;

use crate::cache::operations::UserCacheOperations;
use crate::database::{UserRecord, UserStore};
use crate::error::StoreError;

/// 用户记录缓存
#[async_trait]
pub trait UserCache: Send + Sync {
    async fn get(&self, id: i32) -> Result<Option<UserRecord>, StoreError>;
    async fn put(&self, user: &UserRecord) -> Result<(), StoreError>;
    async fn remove(&self, id: i32) -> Result<(), StoreError>;
}

/// Redis 实现，条目按 TTL 过期
pub struct RedisUserCache {
    redis: Arc<RedisClient>,
    ttl: Duration,
}

impl RedisUserCache {
    pub fn new(redis: Arc<RedisClient>, ttl: Duration) -> Self {
        Self { redis, ttl }
    }
}

#[async_trait]
impl UserCache for RedisUserCache {
    async fn get(&self, id: i32) -> Result<Option<UserRecord>, StoreError> {
        UserCacheOperations::get_cached_user(&self.redis, id).await
    }

    async fn put(&self, user: &UserRecord) -> Result<(), StoreError> {
        UserCacheOperations::cache_user(&self.redis, user, self.ttl.as_secs()).await
    }

    async fn remove(&self, id: i32) -> Result<(), StoreError> {
        UserCacheOperations::remove_user(&self.redis, id).await
    }
}

/// 带读穿缓存的用户存储
///
/// 缓存读取失败时退回到底层存储。写操作完成后删除缓存条目，删除失败时写操作
/// 返回错误，轮换后的密钥不会被旧缓存继续使用。
///
/// `generation` 在每次删除缓存时递增；读取开始后发生过写操作的结果不回填缓存，
/// 避免并发读把轮换前的记录重新写回。
pub struct CachedUserStore<S> {
    inner: S,
    cache: Arc<dyn UserCache>,
    generation: Mutex<u64>,
}

impl<S: UserStore> CachedUserStore<S> {
    pub fn new(inner: S, cache: Arc<dyn UserCache>) -> Self {
        Self {
            inner,
            cache,
            generation: Mutex::new(0),
        }
    }

    pub fn with_redis(inner: S, redis: Arc<RedisClient>, ttl: Duration) -> Self {
        Self::new(inner, Arc::new(RedisUserCache::new(redis, ttl)))
    }

    async fn current_generation(&self) -> u64 {
        *self.generation.lock().await
    }

    async fn store_in_cache(&self, user: &UserRecord, seen: u64) {
        let generation = self.generation.lock().await;
        if *generation != seen {
            tracing::debug!("User {} changed while loading, not cached", user.id);
            return;
        }
        if let Err(e) = self.cache.put(user).await {
            tracing::warn!("Failed to cache user {}: {}", user.id, e);
        }
    }

    async fn invalidate(&self, id: i32) -> Result<(), StoreError> {
        let mut generation = self.generation.lock().await;
        *generation += 1;
        self.cache.remove(id).await.map_err(|e| {
            tracing::error!("Failed to invalidate cached user {}: {}", id, e);
            e
        })
    }
}

#[async_trait]
impl<S: UserStore> UserStore for CachedUserStore<S> {
    async fn find_by_id(&self, id: i32) -> Result<Option<UserRecord>, StoreError> {
        match self.cache.get(id).await {
            Ok(Some(user)) => return Ok(Some(user)),
            Ok(None) => {}
            Err(e) => tracing::warn!("User cache unavailable, reading from store: {}", e),
        }

        let seen = self.current_generation().await;
        let user = self.inner.find_by_id(id).await?;
        if let Some(user) = &user {
            self.store_in_cache(user, seen).await;
        }
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        // 缓存只按 id 索引
        let seen = self.current_generation().await;
        let user = self.inner.find_by_username(username).await?;
        if let Some(user) = &user {
            self.store_in_cache(user, seen).await;
        }
        Ok(user)
    }

    async fn update_password(
        &self,
        id: i32,
        password_hash: &str,
        stay_logged_in_key: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let user = self
            .inner
            .update_password(id, password_hash, stay_logged_in_key)
            .await?;
        self.invalidate(id).await?;
        Ok(user)
    }

    async fn renew_stay_logged_in_key(
        &self,
        id: i32,
        stay_logged_in_key: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let user = self
            .inner
            .renew_stay_logged_in_key(id, stay_logged_in_key)
            .await?;
        self.invalidate(id).await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    use tokio::sync::Notify;

    use super::*;
    use crate::database::MemoryUserStore;

    #[derive(Default)]
    struct MemoryCache {
        entries: Mutex<HashMap<i32, UserRecord>>,
        fail_remove: AtomicBool,
    }

    impl MemoryCache {
        async fn cached_key(&self, id: i32) -> Option<String> {
            self.entries
                .lock()
                .await
                .get(&id)
                .and_then(|u| u.stay_logged_in_key.clone())
        }
    }

    #[async_trait]
    impl UserCache for MemoryCache {
        async fn get(&self, id: i32) -> Result<Option<UserRecord>, StoreError> {
            Ok(self.entries.lock().await.get(&id).cloned())
        }

        async fn put(&self, user: &UserRecord) -> Result<(), StoreError> {
            self.entries.lock().await.insert(user.id, user.clone());
            Ok(())
        }

        async fn remove(&self, id: i32) -> Result<(), StoreError> {
            if self.fail_remove.load(Ordering::SeqCst) {
                return Err(StoreError::Serialization(
                    serde_json::from_str::<()>("cache down").unwrap_err(),
                ));
            }
            self.entries.lock().await.remove(&id);
            Ok(())
        }
    }

    /// 读到记录后等待放行，用来复现读写交错
    struct PausingStore {
        inner: MemoryUserStore,
        loaded: Notify,
        resume: Notify,
        pause: AtomicBool,
    }

    #[async_trait]
    impl UserStore for PausingStore {
        async fn find_by_id(&self, id: i32) -> Result<Option<UserRecord>, StoreError> {
            let user = self.inner.find_by_id(id).await?;
            if self.pause.swap(false, Ordering::SeqCst) {
                self.loaded.notify_one();
                self.resume.notified().await;
            }
            Ok(user)
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
            self.inner.find_by_username(username).await
        }

        async fn update_password(
            &self,
            id: i32,
            password_hash: &str,
            stay_logged_in_key: &str,
        ) -> Result<Option<UserRecord>, StoreError> {
            self.inner
                .update_password(id, password_hash, stay_logged_in_key)
                .await
        }

        async fn renew_stay_logged_in_key(
            &self,
            id: i32,
            stay_logged_in_key: &str,
        ) -> Result<Option<UserRecord>, StoreError> {
            self.inner.renew_stay_logged_in_key(id, stay_logged_in_key).await
        }
    }

    fn alice() -> UserRecord {
        UserRecord {
            id: 42,
            username: "alice".into(),
            first_name: None,
            last_name: None,
            password_hash: Some("$2b$12$hash".into()),
            stay_logged_in_key: Some("abc123".into()),
            deactivated: false,
            deleted: false,
        }
    }

    #[tokio::test]
    async fn reads_through_and_rotation_invalidates() {
        let cache = Arc::new(MemoryCache::default());
        let store = CachedUserStore::new(MemoryUserStore::with_users([alice()]), cache.clone());

        store.find_by_id(42).await.unwrap();
        assert_eq!(cache.cached_key(42).await.as_deref(), Some("abc123"));

        store.renew_stay_logged_in_key(42, "k2").await.unwrap();
        assert_eq!(cache.cached_key(42).await, None);

        let user = store.find_by_id(42).await.unwrap().unwrap();
        assert_eq!(user.stay_logged_in_key.as_deref(), Some("k2"));
    }

    #[tokio::test]
    async fn password_change_invalidates() {
        let cache = Arc::new(MemoryCache::default());
        let store = CachedUserStore::new(MemoryUserStore::with_users([alice()]), cache.clone());

        store.find_by_id(42).await.unwrap();
        store.update_password(42, "$2b$12$new", "k3").await.unwrap();

        let user = store.find_by_id(42).await.unwrap().unwrap();
        assert_eq!(user.stay_logged_in_key.as_deref(), Some("k3"));
    }

    #[tokio::test]
    async fn failed_invalidation_is_reported() {
        let cache = Arc::new(MemoryCache::default());
        let store = CachedUserStore::new(MemoryUserStore::with_users([alice()]), cache.clone());

        store.find_by_id(42).await.unwrap();
        cache.fail_remove.store(true, Ordering::SeqCst);

        assert!(store.renew_stay_logged_in_key(42, "k2").await.is_err());
        assert!(store.update_password(42, "$2b$12$new", "k3").await.is_err());
    }

    #[tokio::test]
    async fn concurrent_read_does_not_restore_rotated_key() {
        let cache = Arc::new(MemoryCache::default());
        let store = Arc::new(CachedUserStore::new(
            PausingStore {
                inner: MemoryUserStore::with_users([alice()]),
                loaded: Notify::new(),
                resume: Notify::new(),
                pause: AtomicBool::new(true),
            },
            cache.clone(),
        ));

        let reader = tokio::spawn({
            let store = store.clone();
            async move { store.find_by_id(42).await.unwrap() }
        });

        // 读操作已取到轮换前的记录
        store.inner.loaded.notified().await;
        store.renew_stay_logged_in_key(42, "k2").await.unwrap();
        store.inner.resume.notify_one();

        let stale = reader.await.unwrap().unwrap();
        assert_eq!(stale.stay_logged_in_key.as_deref(), Some("abc123"));
        assert_eq!(cache.cached_key(42).await, None);

        let user = store.find_by_id(42).await.unwrap().unwrap();
        assert_eq!(user.stay_logged_in_key.as_deref(), Some("k2"));
    }
}
