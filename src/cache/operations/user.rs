use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};

use crate::cache::keys::user_keys;
use crate::database::UserRecord;
use crate::error::StoreError;

/// 用户缓存操作
pub struct UserCacheOperations;

impl UserCacheOperations {
    /// 将用户记录缓存到 Redis
    pub async fn cache_user(
        redis: &Arc<RedisClient>,
        user: &UserRecord,
        ttl: u64,
    ) -> Result<(), StoreError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let key = user_keys::user_record_key(user.id);
        let json = serde_json::to_string(user)?;

        let _: () = conn.set_ex(key, json, ttl).await?;

        Ok(())
    }

    /// 从 Redis 获取用户记录
    pub async fn get_cached_user(
        redis: &Arc<RedisClient>,
        user_id: i32,
    ) -> Result<Option<UserRecord>, StoreError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let key = user_keys::user_record_key(user_id);
        let result: Option<String> = conn.get(key).await?;

        match result {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// 删除用户缓存
    pub async fn remove_user(redis: &Arc<RedisClient>, user_id: i32) -> Result<(), StoreError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let key = user_keys::user_record_key(user_id);
        let _: () = conn.del(key).await?;

        Ok(())
    }
}
