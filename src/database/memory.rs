use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::{UserRecord, UserStore};
use crate::error::StoreError;

/// 内存用户存储，用于本地运行和测试
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<i32, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = UserRecord>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.id, u)).collect()),
        }
    }

    /// 新增或覆盖用户
    pub async fn insert(&self, user: UserRecord) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn update<F>(&self, id: i32, f: F) -> Option<UserRecord>
    where
        F: FnOnce(&mut UserRecord),
    {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id)?;
        f(user);
        Some(user.clone())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update_password(
        &self,
        id: i32,
        password_hash: &str,
        stay_logged_in_key: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .update(id, |u| {
                u.password_hash = Some(password_hash.to_string());
                u.stay_logged_in_key = Some(stay_logged_in_key.to_string());
            })
            .await)
    }

    async fn renew_stay_logged_in_key(
        &self,
        id: i32,
        stay_logged_in_key: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .update(id, |u| u.stay_logged_in_key = Some(stay_logged_in_key.to_string()))
            .await)
    }
}
