// 数据库模块
// 用户存储抽象及其 Postgres / 内存实现

pub mod memory;
pub mod models;
pub mod repositories;

use async_trait::async_trait;

use crate::error::StoreError;

pub use memory::MemoryUserStore;
pub use models::{GroupMembership, UserRecord};
pub use repositories::{GroupRepository, PgUserStore};

/// 用户存储
///
/// 查询没有副作用，可被并发请求同时调用。返回 `Ok(None)` 表示用户不存在，
/// `Err` 只用于基础设施故障。
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// 更新密码，同时轮换保持登录密钥
    async fn update_password(
        &self,
        id: i32,
        password_hash: &str,
        stay_logged_in_key: &str,
    ) -> Result<Option<UserRecord>, StoreError>;

    async fn renew_stay_logged_in_key(
        &self,
        id: i32,
        stay_logged_in_key: &str,
    ) -> Result<Option<UserRecord>, StoreError>;
}
