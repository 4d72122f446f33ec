// 缓存模块
// Redis 用户缓存以及进程内缓存（用户组、资源日志去重）

pub mod group;
pub mod keys;
pub mod operations;
pub mod resource_log;
pub mod store;

// 重新导出常用类型，方便其他模块使用
pub use group::UserGroupCache;
pub use operations::UserCacheOperations;
pub use resource_log::ResourceLogCache;
pub use store::{CachedUserStore, RedisUserCache, UserCache};
