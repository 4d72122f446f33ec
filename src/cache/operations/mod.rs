/// 缓存操作
/// 提供缓存操作的功能实现

// 用户缓存操作
pub mod user;

pub use user::UserCacheOperations;
