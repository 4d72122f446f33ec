use std::sync::Arc;

use serde::Serialize;

use crate::cache::UserGroupCache;
use crate::database::UserRecord;

/// 去掉密码哈希和保持登录密钥后的用户信息
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SanitizedUser {
    pub id: i32,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: String,
}

impl From<&UserRecord> for SanitizedUser {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            display_name: user.display_name(),
        }
    }
}

/// 认证成功后的请求上下文，只在当前请求内有效
#[derive(Debug, Clone)]
pub struct AuthenticatedContext {
    pub user: SanitizedUser,
    pub groups: Arc<UserGroupCache>,
}

impl AuthenticatedContext {
    pub fn new(user: &UserRecord, groups: Arc<UserGroupCache>) -> Self {
        Self {
            user: SanitizedUser::from(user),
            groups,
        }
    }

    pub fn user_id(&self) -> i32 {
        self.user.id
    }

    pub fn group_ids(&self) -> Vec<i32> {
        self.groups.group_ids(self.user.id)
    }
}
