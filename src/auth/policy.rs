use crate::database::UserRecord;

/// 登录策略：可以否决保持登录
pub trait LoginPolicy: Send + Sync {
    fn allows_stay_logged_in(&self, user: &UserRecord) -> bool;
}

/// 默认策略：已停用或已删除的用户不能保持登录
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultLoginPolicy;

impl LoginPolicy for DefaultLoginPolicy {
    fn allows_stay_logged_in(&self, user: &UserRecord) -> bool {
        !user.deactivated && !user.deleted
    }
}
