use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 用户数据库实体（t_pf_user）
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i32,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password_hash: Option<String>,
    /// 每个用户独立的"保持登录"密钥，修改密码或手动更新时轮换
    pub stay_logged_in_key: Option<String>,
    pub deactivated: bool,
    pub deleted: bool,
}

impl UserRecord {
    /// 显示名称："名 姓 (用户名)"，没有姓名时直接使用用户名
    pub fn display_name(&self) -> String {
        let full_name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if full_name.is_empty() {
            self.username.clone()
        } else {
            format!("{} ({})", full_name, self.username)
        }
    }
}

/// 用户组成员关系（t_group_user）
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupMembership {
    pub group_id: i32,
    pub user_id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: Option<&str>, last: Option<&str>) -> UserRecord {
        UserRecord {
            id: 1,
            username: "kai".into(),
            first_name: first.map(String::from),
            last_name: last.map(String::from),
            password_hash: None,
            stay_logged_in_key: None,
            deactivated: false,
            deleted: false,
        }
    }

    #[test]
    fn display_name_uses_full_name() {
        assert_eq!(
            user(Some("Kai"), Some("Reinhard")).display_name(),
            "Kai Reinhard (kai)"
        );
    }

    #[test]
    fn display_name_falls_back_to_username() {
        assert_eq!(user(None, Some("  ")).display_name(), "kai");
        assert_eq!(user(None, None).display_name(), "kai");
    }
}
