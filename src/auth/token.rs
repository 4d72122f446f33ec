use std::fmt;

use thiserror::Error;

use crate::database::UserRecord;

/// 保持登录 cookie 的值：`<userId>:<username>:<stayLoggedInKey>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistentLoginToken {
    pub user_id: i32,
    pub username: String,
    pub secret: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("blank cookie value")]
    Blank,

    #[error("expected 3 colon separated fields, found {0}")]
    FieldCount(usize),

    #[error("invalid user id {0:?}")]
    UserId(String),
}

impl PersistentLoginToken {
    pub fn parse(value: &str) -> Result<Self, TokenError> {
        if value.trim().is_empty() {
            return Err(TokenError::Blank);
        }
        let fields: Vec<&str> = value.split(':').collect();
        let [id, username, secret] = fields.as_slice() else {
            return Err(TokenError::FieldCount(fields.len()));
        };
        let user_id = id
            .trim()
            .parse::<i32>()
            .map_err(|_| TokenError::UserId(id.to_string()))?;
        Ok(Self {
            user_id,
            username: username.to_string(),
            secret: secret.to_string(),
        })
    }

    /// 为用户签发令牌
    ///
    /// 用户没有密钥，或用户名/密钥中含有 `:` 及 RFC 6265 cookie-octet 以外的字符
    /// （空格、`"`、`,`、`;`、`\\`、控制字符、非 ASCII）时无法签发。
    pub fn for_user(user: &UserRecord) -> Option<Self> {
        let secret = user.stay_logged_in_key.as_deref().filter(|k| !k.is_empty())?;
        if !is_token_field(&user.username) || !is_token_field(secret) {
            return None;
        }
        Some(Self {
            user_id: user.id,
            username: user.username.clone(),
            secret: secret.to_string(),
        })
    }
}

fn is_token_field(field: &str) -> bool {
    !field.is_empty() && field.bytes().all(|b| b != b':' && is_cookie_octet(b))
}

// cookie-octet = %x21 / %x23-2B / %x2D-3A / %x3C-5B / %x5D-7E
fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

impl fmt::Display for PersistentLoginToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.user_id, self.username, self.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_fields() {
        let token = PersistentLoginToken::parse("42:alice:abc123").unwrap();
        assert_eq!(token.user_id, 42);
        assert_eq!(token.username, "alice");
        assert_eq!(token.secret, "abc123");
        assert_eq!(token.to_string(), "42:alice:abc123");
    }

    #[test]
    fn rejects_wrong_field_counts() {
        assert_eq!(
            PersistentLoginToken::parse("42:alice"),
            Err(TokenError::FieldCount(2))
        );
        assert_eq!(
            PersistentLoginToken::parse("42:alice:abc:def"),
            Err(TokenError::FieldCount(4))
        );
        assert_eq!(
            PersistentLoginToken::parse("42"),
            Err(TokenError::FieldCount(1))
        );
    }

    #[test]
    fn rejects_blank_and_bad_ids() {
        assert_eq!(PersistentLoginToken::parse("  "), Err(TokenError::Blank));
        assert_eq!(
            PersistentLoginToken::parse("x:alice:abc"),
            Err(TokenError::UserId("x".into()))
        );
    }

    #[test]
    fn issuing_requires_key_without_colons() {
        let mut user = UserRecord {
            id: 7,
            username: "bob".into(),
            first_name: None,
            last_name: None,
            password_hash: None,
            stay_logged_in_key: None,
            deactivated: false,
            deleted: false,
        };
        assert!(PersistentLoginToken::for_user(&user).is_none());
        user.stay_logged_in_key = Some("k3y".into());
        assert_eq!(
            PersistentLoginToken::for_user(&user).map(|t| t.to_string()),
            Some("7:bob:k3y".into())
        );
        user.username = "b:ob".into();
        assert!(PersistentLoginToken::for_user(&user).is_none());
    }

    #[test]
    fn issuing_refuses_characters_browsers_would_cut() {
        let mut user = UserRecord {
            id: 5,
            username: "jo;hn".into(),
            first_name: None,
            last_name: None,
            password_hash: None,
            stay_logged_in_key: Some("k3y".into()),
            deactivated: false,
            deleted: false,
        };
        for name in ["jo;hn", "jo,hn", "jo hn", "jo\"hn", "jo\\hn", "jöhn", "jo\thn"] {
            user.username = name.into();
            assert!(PersistentLoginToken::for_user(&user).is_none(), "{name:?}");
        }

        user.username = "john.doe@example.org".into();
        assert!(PersistentLoginToken::for_user(&user).is_some());
        user.stay_logged_in_key = Some("k3y;x".into());
        assert!(PersistentLoginToken::for_user(&user).is_none());
    }
}
