use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::context::AuthenticatedContext;
use crate::auth::cookie::{ResponseCookie, STAY_LOGGED_IN_COOKIE, refresh_stay_logged_in};
use crate::auth::policy::LoginPolicy;
use crate::auth::token::{PersistentLoginToken, TokenError};
use crate::cache::UserGroupCache;
use crate::database::{UserRecord, UserStore};
use crate::error::StoreError;

/// 保持登录成功：认证上下文以及需要写回响应的刷新后 cookie
#[derive(Debug, Clone)]
pub struct StayLoggedIn {
    pub context: AuthenticatedContext,
    pub cookie: ResponseCookie,
}

/// 校验保持登录 cookie 并重建认证上下文
///
/// 所有校验失败都只记录 warn 日志并返回 `Ok(None)`，调用方不会知道具体是哪一步失败。
/// 只有用户存储的基础设施故障会以 `Err` 向上传递。
#[derive(Clone)]
pub struct StayLoggedInAuthenticator {
    users: Arc<dyn UserStore>,
    policy: Arc<dyn LoginPolicy>,
    groups: Arc<UserGroupCache>,
    force_secure_cookies: bool,
}

impl StayLoggedInAuthenticator {
    pub fn new(
        users: Arc<dyn UserStore>,
        policy: Arc<dyn LoginPolicy>,
        groups: Arc<UserGroupCache>,
        force_secure_cookies: bool,
    ) -> Self {
        Self {
            users,
            policy,
            groups,
            force_secure_cookies,
        }
    }

    pub async fn validate(
        &self,
        cookie_value: Option<&str>,
        secure_transport: bool,
    ) -> Result<Option<StayLoggedIn>, StoreError> {
        let Some(value) = cookie_value else {
            return Ok(None);
        };
        let Some(user) = self.check(value).await? else {
            return Ok(None);
        };

        // 每次成功都刷新 cookie，延长滑动有效期
        let cookie = refresh_stay_logged_in(
            ResponseCookie::new(STAY_LOGGED_IN_COOKIE, value),
            secure_transport,
            self.force_secure_cookies,
        );
        info!(
            "User successfully logged in using stay-logged-in method: {}",
            user.display_name()
        );
        Ok(Some(StayLoggedIn {
            context: AuthenticatedContext::new(&user, Arc::clone(&self.groups)),
            cookie,
        }))
    }

    async fn check(&self, value: &str) -> Result<Option<UserRecord>, StoreError> {
        let token = match PersistentLoginToken::parse(value) {
            Ok(token) => token,
            Err(TokenError::Blank) => return Ok(None),
            Err(e) => {
                warn!("Invalid stay-logged-in cookie found: {}", e);
                return Ok(None);
            }
        };

        let Some(user) = self.users.find_by_id(token.user_id).await? else {
            warn!(
                "Invalid stay-logged-in cookie found (user {} not found)",
                token.user_id
            );
            return Ok(None);
        };

        if user.username != token.username {
            warn!(
                "Invalid stay-logged-in cookie found (user name {:?} wrong for user {}, maybe changed)",
                token.username, user.id
            );
            return Ok(None);
        }

        let current_key = user.stay_logged_in_key.as_deref().filter(|k| !k.is_empty());
        if current_key != Some(token.secret.as_str()) {
            warn!(
                "Invalid stay-logged-in cookie found (key of user {} renewed and/or password changed)",
                user.id
            );
            return Ok(None);
        }

        if !self.policy.allows_stay_logged_in(&user) {
            warn!(
                "Stay-logged-in wasn't accepted by the login handler: {}",
                user.display_name()
            );
            return Ok(None);
        }

        Ok(Some(user))
    }

    /// 登录或轮换密钥后为用户签发新的保持登录 cookie
    pub fn issue_cookie(&self, user: &UserRecord, secure_transport: bool) -> Option<ResponseCookie> {
        let token = PersistentLoginToken::for_user(user)?;
        Some(refresh_stay_logged_in(
            ResponseCookie::new(STAY_LOGGED_IN_COOKIE, token.to_string()),
            secure_transport,
            self.force_secure_cookies,
        ))
    }

    /// 删除客户端的保持登录 cookie
    pub fn removal_cookie(&self, secure_transport: bool) -> ResponseCookie {
        ResponseCookie::removal(
            STAY_LOGGED_IN_COOKIE,
            secure_transport || self.force_secure_cookies,
        )
    }
}
