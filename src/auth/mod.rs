//! 保持登录（stay-logged-in）认证
//!
//! 登录时签发 `<userId>:<username>:<stayLoggedInKey>` 形式的长期 cookie，
//! 会话失效后用它重建认证上下文。用户修改密码或手动更新密钥会使所有旧 cookie 失效。

pub mod context;
pub mod cookie;
pub mod policy;
pub mod stay_logged_in;
pub mod token;

pub use context::{AuthenticatedContext, SanitizedUser};
pub use cookie::{
    ResponseCookie, SESSION_COOKIE, STAY_LOGGED_IN_COOKIE, STAY_LOGGED_IN_MAX_AGE,
    append_cookies, append_cookies_if_absent, refresh_stay_logged_in, session_cookie,
};
pub use policy::{DefaultLoginPolicy, LoginPolicy};
pub use stay_logged_in::{StayLoggedIn, StayLoggedInAuthenticator};
pub use token::{PersistentLoginToken, TokenError};
