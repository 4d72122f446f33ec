use std::fmt;

use axum::http::{
    HeaderMap, HeaderValue,
    header::{InvalidHeaderValue, SET_COOKIE},
};

/// 保持登录 cookie 名称
pub const STAY_LOGGED_IN_COOKIE: &str = "stayLoggedIn";

/// 会话 cookie 名称（JWT）
pub const SESSION_COOKIE: &str = "PF_SESSION";

/// 保持登录 cookie 有效期：30 天
pub const STAY_LOGGED_IN_MAX_AGE: i64 = 30 * 24 * 3600;

/// 写回客户端的 cookie 及其属性
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseCookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub max_age: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
}

impl ResponseCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            max_age: None,
            http_only: false,
            secure: false,
        }
    }

    /// 让浏览器立即删除该 cookie
    pub fn removal(name: impl Into<String>, secure: bool) -> Self {
        Self {
            path: Some("/".into()),
            max_age: Some(0),
            http_only: true,
            secure,
            ..Self::new(name, "")
        }
    }

    pub fn to_header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&self.to_string())
    }
}

impl fmt::Display for ResponseCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(path) = &self.path {
            write!(f, "; Path={}", path)?;
        }
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age)?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        Ok(())
    }
}

/// 刷新保持登录 cookie：重置有效期、路径和 HttpOnly。
///
/// 请求经由安全连接或配置了强制 secure 时设置 `Secure`，否则保留原值。
pub fn refresh_stay_logged_in(
    mut cookie: ResponseCookie,
    secure_transport: bool,
    force_secure: bool,
) -> ResponseCookie {
    cookie.max_age = Some(STAY_LOGGED_IN_MAX_AGE);
    cookie.path = Some("/".into());
    if secure_transport || force_secure {
        tracing::debug!("Set secure cookie");
        cookie.secure = true;
    } else {
        tracing::debug!("Set unsecure cookie");
    }
    cookie.http_only = true;
    cookie
}

/// 会话 cookie（JWT），有效期与令牌一致
pub fn session_cookie(token: &str, max_age: i64, secure: bool) -> ResponseCookie {
    ResponseCookie {
        path: Some("/".into()),
        max_age: Some(max_age),
        http_only: true,
        secure,
        ..ResponseCookie::new(SESSION_COOKIE, token)
    }
}

/// 追加 `Set-Cookie` 响应头，无法编码的 cookie 记录错误后跳过
pub fn append_cookies<'a>(
    headers: &mut HeaderMap,
    cookies: impl IntoIterator<Item = &'a ResponseCookie>,
) {
    for cookie in cookies {
        match cookie.to_header_value() {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => tracing::error!("Failed to encode cookie {}: {}", cookie.name, e),
        }
    }
}

/// 只追加响应中尚未设置过的 cookie，处理器自己写入的同名 cookie 优先
pub fn append_cookies_if_absent<'a>(
    headers: &mut HeaderMap,
    cookies: impl IntoIterator<Item = &'a ResponseCookie>,
) {
    for cookie in cookies {
        let prefix = format!("{}=", cookie.name);
        let already_set = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.starts_with(&prefix));
        if !already_set {
            append_cookies(headers, [cookie]);
        }
    }
}
