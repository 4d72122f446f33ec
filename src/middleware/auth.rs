use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, Cookie, HeaderMapExt, authorization::Bearer};

use crate::{
    AppState,
    auth::{
        AuthenticatedContext, SESSION_COOKIE, STAY_LOGGED_IN_COOKIE, StayLoggedIn,
        append_cookies_if_absent, session_cookie,
    },
    error::AppError,
    utils::{generate_session_token, is_secure_transport, verify_session_token},
};

/// 认证中间件
///
/// 1. Bearer 或 `PF_SESSION` cookie 中的会话令牌有效时直接放行（依次尝试）；
/// 2. 否则尝试保持登录 cookie，成功后签发新的会话 cookie 并刷新保持登录 cookie；
/// 3. 都失败则返回 401。
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let headers = req.headers();
    let cookies = headers.typed_get::<Cookie>();
    let secure = is_secure_transport(headers, req.uri());
    // Bearer 无效时仍尝试会话 cookie
    let session_tokens: Vec<String> = headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
        .into_iter()
        .chain(
            cookies
                .as_ref()
                .and_then(|c| c.get(SESSION_COOKIE))
                .map(str::to_string),
        )
        .collect();
    let stay_logged_in = cookies
        .as_ref()
        .and_then(|c| c.get(STAY_LOGGED_IN_COOKIE))
        .map(str::to_string);

    for token in &session_tokens {
        if let Some(context) = session_context(&state, token).await? {
            req.extensions_mut().insert(context);
            return Ok(next.run(req).await);
        }
    }

    let Some(StayLoggedIn { context, cookie }) = state
        .authenticator
        .validate(stay_logged_in.as_deref(), secure)
        .await?
    else {
        return Err(AppError::Unauthorized);
    };

    let (token, _) = generate_session_token(context.user_id(), &state.config).map_err(|e| {
        tracing::error!("Failed to generate session token: {}", e);
        AppError::InternalServerError
    })?;
    let session = session_cookie(
        &token,
        state.config.session_expiration().as_secs() as i64,
        secure || state.config.force_secure_cookies,
    );

    req.extensions_mut().insert(context);
    let mut response = next.run(req).await;
    append_cookies_if_absent(response.headers_mut(), [&session, &cookie]);
    Ok(response)
}

/// 由会话令牌恢复认证上下文；令牌无效或用户已不可用时返回 `None`
async fn session_context(
    state: &AppState,
    token: &str,
) -> Result<Option<AuthenticatedContext>, AppError> {
    let claims = match verify_session_token(token, &state.config) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Session token rejected: {}", e);
            return Ok(None);
        }
    };
    let Some(user_id) = claims.user_id() else {
        tracing::warn!("Session token with invalid subject {:?}", claims.sub);
        return Ok(None);
    };
    match state.users.find_by_id(user_id).await? {
        Some(user) if !user.deactivated && !user.deleted => Ok(Some(AuthenticatedContext::new(
            &user,
            state.groups.clone(),
        ))),
        Some(_) => {
            tracing::warn!("Session of deactivated or deleted user {} rejected", user_id);
            Ok(None)
        }
        None => {
            tracing::warn!("Session of unknown user {} rejected", user_id);
            Ok(None)
        }
    }
}
