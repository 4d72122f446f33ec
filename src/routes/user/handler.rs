use axum::{
    extract::{Extension, Json, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tracing::{error, info, warn};

use crate::{
    AppState,
    auth::{AuthenticatedContext, ResponseCookie, SESSION_COOKIE, append_cookies, session_cookie},
    utils::{
        error_codes, error_to_api_response, generate_session_token, generate_stay_logged_in_key,
        hash_password, is_secure_transport, success_to_api_response, verify_password,
    },
};

use super::model::{
    EmptyResponse, LoginRequest, LoginResponse, MeResponse, RenewKeyRequest, RenewKeyResponse,
    UpdatePasswordRequest,
};

fn api_error(status: StatusCode, code: i32, msg: &str) -> Response {
    (status, error_to_api_response::<()>(code, msg.to_string())).into_response()
}

/// 登录失败不区分用户不存在、已停用或密码错误
fn login_failed() -> Response {
    api_error(StatusCode::OK, error_codes::AUTH_FAILED, "用户名或密码错误")
}

fn internal_error(msg: &str) -> Response {
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        error_codes::INTERNAL_ERROR,
        msg,
    )
}

fn with_cookies<'a>(cookies: impl IntoIterator<Item = &'a ResponseCookie>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    append_cookies(&mut headers, cookies);
    headers
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Json(req): Json<LoginRequest>,
) -> Response {
    let secure = is_secure_transport(&headers, &uri);

    let mut user = match state.users.find_by_username(req.username.trim()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("Login failed, unknown user {:?}", req.username);
            return login_failed();
        }
        Err(e) => {
            error!("Failed to load user {:?}: {}", req.username, e);
            return internal_error("数据库错误");
        }
    };

    if user.deactivated || user.deleted {
        warn!("Login of deactivated or deleted user {} refused", user.id);
        return login_failed();
    }

    // 验证密码
    match user.password_hash.as_deref().map(|h| verify_password(&req.password, h)) {
        Some(Ok(true)) => {}
        Some(Err(e)) => {
            error!("Failed to verify password of user {}: {}", user.id, e);
            return internal_error("密码校验失败");
        }
        Some(Ok(false)) | None => {
            warn!("Login failed, wrong password for user {}", user.id);
            return login_failed();
        }
    }

    let (token, expires_at) = match generate_session_token(user.id, &state.config) {
        Ok(token) => token,
        Err(e) => {
            error!("Failed to generate session token: {}", e);
            return internal_error("生成令牌失败");
        }
    };
    let mut cookies = vec![session_cookie(
        &token,
        state.config.session_expiration().as_secs() as i64,
        secure || state.config.force_secure_cookies,
    )];

    let mut stay_logged_in = false;
    if req.stay_logged_in {
        // 首次使用时生成密钥
        if user.stay_logged_in_key.as_deref().is_none_or(str::is_empty) {
            let key = generate_stay_logged_in_key();
            match state.users.renew_stay_logged_in_key(user.id, &key).await {
                Ok(Some(updated)) => user = updated,
                Ok(None) => {}
                Err(e) => {
                    error!("Failed to create stay-logged-in key for user {}: {}", user.id, e);
                    return internal_error("数据库错误");
                }
            }
        }
        match state.authenticator.issue_cookie(&user, secure) {
            Some(cookie) => {
                cookies.push(cookie);
                stay_logged_in = true;
            }
            None => warn!("Stay-logged-in cookie can't be issued for user {}", user.id),
        }
    }

    info!("User {} logged in", user.display_name());
    (
        StatusCode::OK,
        with_cookies(&cookies),
        success_to_api_response(LoginResponse {
            user: (&user).into(),
            token,
            expires_at,
            stay_logged_in,
        }),
    )
        .into_response()
}

/// 退出登录：删除会话和保持登录 cookie
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Response {
    let secure = is_secure_transport(&headers, &uri);
    let session = ResponseCookie::removal(SESSION_COOKIE, secure || state.config.force_secure_cookies);
    let stay = state.authenticator.removal_cookie(secure);

    (
        StatusCode::OK,
        with_cookies([&session, &stay]),
        success_to_api_response(EmptyResponse {}),
    )
        .into_response()
}

#[axum::debug_handler]
pub async fn me(Extension(context): Extension<AuthenticatedContext>) -> impl IntoResponse {
    let group_ids = context.group_ids();
    (
        StatusCode::OK,
        success_to_api_response(MeResponse {
            user: context.user,
            group_ids,
        }),
    )
}

/// 轮换保持登录密钥，其他设备上的保持登录 cookie 随之失效
#[axum::debug_handler]
pub async fn renew_stay_logged_in_key(
    Extension(context): Extension<AuthenticatedContext>,
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Json(req): Json<RenewKeyRequest>,
) -> Response {
    let secure = is_secure_transport(&headers, &uri);
    let key = generate_stay_logged_in_key();

    let user = match state
        .users
        .renew_stay_logged_in_key(context.user_id(), &key)
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => {
            return api_error(StatusCode::NOT_FOUND, error_codes::NOT_FOUND, "用户不存在");
        }
        Err(e) => {
            error!("Failed to renew stay-logged-in key: {}", e);
            return internal_error("更新密钥失败");
        }
    };

    let issued = if req.stay_logged_in {
        state.authenticator.issue_cookie(&user, secure)
    } else {
        None
    };
    let stay_logged_in = issued.is_some();
    let cookie = issued.unwrap_or_else(|| state.authenticator.removal_cookie(secure));

    (
        StatusCode::OK,
        with_cookies([&cookie]),
        success_to_api_response(RenewKeyResponse { stay_logged_in }),
    )
        .into_response()
}

/// 修改密码；同时轮换保持登录密钥，所有设备需要重新登录
#[axum::debug_handler]
pub async fn update_password(
    Extension(context): Extension<AuthenticatedContext>,
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Json(req): Json<UpdatePasswordRequest>,
) -> Response {
    let min = state.config.min_password_length;
    if req.new_password.chars().count() < min {
        return api_error(
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION_ERROR,
            &format!("密码长度至少为{}个字符", min),
        );
    }

    let user = match state.users.find_by_id(context.user_id()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return api_error(StatusCode::NOT_FOUND, error_codes::NOT_FOUND, "用户不存在");
        }
        Err(e) => {
            error!("Failed to load user {}: {}", context.user_id(), e);
            return internal_error("数据库错误");
        }
    };

    match user
        .password_hash
        .as_deref()
        .map(|h| verify_password(&req.old_password, h))
    {
        Some(Ok(true)) => {}
        Some(Err(e)) => {
            error!("Failed to verify password of user {}: {}", user.id, e);
            return internal_error("密码校验失败");
        }
        Some(Ok(false)) | None => {
            warn!("Password change of user {} refused, old password wrong", user.id);
            return api_error(StatusCode::OK, error_codes::AUTH_FAILED, "原密码错误");
        }
    }

    let password_hash = match hash_password(&req.new_password) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Failed to hash password: {}", e);
            return internal_error("密码加密失败");
        }
    };

    match state
        .users
        .update_password(user.id, &password_hash, &generate_stay_logged_in_key())
        .await
    {
        Ok(Some(_)) => {
            info!("Password of user {} changed", user.display_name());
            let secure = is_secure_transport(&headers, &uri);
            (
                StatusCode::OK,
                with_cookies([&state.authenticator.removal_cookie(secure)]),
                success_to_api_response(EmptyResponse {}),
            )
                .into_response()
        }
        Ok(None) => api_error(StatusCode::NOT_FOUND, error_codes::NOT_FOUND, "用户不存在"),
        Err(e) => {
            error!("Failed to update password of user {}: {}", user.id, e);
            internal_error("修改密码失败")
        }
    }
}
