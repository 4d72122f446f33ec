use serde::{Deserialize, Serialize};

use crate::auth::SanitizedUser;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub stay_logged_in: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: SanitizedUser,
    pub token: String,
    pub expires_at: i64,
    pub stay_logged_in: bool,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: SanitizedUser,
    pub group_ids: Vec<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct RenewKeyRequest {
    /// 为当前设备重新签发保持登录 cookie
    #[serde(default)]
    pub stay_logged_in: bool,
}

#[derive(Debug, Serialize)]
pub struct RenewKeyResponse {
    pub stay_logged_in: bool,
}

#[derive(Debug, Serialize)]
pub struct EmptyResponse {}
