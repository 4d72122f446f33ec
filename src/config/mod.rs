use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub session_expiration_secs: u64,
    /// 对应 server.servlet.session.cookie.secure，强制所有 cookie 带 Secure 标记
    pub force_secure_cookies: bool,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub user_cache_ttl_secs: u64,
    pub min_password_length: usize,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub application_home_dir: PathBuf,
    pub resources_dir: String,
    pub fonts_dir: String,
    pub logo_file: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let session_expiration = optional("SESSION_EXPIRATION")
            .map(|v| v.trim_end_matches('h').to_string())
            .map(|v| parse::<u64>("SESSION_EXPIRATION", &v))
            .transpose()?
            .unwrap_or(8);

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            server_host: optional("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port: parse_or("SERVER_PORT", 8080)?,
            session_expiration_secs: session_expiration * 3600,
            force_secure_cookies: parse_or("FORCE_SECURE_COOKIES", false)?,
            rate_limit_window_secs: parse_or("RATE_LIMIT_WINDOW", 60)?,
            rate_limit_requests: parse_or("RATE_LIMIT_REQUESTS", 100)?,
            user_cache_ttl_secs: parse_or("USER_CACHE_TTL", 300)?,
            min_password_length: parse_or("MIN_PASSWORD_LENGTH", 8)?,
            api_base_uri: optional("API_BASE_URI").unwrap_or_else(|| "/rs".into()),
            application_home_dir: optional("APPLICATION_HOME_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            resources_dir: optional("RESOURCES_DIR").unwrap_or_else(|| "resources".into()),
            fonts_dir: optional("FONTS_DIR").unwrap_or_else(|| "resources/fonts".into()),
            logo_file: optional("LOGO_FILE"),
        })
    }

    pub fn session_expiration(&self) -> Duration {
        Duration::from_secs(self.session_expiration_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn user_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.user_cache_ttl_secs)
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

/// 空字符串视为未配置
fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(value) => parse(name, &value),
        None => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// 测试用配置，不依赖环境变量
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/projectforge".into(),
            redis_url: "redis://127.0.0.1/".into(),
            jwt_secret: "test-secret".into(),
            session_expiration_secs: 8 * 3600,
            force_secure_cookies: false,
            rate_limit_window_secs: 60,
            rate_limit_requests: 100,
            user_cache_ttl_secs: 300,
            min_password_length: 8,
            server_host: "127.0.0.1".into(),
            server_port: 8080,
            api_base_uri: "/rs".into(),
            application_home_dir: PathBuf::from("."),
            resources_dir: "resources".into(),
            fonts_dir: "resources/fonts".into(),
            logo_file: None,
        }
    }
}
