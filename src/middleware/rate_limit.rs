use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::{AsyncCommands, RedisError};

use crate::{
    cache::keys::rate_limit_key,
    config::Config,
    utils::{error_codes, error_to_api_response},
};

#[derive(Clone)]
pub struct RateLimiter {
    redis: Arc<redis::Client>,
    config: Arc<Config>,
}

/// 客户端 IP：`X-Real-IP`，其次 `X-Forwarded-For` 的第一个非空值，最后是连接地址
fn client_ip(req: &Request<Body>) -> String {
    fn header<'a>(req: &'a Request<Body>, name: &str) -> Option<&'a str> {
        req.headers().get(name).and_then(|h| h.to_str().ok())
    }
    let remote_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string());

    header(req, "x-real-ip")
        .or_else(|| {
            header(req, "x-forwarded-for")
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
        .or(remote_ip.as_deref())
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

fn redis_failure(ip: &str) -> impl FnOnce(RedisError) -> StatusCode + '_ {
    move |e| {
        tracing::error!("Rate limit check for {} failed: {}", ip, e);
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl RateLimiter {
    pub fn new(redis: redis::Client, config: Config) -> Self {
        Self {
            redis: Arc::new(redis),
            config: Arc::new(config),
        }
    }

    pub async fn check_rate_limit(
        self: Arc<Self>,
        req: Request<Body>,
        next: Next,
    ) -> Result<Response, StatusCode> {
        let ip = client_ip(&req);
        let key = rate_limit_key(&ip);
        let window = self.config.rate_limit_window().as_secs();

        let mut conn = self
            .redis
            .get_multiplexed_async_connection()
            .await
            .map_err(redis_failure(&ip))?;

        // INCR + EXPIRE 固定窗口计数
        let count: i64 = conn.incr(&key, 1).await.map_err(redis_failure(&ip))?;
        if count == 1 {
            let _: () = conn
                .expire(&key, window as i64)
                .await
                .map_err(redis_failure(&ip))?;
        }

        if count > self.config.rate_limit_requests as i64 {
            tracing::warn!("Rate limit exceeded for {} ({} requests)", ip, count);
            return Ok((
                StatusCode::OK,
                error_to_api_response::<()>(
                    error_codes::RATE_LIMIT,
                    format!("请求过于频繁，请在{}秒后重试", window),
                ),
            )
                .into_response());
        }

        Ok(next.run(req).await)
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    limiter.check_rate_limit(req, next).await
}
