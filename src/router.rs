use axum::{
    Router,
    routing::{get, post, put},
};

use crate::{
    AppState,
    middleware::{auth_middleware, log_errors},
    routes,
};

// 公开路由
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(routes::system::ping))
        .route("/login", post(routes::user::login))
        .route("/logout", post(routes::user::logout))
        .route("/resources/{*name}", get(routes::system::resource))
}

// 需要认证的路由
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/user/me", get(routes::user::me))
        .route("/user/password", put(routes::user::update_password))
        .route(
            "/user/renew-stay-logged-in-key",
            post(routes::user::renew_stay_logged_in_key),
        )
        .route("/plugins", get(routes::plugin::list_plugins))
        .route("/plugins/{id}", get(routes::plugin::get_plugin))
        .layer(axum::middleware::from_fn_with_state(state, auth_middleware))
}

/// 创建主路由（限流和 CORS 由调用方按部署环境追加）
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()));

    // axum 不允许在根路径 nest
    let base = state.config.api_base_uri.trim_end_matches('/').to_string();
    let router = if base.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(&base, api)
    };

    router
        .layer(axum::middleware::from_fn(log_errors))
        .with_state(state)
}
