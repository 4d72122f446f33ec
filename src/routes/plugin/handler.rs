use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    plugins::PluginDescriptor,
    utils::{error_codes, error_to_api_response, success_to_api_response},
};

/// 列出已注册的插件
#[axum::debug_handler]
pub async fn list_plugins(State(state): State<AppState>) -> impl IntoResponse {
    let plugins: Vec<PluginDescriptor> = state.plugins.iter().cloned().collect();
    (StatusCode::OK, success_to_api_response(plugins))
}

#[axum::debug_handler]
pub async fn get_plugin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.plugins.get(&id) {
        Some(plugin) => (StatusCode::OK, success_to_api_response(plugin.clone())),
        None => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, format!("插件 {} 不存在", id)),
        ),
    }
}
