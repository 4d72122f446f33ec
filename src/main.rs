use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use pf_auth::{
    AppState,
    auth::DefaultLoginPolicy,
    cache::{CachedUserStore, ResourceLogCache, UserGroupCache},
    config::Config,
    database::{GroupRepository, PgUserStore},
    middleware::{RateLimiter, rate_limit},
    plugins::PluginRegistry,
    resources::ResourceService,
    router::create_router,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
#[cfg(debug_assertions)]
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    if config.force_secure_cookies {
        tracing::info!("Secure cookies enforced by configuration");
    }

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'projectforge_auth';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    // 设置 Redis 客户端
    let redis_client =
        redis::Client::open(config.redis_url.clone()).expect("Failed to create Redis client");
    let redis_arc = Arc::new(redis_client.clone());

    // 用户存储：Postgres + Redis 读穿缓存
    let users = Arc::new(CachedUserStore::with_redis(
        PgUserStore::new(pool.clone()),
        redis_arc,
        config.user_cache_ttl(),
    ));

    // 用户组缓存
    let memberships = GroupRepository::load_memberships(&pool)
        .await
        .expect("Failed to load group memberships");
    let groups = Arc::new(UserGroupCache::from_memberships(memberships));

    // 插件注册表，启动时构建一次
    let plugins = Arc::new(PluginRegistry::builtin().expect("Invalid plugin registry"));

    // 资源目录
    let resources = Arc::new(
        ResourceService::from_config(&config, Arc::new(ResourceLogCache::new()))
            .expect("Failed to prepare resource directories"),
    );

    // 设置应用状态
    let state = AppState::new(
        config.clone(),
        users,
        Arc::new(DefaultLoginPolicy),
        groups,
        plugins,
        resources,
    );

    // 设置限流器
    let rate_limiter = Arc::new(RateLimiter::new(redis_client, config.clone()));

    let router = create_router(state.clone()).layer(axum::middleware::from_fn_with_state(
        rate_limiter,
        rate_limit,
    ));

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(CorsLayer::permissive())
    };

    // 启动服务器
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
