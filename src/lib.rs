use std::sync::Arc;

use auth::{LoginPolicy, StayLoggedInAuthenticator};
use cache::UserGroupCache;
use config::Config;
use database::UserStore;
use plugins::PluginRegistry;
use resources::ResourceService;

pub mod auth;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod plugins;
pub mod resources;
pub mod router;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserStore>,
    pub policy: Arc<dyn LoginPolicy>,
    pub groups: Arc<UserGroupCache>,
    pub authenticator: StayLoggedInAuthenticator,
    pub plugins: Arc<PluginRegistry>,
    pub resources: Arc<ResourceService>,
}

impl AppState {
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        policy: Arc<dyn LoginPolicy>,
        groups: Arc<UserGroupCache>,
        plugins: Arc<PluginRegistry>,
        resources: Arc<ResourceService>,
    ) -> Self {
        let authenticator = StayLoggedInAuthenticator::new(
            Arc::clone(&users),
            Arc::clone(&policy),
            Arc::clone(&groups),
            config.force_secure_cookies,
        );
        Self {
            config,
            users,
            policy,
            groups,
            authenticator,
            plugins,
            resources,
        }
    }
}
