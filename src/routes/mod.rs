pub mod plugin;
pub mod system;
pub mod user;
