mod handler;

pub use handler::{get_plugin, list_plugins};
