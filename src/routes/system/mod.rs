mod handler;

pub use handler::{ping, resource};
