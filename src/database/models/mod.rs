pub mod user;

pub use user::{GroupMembership, UserRecord};
