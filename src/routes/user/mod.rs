mod handler;
mod model;

pub use handler::{login, logout, me, renew_stay_logged_in_key, update_password};
pub use model::{LoginRequest, RenewKeyRequest, UpdatePasswordRequest};
