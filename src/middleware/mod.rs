pub mod auth;
pub mod rate_limit;
pub mod restrict;

pub use auth::CurrentUser;
