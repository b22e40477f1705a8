pub mod auth;
pub mod role;

pub use auth::AuthGuard;
pub use role::{AdminGuard, CleanerGuard, CustomerGuard};
