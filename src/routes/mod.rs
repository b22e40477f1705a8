pub mod auth;
pub mod booking;
pub mod cleaner;
pub mod user;
