pub mod auth;
pub mod error;
pub mod health;
pub mod member;
pub mod payment;
pub mod permission;
pub mod role;
pub mod router;
pub mod setup;
pub mod state;
pub mod user;
