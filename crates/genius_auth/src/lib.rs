pub mod auth;
pub mod permission;
pub mod schema;
