pub mod auth;
pub mod member;
pub mod payment;
pub mod rbac;
pub mod response;
pub mod user;

pub use response::{ApiResponse, PageResponse, Pagination};
