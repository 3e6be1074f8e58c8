pub mod middleware;
pub mod route;
