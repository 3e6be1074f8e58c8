pub mod arguments;
pub mod schema;
