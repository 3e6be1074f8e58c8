pub mod glob;
pub mod utils;
