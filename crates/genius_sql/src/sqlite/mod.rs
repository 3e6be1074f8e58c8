pub mod client;
pub mod helper;
