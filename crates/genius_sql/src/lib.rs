pub mod base;
pub mod enums;
pub mod postgres;
pub mod schemas;
pub mod seed;
pub mod sqlite;
