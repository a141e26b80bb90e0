pub mod catch;
pub mod common;
