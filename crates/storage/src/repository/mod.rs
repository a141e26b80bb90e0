pub mod catch;
