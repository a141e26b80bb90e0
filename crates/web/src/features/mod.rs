pub mod catches;
