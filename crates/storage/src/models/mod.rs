mod catch;

pub use catch::Catch;
