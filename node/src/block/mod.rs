pub mod builder;
pub mod signing;
pub mod types;
