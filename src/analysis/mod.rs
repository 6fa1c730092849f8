pub mod aliasing;
pub mod kaiser;
pub mod spectrum;
