pub mod memory;
pub mod staging;
