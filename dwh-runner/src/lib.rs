//! Shared startup for the `create-tables` and `etl` binaries.

pub mod config;
pub mod core;
pub mod error;
