//! Logging setup for the warehouse job binaries and tests.

pub mod tracing;
