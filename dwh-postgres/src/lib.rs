//! Postgres protocol helpers shared by the warehouse crates.

pub mod schema;
pub mod tls;
pub mod tokio;
