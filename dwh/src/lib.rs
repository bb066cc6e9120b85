//! Provisioning and loading of a star schema warehouse.
//!
//! The [`catalog`] renders the ordered statement lists, the [`runner`] executes them over a
//! [`client::WarehouseClient`].

pub mod catalog;
pub mod client;
pub mod error;
mod macros;
pub mod runner;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
