//! The provisioning and load runners.
//!
//! Both runners open one [`Session`], execute their statement lists strictly in order and close
//! the session. The first failure aborts the run.

mod load;
mod provision;
mod session;

pub use load::{insert_tables, load_staging_tables, load_with, run_load};
pub use provision::{create_tables, drop_tables, provision_with, run_provisioning};
pub use session::{RunSummary, Session, SessionState};
