//! Configuration sections shared by the provisioning and load binaries.

mod base;
mod cluster;
mod iam;
mod run;
mod s3;
mod warehouse;

pub use base::ValidationError;
pub use cluster::{
    ClusterConfig, DWH_LOAD_OPTIONS, DWH_PROVISIONING_OPTIONS, IntoConnectOptions,
    PgConnectionOptions,
};
pub use iam::IamRoleConfig;
pub use run::{CommitMode, InsertOrder, RunConfig, SqlDialect};
pub use s3::{DEFAULT_LOG_JSONPATH, DEFAULT_REGION, S3Config};
pub use warehouse::DwhConfig;
