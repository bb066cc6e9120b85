use serde::Deserialize;

use crate::Config;
use crate::shared::{ClusterConfig, IamRoleConfig, RunConfig, S3Config, ValidationError};

/// Complete configuration shared by the `create-tables` and `etl` binaries.
///
/// This intentionally does not implement `Serialize` to avoid leaking the cluster password.
#[derive(Debug, Clone, Deserialize)]
pub struct DwhConfig {
    pub cluster: ClusterConfig,
    pub iam_role: IamRoleConfig,
    pub s3: S3Config,
    #[serde(default)]
    pub run: RunConfig,
}

impl DwhConfig {
    /// Validates every section, stopping at the first invalid one.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.cluster.validate()?;
        self.iam_role.validate()?;
        self.s3.validate()
    }
}

impl Config for DwhConfig {
    const DEFAULT_FILE_NAME: &'static str = "dwh.cfg";
}
