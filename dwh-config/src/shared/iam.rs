use serde::Deserialize;

use crate::shared::ValidationError;

/// The `[IAM_ROLE]` section: the role the warehouse assumes to read from object storage.
#[derive(Debug, Clone, Deserialize)]
pub struct IamRoleConfig {
    pub arn: String,
}

impl IamRoleConfig {
    /// Checks that [`IamRoleConfig::arn`] looks like `arn:<partition>:iam::<account>:role/<name>`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut parts = self.arn.splitn(6, ':');
        let is_role_arn = parts.next() == Some("arn")
            && parts.next().is_some_and(|partition| !partition.is_empty())
            && parts.next() == Some("iam")
            && parts.next() == Some("")
            && parts.next().is_some_and(|account| !account.is_empty())
            && parts
                .next()
                .and_then(|resource| resource.strip_prefix("role/"))
                .is_some_and(|name| !name.is_empty());

        if !is_role_arn {
            return Err(ValidationError::InvalidIamRoleArn(self.arn.clone()));
        }

        Ok(())
    }
}
