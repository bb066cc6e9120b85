use dwh_config::load_config;
use dwh_config::shared::DwhConfig;

use crate::error::{RunnerError, RunnerResult};

/// Loads and validates the warehouse configuration.
///
/// Validation runs before any connection is attempted, so a malformed ARN or S3 URI fails fast.
pub fn load_dwh_config() -> RunnerResult<DwhConfig> {
    let config = load_config::<DwhConfig>().map_err(RunnerError::config)?;
    config.validate().map_err(RunnerError::config)?;

    Ok(config)
}
