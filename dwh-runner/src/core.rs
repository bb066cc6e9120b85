use std::fmt;

use dwh::runner::{RunSummary, run_load, run_provisioning};
use dwh_config::Environment;
use dwh_config::shared::DwhConfig;
use dwh_telemetry::tracing::init_tracing;
use tracing::{error, info};

use crate::config::load_dwh_config;
use crate::error::{RunnerError, RunnerResult};

/// The two jobs the binaries run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    /// Drop and recreate every table.
    CreateTables,
    /// Copy the raw datasets and populate the star schema.
    Etl,
}

impl Job {
    pub fn app_name(&self) -> &'static str {
        match self {
            Job::CreateTables => "create-tables",
            Job::Etl => "etl",
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.app_name())
    }
}

/// Loads configuration, installs tracing and runs `job` to completion on a current thread runtime.
pub fn run(job: Job) -> RunnerResult<RunSummary> {
    let config = load_dwh_config()?;

    let environment = Environment::load().map_err(RunnerError::config)?;
    let _log_flusher = init_tracing(job.app_name(), environment).map_err(RunnerError::config)?;

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async_run(job, &config));

    if let Err(err) = &result {
        error!(job = %job, error = %err, "job failed");
    }

    result
}

async fn async_run(job: Job, config: &DwhConfig) -> RunnerResult<RunSummary> {
    info!(
        job = %job,
        host = %config.cluster.host,
        db_name = %config.cluster.db_name,
        "starting job"
    );

    let summary = match job {
        Job::CreateTables => run_provisioning(config).await?,
        Job::Etl => run_load(config).await?,
    };

    Ok(summary)
}
