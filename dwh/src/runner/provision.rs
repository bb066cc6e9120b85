use std::future::Future;

use dwh_config::shared::{CommitMode, DWH_PROVISIONING_OPTIONS, DwhConfig};
use tracing::info;

use crate::catalog::{CatalogConfig, StatementCatalog};
use crate::client::{PgWarehouseClient, WarehouseClient};
use crate::error::DwhResult;
use crate::runner::session::{RunSummary, Session};

/// Drops every table, staging tables first.
pub async fn drop_tables<C>(session: &mut Session<C>, catalog: &StatementCatalog) -> DwhResult<()>
where
    C: WarehouseClient,
{
    info!(count = catalog.drop_statements().len(), "dropping tables");
    session.execute_all(catalog.drop_statements()).await
}

/// Creates every table, referenced tables first.
pub async fn create_tables<C>(
    session: &mut Session<C>,
    catalog: &StatementCatalog,
) -> DwhResult<()>
where
    C: WarehouseClient,
{
    info!(count = catalog.create_statements().len(), "creating tables");
    session.execute_all(catalog.create_statements()).await
}

/// Connects with `connect`, drops and recreates every table, and closes the connection.
pub async fn provision_with<C, F, Fut>(
    connect: F,
    catalog: &StatementCatalog,
    commit_mode: CommitMode,
) -> DwhResult<RunSummary>
where
    C: WarehouseClient,
    F: FnOnce() -> Fut,
    Fut: Future<Output = DwhResult<C>>,
{
    let mut session = Session::new(commit_mode);
    session.connect(connect).await?;

    let result = async {
        drop_tables(&mut session, catalog).await?;
        create_tables(&mut session, catalog).await
    }
    .await;

    session.finish(result).await
}

/// Drops and recreates the star schema on the warehouse in `config`.
pub async fn run_provisioning(config: &DwhConfig) -> DwhResult<RunSummary> {
    let catalog = StatementCatalog::build(&CatalogConfig::from(config))?;

    info!(
        dialect = %config.run.dialect,
        commit_mode = %config.run.commit_mode,
        "starting provisioning"
    );

    let summary = provision_with(
        || PgWarehouseClient::connect(&config.cluster, &DWH_PROVISIONING_OPTIONS),
        &catalog,
        config.run.commit_mode,
    )
    .await?;

    info!(
        statements_executed = summary.statements_executed,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "provisioning completed"
    );

    Ok(summary)
}
