use std::future::Future;

use dwh_config::shared::{CommitMode, DWH_LOAD_OPTIONS, DwhConfig};
use tracing::{info, warn};

use crate::catalog::{CatalogConfig, StatementCatalog};
use crate::client::{PgWarehouseClient, WarehouseClient};
use crate::error::DwhResult;
use crate::runner::session::{RunSummary, Session};

/// Copies both raw datasets from object storage into the staging tables.
pub async fn load_staging_tables<C>(
    session: &mut Session<C>,
    catalog: &StatementCatalog,
) -> DwhResult<()>
where
    C: WarehouseClient,
{
    info!(count = catalog.copy_statements().len(), "loading staging tables");
    session.execute_all(catalog.copy_statements()).await
}

/// Populates the fact and dimension tables from the staging tables.
///
/// Every insert-order hazard in the catalog is logged before the first insert runs.
pub async fn insert_tables<C>(
    session: &mut Session<C>,
    catalog: &StatementCatalog,
) -> DwhResult<()>
where
    C: WarehouseClient,
{
    for hazard in catalog.insert_order_hazards() {
        warn!(
            table = %hazard.table,
            referenced = %hazard.referenced,
            "insert order hazard: {hazard}"
        );
    }

    info!(count = catalog.insert_statements().len(), "inserting into analytics tables");
    session.execute_all(catalog.insert_statements()).await
}

/// Connects with `connect`, loads the staging tables, runs the inserts and closes the connection.
pub async fn load_with<C, F, Fut>(
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
        load_staging_tables(&mut session, catalog).await?;
        insert_tables(&mut session, catalog).await
    }
    .await;

    session.finish(result).await
}

/// Loads the raw datasets and populates the star schema on the warehouse in `config`.
pub async fn run_load(config: &DwhConfig) -> DwhResult<RunSummary> {
    let catalog = StatementCatalog::build(&CatalogConfig::from(config))?;

    info!(
        insert_order = %config.run.insert_order,
        commit_mode = %config.run.commit_mode,
        "starting load"
    );

    let summary = load_with(
        || PgWarehouseClient::connect(&config.cluster, &DWH_LOAD_OPTIONS),
        &catalog,
        config.run.commit_mode,
    )
    .await?;

    info!(
        statements_executed = summary.statements_executed,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "load completed"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use dwh_config::shared::{InsertOrder, SqlDialect};

    use super::*;
    use crate::error::ErrorKind;
    use crate::test_utils::memory::MemoryWarehouseClient;

    fn catalog(insert_order: InsertOrder) -> StatementCatalog {
        StatementCatalog::build(&CatalogConfig {
            iam_role_arn: "arn:aws:iam::123456789012:role/dwhRole".to_string(),
            log_data: "s3://udacity-dend/log_data".to_string(),
            log_jsonpath: "s3://udacity-dend/log_json_path.json".to_string(),
            song_data: "s3://udacity-dend/song_data".to_string(),
            region: "us-west-2".to_string(),
            dialect: SqlDialect::Redshift,
            insert_order,
        })
        .unwrap()
    }

    fn targets(executed: &[String]) -> Vec<&str> {
        executed
            .iter()
            .filter_map(|sql| {
                sql.strip_prefix("COPY ")
                    .or_else(|| sql.strip_prefix("INSERT INTO "))
            })
            .filter_map(|rest| rest.split_whitespace().next())
            .collect()
    }

    #[tokio::test]
    async fn copies_then_inserts_in_declared_order() {
        dwh_telemetry::tracing::init_test_tracing();

        let client = MemoryWarehouseClient::new();
        let catalog = catalog(InsertOrder::Declared);

        let connected = client.clone();
        let summary = load_with(
            || async move { Ok(connected) },
            &catalog,
            CommitMode::PerStatement,
        )
        .await
        .unwrap();

        assert_eq!(summary.statements_executed, 7);
        let executed = client.executed_statements().await;
        assert_eq!(
            targets(&executed),
            vec![
                "staging_events",
                "staging_songs",
                "songplays",
                "users",
                "songs",
                "artists",
                "\"time\""
            ]
        );
    }

    #[tokio::test]
    async fn dependency_order_inserts_dimensions_first() {
        let client = MemoryWarehouseClient::new();
        let catalog = catalog(InsertOrder::Dependency);

        let connected = client.clone();
        load_with(
            || async move { Ok(connected) },
            &catalog,
            CommitMode::SingleTransaction,
        )
        .await
        .unwrap();

        let executed = client.executed().await;
        assert_eq!(executed.first().map(String::as_str), Some("BEGIN"));
        assert_eq!(executed.last().map(String::as_str), Some("COMMIT"));
        assert_eq!(
            targets(&executed),
            vec![
                "staging_events",
                "staging_songs",
                "artists",
                "users",
                "songs",
                "\"time\"",
                "songplays"
            ]
        );
    }

    #[tokio::test]
    async fn failed_copy_skips_the_inserts() {
        let client =
            MemoryWarehouseClient::new().fail_when_contains("COPY staging_songs", ErrorKind::WarehouseError);
        let catalog = catalog(InsertOrder::Declared);

        let connected = client.clone();
        let err = load_with(
            || async move { Ok(connected) },
            &catalog,
            CommitMode::PerStatement,
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::WarehouseError);
        let executed = client.executed_statements().await;
        assert_eq!(targets(&executed), vec!["staging_events", "staging_songs"]);
        assert!(client.is_closed().await);
    }

    #[tokio::test]
    async fn failed_connect_executes_nothing() {
        let catalog = catalog(InsertOrder::Declared);

        let err = load_with(
            || async {
                Err::<MemoryWarehouseClient, _>(crate::dwh_error!(
                    ErrorKind::WarehouseConnectionFailed,
                    "Warehouse connection failed"
                ))
            },
            &catalog,
            CommitMode::PerStatement,
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::WarehouseConnectionFailed);
    }
}
