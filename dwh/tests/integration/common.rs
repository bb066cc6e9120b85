use dwh::catalog::{CatalogConfig, StatementCatalog};
use dwh::client::PgWarehouseClient;
use dwh::error::DwhResult;
use dwh::runner::{RunSummary, Session, insert_tables, provision_with};
use dwh::test_utils::staging::{StagingEvent, StagingSong};
use dwh_config::shared::{CommitMode, DWH_LOAD_OPTIONS, DWH_PROVISIONING_OPTIONS, InsertOrder, SqlDialect};
use dwh_postgres::tokio::test_utils::{PgDatabase, local_cluster_config};

/// Creates a fresh database on the local test server.
pub async fn spawn_warehouse() -> PgDatabase {
    PgDatabase::new(local_cluster_config()).await
}

pub fn postgres_catalog(insert_order: InsertOrder) -> StatementCatalog {
    StatementCatalog::build(&CatalogConfig {
        iam_role_arn: "arn:aws:iam::123456789012:role/dwhRole".to_string(),
        log_data: "s3://udacity-dend/log_data".to_string(),
        log_jsonpath: "s3://udacity-dend/log_json_path.json".to_string(),
        song_data: "s3://udacity-dend/song_data".to_string(),
        region: "us-west-2".to_string(),
        dialect: SqlDialect::Postgres,
        insert_order,
    })
    .unwrap()
}

pub async fn provision(database: &PgDatabase, catalog: &StatementCatalog) -> RunSummary {
    provision_with(
        || PgWarehouseClient::connect(&database.config, &DWH_PROVISIONING_OPTIONS),
        catalog,
        CommitMode::PerStatement,
    )
    .await
    .unwrap()
}

/// Writes rows straight into the staging tables, standing in for `COPY`.
pub async fn seed(database: &PgDatabase, events: &[StagingEvent], songs: &[StagingSong]) {
    for event in events {
        database
            .client()
            .batch_execute(&event.insert_sql())
            .await
            .unwrap();
    }
    for song in songs {
        database
            .client()
            .batch_execute(&song.insert_sql())
            .await
            .unwrap();
    }
}

/// Runs only the insert phase of a load.
pub async fn run_inserts(
    database: &PgDatabase,
    catalog: &StatementCatalog,
    commit_mode: CommitMode,
) -> DwhResult<RunSummary> {
    let mut session = Session::new(commit_mode);
    session
        .connect(|| PgWarehouseClient::connect(&database.config, &DWH_LOAD_OPTIONS))
        .await?;

    let result = insert_tables(&mut session, catalog).await;
    session.finish(result).await
}

pub async fn count(database: &PgDatabase, query: &str) -> i64 {
    database
        .client()
        .query_one(query, &[])
        .await
        .unwrap()
        .get(0)
}
