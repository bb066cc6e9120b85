use dwh::catalog::tables::star_schema;
use dwh::test_utils::staging::{StagingEvent, StagingSong};
use dwh_config::shared::InsertOrder;
use dwh_telemetry::tracing::init_test_tracing;

use crate::common::{count, postgres_catalog, provision, seed, spawn_warehouse};

#[tokio::test(flavor = "multi_thread")]
async fn provisioning_creates_every_table_with_declared_columns() {
    init_test_tracing();
    let database = spawn_warehouse().await;
    let catalog = postgres_catalog(InsertOrder::Declared);

    let summary = provision(&database, &catalog).await;
    assert_eq!(summary.statements_executed, 14);

    for table in star_schema() {
        let rows = database
            .client()
            .query(
                "select column_name::text from information_schema.columns \
                 where table_schema = 'public' and table_name::text = $1 \
                 order by ordinal_position",
                &[&table.name.as_str()],
            )
            .await
            .unwrap();
        let columns: Vec<String> = rows.iter().map(|row| row.get(0)).collect();
        let expected: Vec<String> = table.column_names().map(str::to_string).collect();

        assert_eq!(columns, expected, "columns of {}", table.name);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn provisioning_twice_clears_previous_data() {
    init_test_tracing();
    let database = spawn_warehouse().await;
    let catalog = postgres_catalog(InsertOrder::Declared);

    provision(&database, &catalog).await;
    seed(
        &database,
        &[StagingEvent::next_song("Rihanna", "Umbrella", 240.0, 7)],
        &[StagingSong::new("SID1", "Umbrella", "AID1", "Rihanna", 240.0)],
    )
    .await;
    assert_eq!(count(&database, "select count(*) from staging_events").await, 1);

    provision(&database, &catalog).await;

    assert_eq!(count(&database, "select count(*) from staging_events").await, 0);
    assert_eq!(count(&database, "select count(*) from staging_songs").await, 0);
    assert_eq!(
        count(
            &database,
            "select count(*) from information_schema.tables where table_schema = 'public'"
        )
        .await,
        7
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn songplay_ids_start_at_zero() {
    init_test_tracing();
    let database = spawn_warehouse().await;
    let catalog = postgres_catalog(InsertOrder::Declared);
    provision(&database, &catalog).await;

    database
        .client()
        .batch_execute(
            "begin; \
             insert into artists (artist_id, name) values ('AID1', 'Rihanna'); \
             insert into users (user_id) values (7); \
             insert into songs (song_id, title, artist_id) values ('SID1', 'Umbrella', 'AID1'); \
             insert into songplays (start_time, user_id, song_id, artist_id) \
                 values (now(), 7, 'SID1', 'AID1'); \
             commit;",
        )
        .await
        .unwrap();

    let id: i32 = database
        .client()
        .query_one("select songplay_id from songplays", &[])
        .await
        .unwrap()
        .get(0);
    assert_eq!(id, 0);
}
