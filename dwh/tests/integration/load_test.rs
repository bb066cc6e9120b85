use chrono::NaiveDate;
use dwh::error::ErrorKind;
use dwh::test_utils::staging::{StagingEvent, StagingSong};
use dwh_config::shared::{CommitMode, InsertOrder};
use dwh_telemetry::tracing::init_test_tracing;

use crate::common::{count, postgres_catalog, provision, run_inserts, seed, spawn_warehouse};

fn umbrella() -> StagingSong {
    StagingSong::new("SID1", "Umbrella", "AID1", "Rihanna", 240.0)
}

#[tokio::test(flavor = "multi_thread")]
async fn matching_play_yields_one_songplay() {
    init_test_tracing();
    let database = spawn_warehouse().await;
    let catalog = postgres_catalog(InsertOrder::Declared);
    provision(&database, &catalog).await;
    seed(
        &database,
        &[StagingEvent::next_song("Rihanna", "Umbrella", 240.0, 7)],
        &[umbrella()],
    )
    .await;

    run_inserts(&database, &catalog, CommitMode::SingleTransaction)
        .await
        .unwrap();

    let rows = database
        .client()
        .query("select song_id, artist_id, user_id from songplays", &[])
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get::<_, String>(0), "SID1");
    assert_eq!(rows[0].get::<_, String>(1), "AID1");
    assert_eq!(rows[0].get::<_, i32>(2), 7);
}

#[tokio::test(flavor = "multi_thread")]
async fn non_next_song_events_are_ignored() {
    init_test_tracing();
    let database = spawn_warehouse().await;
    let catalog = postgres_catalog(InsertOrder::Declared);
    provision(&database, &catalog).await;
    seed(
        &database,
        &[StagingEvent::next_song("Rihanna", "Umbrella", 240.0, 7).with_page("Home")],
        &[umbrella()],
    )
    .await;

    run_inserts(&database, &catalog, CommitMode::SingleTransaction)
        .await
        .unwrap();

    assert_eq!(count(&database, "select count(*) from songplays").await, 0);
    assert_eq!(count(&database, "select count(*) from users").await, 0);
    assert_eq!(count(&database, r#"select count(*) from "time""#).await, 0);
    // Songs and artists come from the song dataset alone.
    assert_eq!(count(&database, "select count(*) from songs").await, 1);
    assert_eq!(count(&database, "select count(*) from artists").await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn duration_mismatch_yields_no_songplay() {
    init_test_tracing();
    let database = spawn_warehouse().await;
    let catalog = postgres_catalog(InsertOrder::Declared);
    provision(&database, &catalog).await;
    seed(
        &database,
        &[StagingEvent::next_song("Rihanna", "Umbrella", 241.5, 7)],
        &[umbrella()],
    )
    .await;

    run_inserts(&database, &catalog, CommitMode::SingleTransaction)
        .await
        .unwrap();

    assert_eq!(count(&database, "select count(*) from songplays").await, 0);
    assert_eq!(count(&database, "select count(*) from users").await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn dimensions_have_no_duplicate_keys() {
    init_test_tracing();
    let database = spawn_warehouse().await;
    let catalog = postgres_catalog(InsertOrder::Dependency);
    provision(&database, &catalog).await;
    seed(
        &database,
        &[
            StagingEvent::next_song("Rihanna", "Umbrella", 240.0, 7),
            StagingEvent::next_song("Rihanna", "Umbrella", 240.0, 7),
            StagingEvent::next_song("Rihanna", "Umbrella", 240.0, 7)
                .with_timestamp(1_541_106_106_796)
                .with_level("paid"),
        ],
        &[umbrella(), umbrella()],
    )
    .await;

    run_inserts(&database, &catalog, CommitMode::PerStatement)
        .await
        .unwrap();

    for (table, key) in [
        ("users", "user_id"),
        ("songs", "song_id"),
        ("artists", "artist_id"),
        (r#""time""#, "start_time"),
    ] {
        let rows = count(&database, &format!("select count(*) from {table}")).await;
        let keys = count(&database, &format!("select count(distinct {key}) from {table}")).await;
        assert_eq!(rows, keys, "{table}");
    }

    assert_eq!(count(&database, "select count(*) from users").await, 1);
    assert_eq!(count(&database, r#"select count(*) from "time""#).await, 2);
    // Two identical staging songs match every play twice.
    assert_eq!(count(&database, "select count(*) from songplays").await, 6);

    let level: String = database
        .client()
        .query_one("select level from users where user_id = 7", &[])
        .await
        .unwrap()
        .get(0);
    assert_eq!(level, "paid");
}

#[tokio::test(flavor = "multi_thread")]
async fn songplays_reference_existing_songs_and_artists() {
    init_test_tracing();
    let database = spawn_warehouse().await;
    let catalog = postgres_catalog(InsertOrder::Declared);
    provision(&database, &catalog).await;
    seed(
        &database,
        &[
            StagingEvent::next_song("Rihanna", "Umbrella", 240.0, 7),
            StagingEvent::next_song("Adele", "Hello", 295.5, 8),
            StagingEvent::next_song("Unknown", "Nothing", 100.0, 9),
        ],
        &[
            umbrella(),
            StagingSong::new("SID2", "Hello", "AID2", "Adele", 295.5),
        ],
    )
    .await;

    run_inserts(&database, &catalog, CommitMode::SingleTransaction)
        .await
        .unwrap();

    assert_eq!(count(&database, "select count(*) from songplays").await, 2);
    assert_eq!(
        count(
            &database,
            "select count(*) from songplays sp \
             left join songs s on s.song_id = sp.song_id \
             left join artists a on a.artist_id = sp.artist_id \
             where s.song_id is null or a.artist_id is null"
        )
        .await,
        0
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn time_dimension_breaks_down_start_time() {
    init_test_tracing();
    let database = spawn_warehouse().await;
    let catalog = postgres_catalog(InsertOrder::Declared);
    provision(&database, &catalog).await;
    seed(
        &database,
        &[StagingEvent::next_song("Rihanna", "Umbrella", 240.0, 7)],
        &[umbrella()],
    )
    .await;

    run_inserts(&database, &catalog, CommitMode::SingleTransaction)
        .await
        .unwrap();

    let row = database
        .client()
        .query_one(
            r#"select start_time, hour, day, week_of_year, month, year, weekday from "time""#,
            &[],
        )
        .await
        .unwrap();

    let expected = NaiveDate::from_ymd_opt(2018, 11, 1)
        .and_then(|date| date.and_hms_opt(20, 57, 10))
        .unwrap();
    assert_eq!(row.get::<_, chrono::NaiveDateTime>(0), expected);
    assert_eq!(row.get::<_, i32>(1), 20);
    assert_eq!(row.get::<_, i32>(2), 1);
    assert_eq!(row.get::<_, i32>(3), 44);
    assert_eq!(row.get::<_, i32>(4), 11);
    assert_eq!(row.get::<_, i32>(5), 2018);
    assert!(row.get::<_, bool>(6));

    let songplay_start: chrono::NaiveDateTime = database
        .client()
        .query_one("select start_time from songplays", &[])
        .await
        .unwrap()
        .get(0);
    assert_eq!(songplay_start, expected);
}

#[tokio::test(flavor = "multi_thread")]
async fn declared_order_with_per_statement_commits_violates_foreign_keys() {
    init_test_tracing();
    let database = spawn_warehouse().await;
    let catalog = postgres_catalog(InsertOrder::Declared);
    provision(&database, &catalog).await;
    seed(
        &database,
        &[StagingEvent::next_song("Rihanna", "Umbrella", 240.0, 7)],
        &[umbrella()],
    )
    .await;

    let err = run_inserts(&database, &catalog, CommitMode::PerStatement)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
    assert_eq!(count(&database, "select count(*) from songplays").await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn user_level_ignores_events_without_timestamp() {
    init_test_tracing();
    let database = spawn_warehouse().await;
    let catalog = postgres_catalog(InsertOrder::Dependency);
    provision(&database, &catalog).await;
    seed(
        &database,
        &[
            StagingEvent::next_song("Rihanna", "Umbrella", 240.0, 7).with_level("paid"),
            StagingEvent::next_song("Rihanna", "Umbrella", 240.0, 7)
                .with_level("free")
                .without_timestamp(),
        ],
        &[umbrella()],
    )
    .await;

    run_inserts(&database, &catalog, CommitMode::PerStatement)
        .await
        .unwrap();

    let level: String = database
        .client()
        .query_one("select level from users where user_id = 7", &[])
        .await
        .unwrap()
        .get(0);
    assert_eq!(level, "paid");
}

#[tokio::test(flavor = "multi_thread")]
async fn plays_without_timestamp_are_skipped() {
    init_test_tracing();
    let database = spawn_warehouse().await;
    let catalog = postgres_catalog(InsertOrder::Dependency);
    provision(&database, &catalog).await;
    seed(
        &database,
        &[StagingEvent::next_song("Rihanna", "Umbrella", 240.0, 7).without_timestamp()],
        &[umbrella()],
    )
    .await;

    run_inserts(&database, &catalog, CommitMode::PerStatement)
        .await
        .unwrap();

    assert_eq!(count(&database, "select count(*) from songplays").await, 0);
    assert_eq!(count(&database, r#"select count(*) from "time""#).await, 0);
    assert_eq!(count(&database, "select count(*) from users").await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn songs_without_a_named_artist_are_skipped() {
    init_test_tracing();
    let database = spawn_warehouse().await;
    let catalog = postgres_catalog(InsertOrder::Dependency);
    provision(&database, &catalog).await;

    let mut anonymous = StagingSong::new("SID3", "Untitled", "AID3", "", 180.0);
    anonymous.artist_name = None;
    seed(
        &database,
        &[StagingEvent::next_song("Rihanna", "Umbrella", 240.0, 7)],
        &[umbrella(), anonymous],
    )
    .await;

    run_inserts(&database, &catalog, CommitMode::PerStatement)
        .await
        .unwrap();

    assert_eq!(count(&database, "select count(*) from artists").await, 1);
    assert_eq!(count(&database, "select count(*) from songs").await, 1);
    assert_eq!(
        count(
            &database,
            "select count(*) from songs s \
             left join artists a on a.artist_id = s.artist_id \
             where a.artist_id is null"
        )
        .await,
        0
    );
    assert_eq!(count(&database, "select count(*) from songplays").await, 1);
}
