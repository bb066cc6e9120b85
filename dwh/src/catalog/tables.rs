//! Definitions of the star schema tables.

use crate::catalog::table::{ColumnDefinition, DataType, TableDefinition, TableRole};

pub const STAGING_EVENTS: &str = "staging_events";
pub const STAGING_SONGS: &str = "staging_songs";
pub const SONGPLAYS: &str = "songplays";
pub const USERS: &str = "users";
pub const SONGS: &str = "songs";
pub const ARTISTS: &str = "artists";
pub const TIME: &str = "time";

/// Returns every warehouse table in declaration order.
///
/// Declaration order breaks ties whenever the dependency graph allows more than one ordering.
pub fn star_schema() -> Vec<TableDefinition> {
    vec![
        staging_events(),
        staging_songs(),
        artists(),
        users(),
        songs(),
        time(),
        songplays(),
    ]
}

fn staging_events() -> TableDefinition {
    use DataType::*;

    TableDefinition::new(
        STAGING_EVENTS,
        TableRole::Staging,
        vec![
            ColumnDefinition::new("artist", Varchar(None)),
            ColumnDefinition::new("auth", Varchar(Some(20))),
            ColumnDefinition::new("first_name", Varchar(Some(30))),
            ColumnDefinition::new("gender", Varchar(Some(1))),
            ColumnDefinition::new("item_in_session", Int),
            ColumnDefinition::new("last_name", Varchar(Some(30))),
            ColumnDefinition::new("length", Float),
            ColumnDefinition::new("level", Varchar(Some(4))),
            ColumnDefinition::new("location", Varchar(None)),
            ColumnDefinition::new("method", Varchar(Some(3))),
            ColumnDefinition::new("page", Varchar(Some(20))),
            ColumnDefinition::new("registration", Decimal),
            ColumnDefinition::new("session_id", Int),
            ColumnDefinition::new("song", Varchar(None)),
            ColumnDefinition::new("status", SmallInt),
            // Epoch milliseconds.
            ColumnDefinition::new("timestamp", BigInt),
            ColumnDefinition::new("user_agent", Varchar(None)),
            ColumnDefinition::new("user_id", Int),
        ],
    )
}

fn staging_songs() -> TableDefinition {
    use DataType::*;

    TableDefinition::new(
        STAGING_SONGS,
        TableRole::Staging,
        vec![
            ColumnDefinition::new("num_songs", SmallInt),
            ColumnDefinition::new("artist_id", Varchar(Some(25))),
            ColumnDefinition::new("artist_longitude", Float),
            ColumnDefinition::new("artist_latitude", Float),
            ColumnDefinition::new("artist_location", Varchar(None)),
            ColumnDefinition::new("artist_name", Varchar(None)),
            ColumnDefinition::new("song_id", Varchar(Some(25))),
            ColumnDefinition::new("title", Varchar(None)),
            ColumnDefinition::new("duration", Float),
            ColumnDefinition::new("year", SmallInt),
        ],
    )
}

fn artists() -> TableDefinition {
    use DataType::*;

    TableDefinition::new(
        ARTISTS,
        TableRole::Dimension,
        vec![
            ColumnDefinition::new("artist_id", Varchar(Some(25)))
                .primary_key()
                .dist_key(),
            ColumnDefinition::new("name", Varchar(None)).not_null(),
            ColumnDefinition::new("location", Varchar(None)),
            ColumnDefinition::new("latitude", Float),
            ColumnDefinition::new("longitude", Float),
        ],
    )
}

fn users() -> TableDefinition {
    use DataType::*;

    TableDefinition::new(
        USERS,
        TableRole::Dimension,
        vec![
            ColumnDefinition::new("user_id", Int).primary_key().dist_key(),
            ColumnDefinition::new("first_name", Varchar(Some(30))),
            ColumnDefinition::new("last_name", Varchar(Some(30))).sort_key(),
            ColumnDefinition::new("gender", Varchar(Some(1))),
            ColumnDefinition::new("level", Varchar(Some(4))),
        ],
    )
}

fn songs() -> TableDefinition {
    use DataType::*;

    TableDefinition::new(
        SONGS,
        TableRole::Dimension,
        vec![
            ColumnDefinition::new("song_id", Varchar(Some(25))).primary_key(),
            ColumnDefinition::new("title", Varchar(None)).not_null(),
            ColumnDefinition::new("artist_id", Varchar(Some(25)))
                .not_null()
                .dist_key()
                .references(ARTISTS),
            ColumnDefinition::new("year", SmallInt),
            ColumnDefinition::new("duration", Float),
        ],
    )
}

fn time() -> TableDefinition {
    use DataType::*;

    TableDefinition::new(
        TIME,
        TableRole::Dimension,
        vec![
            ColumnDefinition::new("start_time", Timestamp).primary_key(),
            ColumnDefinition::new("hour", Int),
            ColumnDefinition::new("day", Int),
            ColumnDefinition::new("week_of_year", Int),
            ColumnDefinition::new("month", Int),
            ColumnDefinition::new("year", Int),
            ColumnDefinition::new("weekday", Boolean),
        ],
    )
}

fn songplays() -> TableDefinition {
    use DataType::*;

    TableDefinition::new(
        SONGPLAYS,
        TableRole::Fact,
        vec![
            ColumnDefinition::new("songplay_id", Int)
                .identity()
                .primary_key(),
            ColumnDefinition::new("start_time", Timestamp)
                .not_null()
                .sort_key(),
            ColumnDefinition::new("user_id", Int).not_null().references(USERS),
            ColumnDefinition::new("level", Varchar(Some(4))),
            ColumnDefinition::new("song_id", Varchar(Some(25)))
                .not_null()
                .references(SONGS),
            ColumnDefinition::new("artist_id", Varchar(Some(25)))
                .not_null()
                .references(ARTISTS),
            ColumnDefinition::new("session_id", Int),
            ColumnDefinition::new("location", Varchar(None)),
            ColumnDefinition::new("user_agent", Varchar(None)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use dwh_config::shared::SqlDialect;
    use insta::assert_snapshot;

    use super::*;

    fn table(name: &str) -> TableDefinition {
        star_schema()
            .into_iter()
            .find(|table| table.name.as_str() == name)
            .unwrap()
    }

    #[test]
    fn declares_seven_tables() {
        let names: Vec<String> = star_schema()
            .iter()
            .map(|table| table.name.to_string())
            .collect();

        assert_eq!(
            names,
            vec![
                STAGING_EVENTS,
                STAGING_SONGS,
                ARTISTS,
                USERS,
                SONGS,
                TIME,
                SONGPLAYS
            ]
        );
    }

    #[test]
    fn staging_songs_columns_are_exact() {
        let table = table(STAGING_SONGS);
        let columns: Vec<&str> = table.column_names().collect();
        assert_eq!(
            columns,
            vec![
                "num_songs",
                "artist_id",
                "artist_longitude",
                "artist_latitude",
                "artist_location",
                "artist_name",
                "song_id",
                "title",
                "duration",
                "year"
            ]
        );
    }

    #[test]
    fn staging_events_has_eighteen_columns() {
        let table = table(STAGING_EVENTS);

        assert_eq!(table.columns.len(), 18);
        assert!(table.columns.iter().all(|column| column.nullable));
        assert!(table.referenced_tables().is_empty());
    }

    #[test]
    fn songplays_redshift_ddl() {
        assert_snapshot!(table(SONGPLAYS).create_sql(SqlDialect::Redshift), @r"
        CREATE TABLE IF NOT EXISTS songplays (
            songplay_id INT IDENTITY(0,1) PRIMARY KEY,
            start_time TIMESTAMP SORTKEY NOT NULL,
            user_id INT NOT NULL REFERENCES users (user_id),
            level VARCHAR(4),
            song_id VARCHAR(25) NOT NULL REFERENCES songs (song_id),
            artist_id VARCHAR(25) NOT NULL REFERENCES artists (artist_id),
            session_id INT,
            location VARCHAR,
            user_agent VARCHAR
        )
        ");
    }

    #[test]
    fn dimension_keys_carry_distribution_and_sort_keys() {
        let users = table(USERS).create_sql(SqlDialect::Redshift);
        assert!(users.contains("user_id INT DISTKEY PRIMARY KEY"));
        assert!(users.contains("last_name VARCHAR(30) SORTKEY"));

        let songs = table(SONGS).create_sql(SqlDialect::Redshift);
        assert!(songs.contains(
            "artist_id VARCHAR(25) DISTKEY NOT NULL REFERENCES artists (artist_id)"
        ));

        let artists = table(ARTISTS).create_sql(SqlDialect::Redshift);
        assert!(artists.contains("artist_id VARCHAR(25) DISTKEY PRIMARY KEY"));
        assert!(artists.contains("name VARCHAR NOT NULL"));
    }

    #[test]
    fn postgres_ddl_has_no_distribution_keys() {
        for table in star_schema() {
            let sql = table.create_sql(SqlDialect::Postgres);
            assert!(!sql.contains("DISTKEY"), "{sql}");
            assert!(!sql.contains("SORTKEY"), "{sql}");
            assert!(!sql.contains("IDENTITY(0,1)"), "{sql}");
        }
    }

    #[test]
    fn time_table_keys_on_start_time() {
        let time = table(TIME);

        assert_eq!(time.role, TableRole::Dimension);
        assert!(time.columns[0].primary_key);
        assert_eq!(time.columns[0].name, "start_time");
        assert_eq!(time.columns.len(), 7);
    }
}
