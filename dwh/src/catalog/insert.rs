//! Transformations from the staging tables into the fact and dimension tables.
//!
//! Event timestamps are epoch milliseconds and are truncated to whole seconds, so `songplays` and
//! `time` agree on `start_time`.

use crate::catalog::tables::{ARTISTS, SONGPLAYS, SONGS, TIME, USERS};

const SONGPLAYS_INSERT: &str = r#"INSERT INTO songplays (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
SELECT
    TIMESTAMP 'epoch' + (e."timestamp" / 1000) * INTERVAL '1 second' AS start_time,
    e.user_id,
    e.level,
    s.song_id,
    s.artist_id,
    e.session_id,
    e.location,
    e.user_agent
FROM staging_events e
JOIN staging_songs s
    ON e.artist = s.artist_name
    AND e.length = s.duration
    AND e.song = s.title
WHERE e.page = 'NextSong'
    AND e.user_id IS NOT NULL
    AND e."timestamp" IS NOT NULL"#;

// Latest event wins, so a user's current level is kept. Events without a timestamp rank last.
const USERS_INSERT: &str = r#"INSERT INTO users (user_id, first_name, last_name, gender, level)
SELECT user_id, first_name, last_name, gender, level
FROM (
    SELECT
        user_id,
        first_name,
        last_name,
        gender,
        level,
        ROW_NUMBER() OVER (PARTITION BY user_id ORDER BY "timestamp" DESC NULLS LAST) AS row_rank
    FROM staging_events
    WHERE page = 'NextSong'
        AND user_id IS NOT NULL
) ranked
WHERE row_rank = 1"#;

// Only songs whose artist survives the artists filter, so `songs.artist_id` always resolves.
const SONGS_INSERT: &str = r#"INSERT INTO songs (song_id, title, artist_id, year, duration)
SELECT song_id, title, artist_id, year, duration
FROM (
    SELECT
        song_id,
        title,
        artist_id,
        year,
        duration,
        ROW_NUMBER() OVER (PARTITION BY song_id ORDER BY title, artist_id) AS row_rank
    FROM staging_songs
    WHERE song_id IS NOT NULL
        AND title IS NOT NULL
        AND artist_id IS NOT NULL
        AND artist_id IN (
            SELECT artist_id
            FROM staging_songs
            WHERE artist_id IS NOT NULL
                AND artist_name IS NOT NULL
        )
) ranked
WHERE row_rank = 1"#;

const ARTISTS_INSERT: &str = r#"INSERT INTO artists (artist_id, name, location, latitude, longitude)
SELECT artist_id, artist_name, artist_location, artist_latitude, artist_longitude
FROM (
    SELECT
        artist_id,
        artist_name,
        artist_location,
        artist_latitude,
        artist_longitude,
        ROW_NUMBER() OVER (PARTITION BY artist_id ORDER BY artist_name) AS row_rank
    FROM staging_songs
    WHERE artist_id IS NOT NULL
        AND artist_name IS NOT NULL
) ranked
WHERE row_rank = 1"#;

const TIME_INSERT: &str = r#"INSERT INTO "time" (start_time, hour, day, week_of_year, month, year, weekday)
SELECT
    start_time,
    EXTRACT(HOUR FROM start_time),
    EXTRACT(DAY FROM start_time),
    EXTRACT(WEEK FROM start_time),
    EXTRACT(MONTH FROM start_time),
    EXTRACT(YEAR FROM start_time),
    EXTRACT(DOW FROM start_time) NOT IN (0, 6)
FROM (
    SELECT DISTINCT TIMESTAMP 'epoch' + ("timestamp" / 1000) * INTERVAL '1 second' AS start_time
    FROM staging_events
    WHERE page = 'NextSong'
        AND "timestamp" IS NOT NULL
) plays"#;

/// Returns `(table, sql)` for every insert, fact table first.
pub fn declared_inserts() -> [(&'static str, &'static str); 5] {
    [
        (SONGPLAYS, SONGPLAYS_INSERT),
        (USERS, USERS_INSERT),
        (SONGS, SONGS_INSERT),
        (ARTISTS, ARTISTS_INSERT),
        (TIME, TIME_INSERT),
    ]
}
