//! Builders for staging rows, used where a `COPY` from object storage is not available.

use dwh_postgres::schema::quote_value;

fn text(value: &Option<String>) -> String {
    value
        .as_deref()
        .map(quote_value)
        .unwrap_or_else(|| "NULL".to_string())
}

fn number<T: ToString>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "NULL".to_string())
}

/// A row of `staging_events`, one user interaction from the event log.
#[derive(Debug, Clone)]
pub struct StagingEvent {
    pub artist: Option<String>,
    pub auth: Option<String>,
    pub first_name: Option<String>,
    pub gender: Option<String>,
    pub item_in_session: Option<i32>,
    pub last_name: Option<String>,
    pub length: Option<f64>,
    pub level: Option<String>,
    pub location: Option<String>,
    pub method: Option<String>,
    pub page: Option<String>,
    pub registration: Option<f64>,
    pub session_id: Option<i32>,
    pub song: Option<String>,
    pub status: Option<i16>,
    /// Epoch milliseconds.
    pub timestamp: Option<i64>,
    pub user_agent: Option<String>,
    pub user_id: Option<i32>,
}

impl StagingEvent {
    /// A `NextSong` play of `song` by `artist` lasting `length` seconds, by user `user_id`.
    pub fn next_song(artist: &str, song: &str, length: f64, user_id: i32) -> Self {
        Self {
            artist: Some(artist.to_string()),
            auth: Some("Logged In".to_string()),
            first_name: Some("Kaylee".to_string()),
            gender: Some("F".to_string()),
            item_in_session: Some(0),
            last_name: Some("Summers".to_string()),
            length: Some(length),
            level: Some("free".to_string()),
            location: Some("Phoenix-Mesa-Scottsdale, AZ".to_string()),
            method: Some("PUT".to_string()),
            page: Some("NextSong".to_string()),
            registration: Some(1_540_344_794_796.0),
            session_id: Some(139),
            song: Some(song.to_string()),
            status: Some(200),
            timestamp: Some(1_541_105_830_796),
            user_agent: Some("Mozilla/5.0".to_string()),
            user_id: Some(user_id),
        }
    }

    pub fn with_page(mut self, page: &str) -> Self {
        self.page = Some(page.to_string());
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn without_timestamp(mut self) -> Self {
        self.timestamp = None;
        self
    }

    pub fn with_level(mut self, level: &str) -> Self {
        self.level = Some(level.to_string());
        self
    }

    pub fn insert_sql(&self) -> String {
        let values = [
            text(&self.artist),
            text(&self.auth),
            text(&self.first_name),
            text(&self.gender),
            number(&self.item_in_session),
            text(&self.last_name),
            number(&self.length),
            text(&self.level),
            text(&self.location),
            text(&self.method),
            text(&self.page),
            number(&self.registration),
            number(&self.session_id),
            text(&self.song),
            number(&self.status),
            number(&self.timestamp),
            text(&self.user_agent),
            number(&self.user_id),
        ];

        format!(
            "INSERT INTO staging_events (artist, auth, first_name, gender, item_in_session, \
             last_name, length, level, location, method, page, registration, session_id, song, \
             status, \"timestamp\", user_agent, user_id) VALUES ({})",
            values.join(", ")
        )
    }
}

/// A row of `staging_songs`, one song from the song dataset.
#[derive(Debug, Clone)]
pub struct StagingSong {
    pub num_songs: Option<i16>,
    pub artist_id: Option<String>,
    pub artist_longitude: Option<f64>,
    pub artist_latitude: Option<f64>,
    pub artist_location: Option<String>,
    pub artist_name: Option<String>,
    pub song_id: Option<String>,
    pub title: Option<String>,
    pub duration: Option<f64>,
    pub year: Option<i16>,
}

impl StagingSong {
    pub fn new(song_id: &str, title: &str, artist_id: &str, artist_name: &str, duration: f64) -> Self {
        Self {
            num_songs: Some(1),
            artist_id: Some(artist_id.to_string()),
            artist_longitude: None,
            artist_latitude: None,
            artist_location: Some(String::new()),
            artist_name: Some(artist_name.to_string()),
            song_id: Some(song_id.to_string()),
            title: Some(title.to_string()),
            duration: Some(duration),
            year: Some(2007),
        }
    }

    pub fn insert_sql(&self) -> String {
        let values = [
            number(&self.num_songs),
            text(&self.artist_id),
            number(&self.artist_longitude),
            number(&self.artist_latitude),
            text(&self.artist_location),
            text(&self.artist_name),
            text(&self.song_id),
            text(&self.title),
            number(&self.duration),
            number(&self.year),
        ];

        format!(
            "INSERT INTO staging_songs (num_songs, artist_id, artist_longitude, artist_latitude, \
             artist_location, artist_name, song_id, title, duration, year) VALUES ({})",
            values.join(", ")
        )
    }
}
