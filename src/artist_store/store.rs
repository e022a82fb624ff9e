//! SQLite-backed artist store.

use super::models::{ArtistMatch, ArtistRecord, AuditStamp, Coordinates, NewArtist};
use super::schema::ARTIST_VERSIONED_SCHEMAS;
use super::trait_def::ArtistStore;
use crate::sqlite_persistence::migrate_to_latest;
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::info;

const ARTIST_COLUMNS: &str = "id, name, city, prefecture, lat, lng, song_title, \
     spotify_track_id, youtube_url, instagram_url, twitter_url, facebook_url, \
     youtube_channel_url, tiktok_url, original_image, small_image, bio_summary, bio_url, \
     birthdate, deathdate, years_active_start, years_active_end, created_at, updated_at";

/// SQLite-backed artist store.
#[derive(Clone)]
pub struct SqliteArtistStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteArtistStore {
    /// Open (or create) the artist database at `db_path`, migrating it to the
    /// latest schema. `busy_timeout` bounds how long a statement waits on a lock.
    pub fn new<P: AsRef<Path>>(db_path: P, busy_timeout: Duration) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open artist database at {:?}", db_path))?;
        Self::from_connection(conn, busy_timeout)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, Duration::from_secs(5))
    }

    fn from_connection(mut conn: Connection, busy_timeout: Duration) -> Result<Self> {
        conn.busy_timeout(busy_timeout)?;
        let version = migrate_to_latest(&mut conn, ARTIST_VERSIONED_SCHEMAS)?;

        let artist_count: i64 = conn.query_row("SELECT COUNT(*) FROM artists", [], |r| r.get(0))?;
        info!(
            "Opened artist db at schema version {}: {} artists",
            version, artist_count
        );

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Artist db connection lock poisoned"))
    }

    /// Parse a row selected with `ARTIST_COLUMNS`; genres are attached separately.
    fn parse_artist_row(row: &rusqlite::Row) -> rusqlite::Result<ArtistRecord> {
        Ok(ArtistRecord {
            id: row.get(0)?,
            artist: NewArtist {
                name: row.get(1)?,
                city: row.get(2)?,
                prefecture: row.get(3)?,
                lat: row.get(4)?,
                lng: row.get(5)?,
                genres: Vec::new(),
                song_title: row.get(6)?,
                spotify_track_id: row.get(7)?,
                youtube_url: row.get(8)?,
                instagram_url: row.get(9)?,
                twitter_url: row.get(10)?,
                facebook_url: row.get(11)?,
                youtube_channel_url: row.get(12)?,
                tiktok_url: row.get(13)?,
                original_image: row.get(14)?,
                small_image: row.get(15)?,
                bio_summary: row.get(16)?,
                bio_url: row.get(17)?,
                birthdate: row.get(18)?,
                deathdate: row.get(19)?,
                years_active_start: row.get(20)?,
                years_active_end: row.get(21)?,
            },
            created_at: row.get(22)?,
            updated_at: row.get(23)?,
        })
    }

    fn get_artist_genres(conn: &Connection, artist_id: i64) -> Result<Vec<String>> {
        let mut stmt = conn.prepare_cached(
            "SELECT genre FROM artist_genres WHERE artist_id = ?1 ORDER BY position",
        )?;
        let genres = stmt
            .query_map(params![artist_id], |r| r.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(genres)
    }

    /// Run a query over `ARTIST_COLUMNS` and attach genres to every result.
    fn query_artists(conn: &Connection, where_clause: &str) -> Result<Vec<ArtistRecord>> {
        let sql = format!(
            "SELECT {} FROM artists {} ORDER BY id",
            ARTIST_COLUMNS, where_clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut artists = stmt
            .query_map([], Self::parse_artist_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut genres_by_artist: HashMap<i64, Vec<String>> = HashMap::new();
        let mut genre_stmt = conn.prepare_cached(
            "SELECT artist_id, genre FROM artist_genres ORDER BY artist_id, position",
        )?;
        let rows = genre_stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?;
        for row in rows {
            let (artist_id, genre) = row?;
            genres_by_artist.entry(artist_id).or_default().push(genre);
        }
        for record in artists.iter_mut() {
            if let Some(genres) = genres_by_artist.remove(&record.id) {
                record.artist.genres = genres;
            }
        }
        Ok(artists)
    }
}

impl ArtistStore for SqliteArtistStore {
    fn ping(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))
            .context("Artist db connectivity check failed")?;
        Ok(())
    }

    fn count_artists(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM artists", [], |r| r.get(0))?;
        Ok(count as usize)
    }

    fn find_by_name_or_coordinates(
        &self,
        name: &str,
        coordinates: Option<Coordinates>,
    ) -> Result<Vec<ArtistMatch>> {
        let conn = self.lock()?;
        let parse = |r: &rusqlite::Row| {
            Ok(ArtistMatch {
                id: r.get(0)?,
                name: r.get(1)?,
            })
        };
        let matches = match coordinates {
            Some(coords) => {
                let mut stmt = conn.prepare_cached(
                    "SELECT id, name FROM artists WHERE name = ?1 OR (lat = ?2 AND lng = ?3)",
                )?;
                let rows = stmt.query_map(params![name, coords.lat, coords.lng], parse)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare_cached("SELECT id, name FROM artists WHERE name = ?1")?;
                let rows = stmt.query_map(params![name], parse)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(matches)
    }

    fn get_artist(&self, id: i64) -> Result<Option<ArtistRecord>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM artists WHERE id = ?1", ARTIST_COLUMNS);
        let record = conn
            .query_row(&sql, params![id], Self::parse_artist_row)
            .optional()?;
        match record {
            Some(mut record) => {
                record.artist.genres = Self::get_artist_genres(&conn, record.id)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn list_artists(&self) -> Result<Vec<ArtistRecord>> {
        let conn = self.lock()?;
        Self::query_artists(&conn, "")
    }

    fn list_artists_with_location(&self) -> Result<Vec<ArtistRecord>> {
        let conn = self.lock()?;
        Self::query_artists(
            &conn,
            "WHERE lat IS NOT NULL AND lng IS NOT NULL AND NOT (lat = 0 AND lng = 0)",
        )
    }

    fn list_artist_names(&self) -> Result<HashSet<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT DISTINCT name FROM artists")?;
        let names = stmt
            .query_map([], |r| r.get(0))?
            .collect::<Result<HashSet<String>, _>>()?;
        Ok(names)
    }

    fn insert_artist(&self, artist: &NewArtist, audit: AuditStamp) -> Result<ArtistRecord> {
        if !artist.coordinates().is_finite() {
            anyhow::bail!(
                "Refusing to store non-finite coordinates for {}: lat={}, lng={}",
                artist.name,
                artist.lat,
                artist.lng
            );
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO artists (name, city, prefecture, lat, lng, song_title,
                spotify_track_id, youtube_url, instagram_url, twitter_url, facebook_url,
                youtube_channel_url, tiktok_url, original_image, small_image, bio_summary, bio_url,
                birthdate, deathdate, years_active_start, years_active_end, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20, ?21, ?22, ?23)",
            params![
                artist.name,
                artist.city,
                artist.prefecture,
                artist.lat,
                artist.lng,
                artist.song_title,
                artist.spotify_track_id,
                artist.youtube_url,
                artist.instagram_url,
                artist.twitter_url,
                artist.facebook_url,
                artist.youtube_channel_url,
                artist.tiktok_url,
                artist.original_image,
                artist.small_image,
                artist.bio_summary,
                artist.bio_url,
                artist.birthdate,
                artist.deathdate,
                artist.years_active_start,
                artist.years_active_end,
                audit.created_at,
                audit.updated_at,
            ],
        )?;
        let id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO artist_genres (artist_id, position, genre) VALUES (?1, ?2, ?3)",
            )?;
            for (position, genre) in artist.genres.iter().enumerate() {
                stmt.execute(params![id, position as i64, genre])?;
            }
        }
        tx.commit()?;

        Ok(ArtistRecord {
            id,
            artist: artist.clone(),
            created_at: audit.created_at,
            updated_at: audit.updated_at,
        })
    }

    fn update_artist_images(
        &self,
        id: i64,
        original_image: Option<String>,
        small_image: Option<String>,
        updated_at: i64,
    ) -> Result<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE artists SET original_image = ?1, small_image = ?2, updated_at = ?3 WHERE id = ?4",
            params![original_image, small_image, updated_at, id],
        )?;
        Ok(changed > 0)
    }
}
