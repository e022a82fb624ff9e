//! SQLite schema definitions for the artist database.
//!
//! Version 0 is the original map schema. Version 1 adds the biography columns.
//! Genres live in their own table with an explicit position so their order
//! survives a round trip.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};
use anyhow::Result;
use rusqlite::Connection;

const ARTISTS_TABLE_V0: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("city", &SqlType::Text, non_null = true),
        sqlite_column!("prefecture", &SqlType::Text, non_null = true),
        sqlite_column!("lat", &SqlType::Real, non_null = true),
        sqlite_column!("lng", &SqlType::Real, non_null = true),
        sqlite_column!(
            "song_title",
            &SqlType::Text,
            non_null = true,
            default_value = Some("''")
        ),
        sqlite_column!("spotify_track_id", &SqlType::Text),
        sqlite_column!("original_image", &SqlType::Text),
        sqlite_column!("small_image", &SqlType::Text),
        sqlite_column!("youtube_url", &SqlType::Text),
        sqlite_column!("instagram_url", &SqlType::Text),
        sqlite_column!("twitter_url", &SqlType::Text),
        sqlite_column!("facebook_url", &SqlType::Text),
        sqlite_column!("youtube_channel_url", &SqlType::Text),
        sqlite_column!("tiktok_url", &SqlType::Text),
        sqlite_column!("created_at", &SqlType::Integer, non_null = true),
        sqlite_column!("updated_at", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_artists_name", "name"),
        ("idx_artists_coordinates", "lat, lng"),
    ],
};

const ARTISTS_TABLE_V1: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("city", &SqlType::Text, non_null = true),
        sqlite_column!("prefecture", &SqlType::Text, non_null = true),
        sqlite_column!("lat", &SqlType::Real, non_null = true),
        sqlite_column!("lng", &SqlType::Real, non_null = true),
        sqlite_column!(
            "song_title",
            &SqlType::Text,
            non_null = true,
            default_value = Some("''")
        ),
        sqlite_column!("spotify_track_id", &SqlType::Text),
        sqlite_column!("original_image", &SqlType::Text),
        sqlite_column!("small_image", &SqlType::Text),
        sqlite_column!("youtube_url", &SqlType::Text),
        sqlite_column!("instagram_url", &SqlType::Text),
        sqlite_column!("twitter_url", &SqlType::Text),
        sqlite_column!("facebook_url", &SqlType::Text),
        sqlite_column!("youtube_channel_url", &SqlType::Text),
        sqlite_column!("tiktok_url", &SqlType::Text),
        sqlite_column!("created_at", &SqlType::Integer, non_null = true),
        sqlite_column!("updated_at", &SqlType::Integer, non_null = true),
        sqlite_column!("bio_summary", &SqlType::Text),
        sqlite_column!("bio_url", &SqlType::Text),
        sqlite_column!("birthdate", &SqlType::Text), // YYYY-MM-DD
        sqlite_column!("deathdate", &SqlType::Text), // YYYY-MM-DD
        sqlite_column!("years_active_start", &SqlType::Integer),
        sqlite_column!("years_active_end", &SqlType::Integer),
    ],
    indices: &[
        ("idx_artists_name", "name"),
        ("idx_artists_coordinates", "lat, lng"),
    ],
};

/// Artist <-> Genre relationship, ordered by position.
const ARTIST_GENRES_TABLE: Table = Table {
    name: "artist_genres",
    columns: &[
        sqlite_column!("artist_id", &SqlType::Integer, non_null = true),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
        sqlite_column!("genre", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_artist_genres_artist", "artist_id")],
};

const BIO_COLUMNS: &[&str] = &[
    "bio_summary",
    "bio_url",
    "birthdate",
    "deathdate",
    "years_active_start",
    "years_active_end",
];

fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
    for column in BIO_COLUMNS {
        ARTISTS_TABLE_V1.add_column(conn, column)?;
    }
    Ok(())
}

pub const ARTIST_VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 0,
        tables: &[ARTISTS_TABLE_V0, ARTIST_GENRES_TABLE],
        migration: None,
    },
    VersionedSchema {
        version: 1,
        tables: &[ARTISTS_TABLE_V1, ARTIST_GENRES_TABLE],
        migration: Some(migrate_v0_to_v1),
    },
];
