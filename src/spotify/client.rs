//! Spotify Web API client for exporting artists by genre.
//!
//! Uses the client-credentials flow. Search results are paged 50 at a time
//! with a pause between pages.

use crate::ingest::LegacyArtistData;
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::StatusCode;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SEARCH_URL: &str = "https://api.spotify.com/v1/search";
const PAGE_SIZE: usize = 50;
const MAX_ATTEMPTS: usize = 3;
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);
const BAD_GATEWAY_BACKOFF: Duration = Duration::from_secs(2);

pub const DEFAULT_MIN_FOLLOWERS: u64 = 10_000;
pub const DEFAULT_PAGE_PAUSE: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    artists: SearchPage,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    items: Vec<SpotifyArtist>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyArtist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub followers: SpotifyFollowers,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpotifyFollowers {
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
}

/// Artists tagged with `genre` and at least `min_followers` followers.
pub fn filter_artists(
    artists: Vec<SpotifyArtist>,
    genre: &str,
    min_followers: u64,
) -> Vec<SpotifyArtist> {
    artists
        .into_iter()
        .filter(|a| a.genres.iter().any(|g| g == genre) && a.followers.total >= min_followers)
        .collect()
}

/// Convert to the flat legacy shape. Location is unknown, so city is empty and
/// the coordinates are the (0, 0) sentinel. The largest image is the original
/// and the third one, when present, the small variant.
pub fn to_legacy(artist: &SpotifyArtist) -> LegacyArtistData {
    let image = |index: usize| {
        artist
            .images
            .get(index)
            .map(|i| i.url.clone())
            .unwrap_or_default()
    };
    LegacyArtistData {
        name: artist.name.clone(),
        city: String::new(),
        prefecture: None,
        lat: 0.0,
        lng: 0.0,
        genres: artist.genres.clone(),
        song_title: String::new(),
        spotify_track_id: artist.id.clone(),
        original_image: image(0),
        small_image: image(2),
        youtube_url: String::new(),
    }
}

/// Page through a search from offset 0 until a short page. A page that fails
/// ends the search early, keeping everything collected before it.
async fn collect_pages<T, F, Fut>(page_pause: Duration, mut fetch_page: F) -> Vec<T>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut items = Vec::new();
    let mut offset = 0;
    loop {
        let page = match fetch_page(offset).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Search stopped at offset {}: {:#}", offset, e);
                break;
            }
        };
        let page_len = page.len();
        items.extend(page);
        if page_len < PAGE_SIZE {
            break;
        }
        offset += PAGE_SIZE;
        tokio::time::sleep(page_pause).await;
    }
    items
}

pub struct SpotifyClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    page_pause: Duration,
}

impl SpotifyClient {
    pub fn new(client_id: &str, client_secret: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            page_pause: DEFAULT_PAGE_PAUSE,
        })
    }

    async fn access_token(&self) -> Result<String> {
        let credentials = STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret));
        let response = self
            .client
            .post(TOKEN_URL)
            .header(reqwest::header::AUTHORIZATION, format!("Basic {}", credentials))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("Failed to request Spotify access token")?;

        if !response.status().is_success() {
            anyhow::bail!("Spotify token request failed with status {}", response.status());
        }
        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse Spotify token response")?;
        Ok(token.access_token)
    }

    async fn search_page(&self, token: &str, query: &str, offset: usize) -> Result<Vec<SpotifyArtist>> {
        let limit = PAGE_SIZE.to_string();
        let offset = offset.to_string();

        for attempt in 1..=MAX_ATTEMPTS {
            let response = self
                .client
                .get(SEARCH_URL)
                .bearer_auth(token)
                .query(&[
                    ("q", query),
                    ("type", "artist"),
                    ("limit", limit.as_str()),
                    ("offset", offset.as_str()),
                ])
                .send()
                .await
                .context("Spotify search request failed")?;

            match response.status() {
                StatusCode::TOO_MANY_REQUESTS => {
                    let wait = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .map(Duration::from_secs)
                        .unwrap_or(DEFAULT_RETRY_AFTER);
                    warn!("Rate limited by Spotify, waiting {:?}", wait);
                    tokio::time::sleep(wait).await;
                }
                StatusCode::BAD_GATEWAY if attempt < MAX_ATTEMPTS => {
                    warn!("Spotify returned 502, retrying in {:?}", BAD_GATEWAY_BACKOFF);
                    tokio::time::sleep(BAD_GATEWAY_BACKOFF).await;
                }
                status if status.is_success() => {
                    let body: SearchResponse = response
                        .json()
                        .await
                        .context("Failed to parse Spotify search response")?;
                    return Ok(body.artists.items);
                }
                status => anyhow::bail!("Spotify search failed with status {}", status),
            }
        }
        anyhow::bail!("Spotify search gave up after {} attempts", MAX_ATTEMPTS)
    }

    /// All artists returned by a genre search, unfiltered. Only a failed token
    /// request is an error; a failed page keeps the earlier pages.
    pub async fn search_by_genre(&self, genre: &str) -> Result<Vec<SpotifyArtist>> {
        let token = self.access_token().await?;
        let query = format!("genre:\"{}\"", genre);
        let artists = collect_pages(self.page_pause, |offset| {
            self.search_page(&token, &query, offset)
        })
        .await;

        info!("Spotify returned {} artists for genre {}", artists.len(), genre);
        Ok(artists)
    }

    /// Search, filter and convert in one go.
    pub async fn export_genre(&self, genre: &str, min_followers: u64) -> Result<Vec<LegacyArtistData>> {
        let artists = self.search_by_genre(genre).await?;
        let kept = filter_artists(artists, genre, min_followers);
        info!(
            "{} artists tagged {} with at least {} followers",
            kept.len(),
            genre,
            min_followers
        );
        Ok(kept.iter().map(to_legacy).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spotify_artist(name: &str, genres: &[&str], followers: u64, images: usize) -> SpotifyArtist {
        SpotifyArtist {
            id: format!("id-{}", name),
            name: name.to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            followers: SpotifyFollowers { total: followers },
            images: (0..images)
                .map(|i| SpotifyImage {
                    url: format!("https://i.scdn.co/image/{}-{}", name, i),
                })
                .collect(),
        }
    }

    #[test]
    fn test_filter_by_genre_and_followers() {
        let artists = vec![
            spotify_artist("big", &["j-rap", "trap"], 50_000, 3),
            spotify_artist("small", &["j-rap"], 9_999, 3),
            spotify_artist("other", &["k-pop"], 1_000_000, 3),
            spotify_artist("edge", &["j-rap"], 10_000, 0),
        ];
        let kept: Vec<String> = filter_artists(artists, "j-rap", DEFAULT_MIN_FOLLOWERS)
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(kept, vec!["big", "edge"]);
    }

    #[test]
    fn test_to_legacy_picks_images() {
        let legacy = to_legacy(&spotify_artist("big", &["j-rap"], 50_000, 3));
        assert_eq!(legacy.spotify_track_id, "id-big");
        assert_eq!(legacy.original_image, "https://i.scdn.co/image/big-0");
        assert_eq!(legacy.small_image, "https://i.scdn.co/image/big-2");
        assert_eq!((legacy.lat, legacy.lng), (0.0, 0.0));
        assert_eq!(legacy.city, "");

        let no_images = to_legacy(&spotify_artist("bare", &["j-rap"], 50_000, 1));
        assert_eq!(no_images.original_image, "https://i.scdn.co/image/bare-0");
        assert_eq!(no_images.small_image, "");
    }

    #[tokio::test]
    async fn test_failed_page_keeps_earlier_pages() {
        let offsets = std::sync::Mutex::new(Vec::new());
        let names = collect_pages(Duration::ZERO, |offset| {
            offsets.lock().unwrap().push(offset);
            async move {
                if offset >= 2 * PAGE_SIZE {
                    anyhow::bail!("Spotify search failed with status 400 Bad Request");
                }
                Ok(vec![format!("artist-{}", offset); PAGE_SIZE])
            }
        })
        .await;

        assert_eq!(names.len(), 2 * PAGE_SIZE);
        assert_eq!(*offsets.lock().unwrap(), vec![0, PAGE_SIZE, 2 * PAGE_SIZE]);
    }

    #[tokio::test]
    async fn test_short_page_ends_search() {
        let mut calls = 0;
        let names = collect_pages(Duration::ZERO, |offset| {
            calls += 1;
            async move {
                let len = if offset == 0 { PAGE_SIZE } else { 7 };
                Ok::<_, anyhow::Error>(vec![offset; len])
            }
        })
        .await;

        assert_eq!(names.len(), PAGE_SIZE + 7);
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_failed_first_page_is_empty() {
        let names: Vec<String> = collect_pages(Duration::ZERO, |_| async {
            Err(anyhow::anyhow!(
                "Spotify search failed with status 401 Unauthorized"
            ))
        })
        .await;
        assert!(names.is_empty());
    }

    #[test]
    fn test_search_response_parses() {
        let json = r#"{"artists": {"items": [
            {"id": "1", "name": "Awich", "genres": ["j-rap"], "followers": {"total": 123}, "images": [{"url": "u", "height": 640, "width": 640}]}
        ], "total": 1}}"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.artists.items.len(), 1);
        assert_eq!(parsed.artists.items[0].followers.total, 123);
    }
}
