mod client;

pub use client::{
    filter_artists, to_legacy, SpotifyArtist, SpotifyClient, DEFAULT_MIN_FOLLOWERS,
    DEFAULT_PAGE_PAUSE,
};
