mod models;
mod schema;
mod store;
mod trait_def;

pub use models::*;
pub use schema::ARTIST_VERSIONED_SCHEMAS;
pub use store::SqliteArtistStore;
pub use trait_def::ArtistStore;
#[cfg(any(test, feature = "mock"))]
pub use trait_def::MockArtistStore;
