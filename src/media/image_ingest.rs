//! Copying one artist image into object storage as an original plus a thumbnail.
//!
//! Fetch and original-upload failures fail the operation. A thumbnail failure
//! only degrades it: the original's URL is reported for both variants.

use super::fetcher::ImageFetcher;
use super::file_name::upload_file_name;
use super::object_storage::ObjectStorage;
use super::thumbnail::{ThumbnailError, Thumbnailer};
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub const CACHE_CONTROL: &str = "max-age=31536000";
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";
pub const THUMBNAIL_CONTENT_TYPE: &str = "image/jpeg";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_REGION: &str = "ap-northeast-1";

const EMPTY_NAME_SEGMENT: &str = "unknown";

#[derive(Debug, Error)]
pub enum ImageIngestError {
    #[error("failed to fetch source image: {0:#}")]
    Fetch(anyhow::Error),

    #[error("failed to upload original image: {0:#}")]
    Upload(anyhow::Error),

    #[error("only image files can be uploaded (got {0:?})")]
    NotAnImage(String),

    #[error("file is too large ({size} bytes, limit {limit} bytes)")]
    TooLarge { size: usize, limit: usize },
}

/// Outcome of one image operation. Never an error value: failures are
/// reported through `success` and `error`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageUploadResult {
    pub success: bool,
    pub original_url: String,
    pub small_url: String,
    /// The thumbnail could not be produced or stored; `small_url` is the original.
    pub degraded: bool,
    pub error: Option<String>,
}

impl ImageUploadResult {
    fn failed(error: ImageIngestError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            ..Default::default()
        }
    }
}

/// Public base URL for stored objects: the CDN domain when configured,
/// otherwise the bucket's virtual-hosted S3 URL.
pub fn public_base_url(bucket: &str, region: &str, cdn_domain: Option<&str>) -> String {
    match cdn_domain.map(str::trim).filter(|d| !d.is_empty()) {
        Some(domain) if domain.contains("://") => domain.trim_end_matches('/').to_string(),
        Some(domain) => format!("https://{}", domain.trim_end_matches('/')),
        None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
    }
}

fn is_kept_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || ('\u{3040}'..='\u{309F}').contains(&c) // Hiragana
        || ('\u{30A0}'..='\u{30FF}').contains(&c) // Katakana
        || ('\u{4E00}'..='\u{9FAF}').contains(&c) // CJK ideographs
}

/// Turn an artist name into a single storage path segment.
pub fn sanitize_artist_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if is_kept_char(c) { c } else { '_' };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        EMPTY_NAME_SEGMENT.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn original_key(sanitized_name: &str, file_name: &str) -> String {
    format!("artists/{}/original_{}", sanitized_name, file_name)
}

pub fn small_key(sanitized_name: &str, file_name: &str) -> String {
    format!("artists/{}/small_{}", sanitized_name, file_name)
}

pub struct ImageIngestor {
    storage: Arc<dyn ObjectStorage>,
    fetcher: Arc<dyn ImageFetcher>,
    thumbnailer: Arc<dyn Thumbnailer>,
    base_url: String,
    max_upload_bytes: usize,
}

impl ImageIngestor {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        fetcher: Arc<dyn ImageFetcher>,
        thumbnailer: Arc<dyn Thumbnailer>,
        base_url: String,
    ) -> Self {
        Self {
            storage,
            fetcher,
            thumbnailer,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    /// Fetch the image at `url` and store it for `artist_name` as `file_name`.
    pub async fn ingest_from_url(
        &self,
        url: &str,
        file_name: &str,
        artist_name: &str,
    ) -> ImageUploadResult {
        let fetched = match self.fetcher.fetch(url).await {
            Ok(fetched) => fetched,
            Err(e) => {
                let error = ImageIngestError::Fetch(e);
                warn!("{}: {}", artist_name, error);
                return ImageUploadResult::failed(error);
            }
        };
        let content_type = fetched
            .content_type
            .as_deref()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        self.store_variants(fetched.bytes, &content_type, file_name, artist_name)
            .await
    }

    /// Store an uploaded file for `artist_name`. The content type must be an
    /// image type and the payload must not exceed the upload limit.
    pub async fn ingest_bytes(
        &self,
        bytes: Bytes,
        content_type: &str,
        original_file_name: &str,
        artist_name: &str,
    ) -> ImageUploadResult {
        if !content_type.starts_with("image/") {
            return ImageUploadResult::failed(ImageIngestError::NotAnImage(
                content_type.to_string(),
            ));
        }
        if bytes.len() > self.max_upload_bytes {
            return ImageUploadResult::failed(ImageIngestError::TooLarge {
                size: bytes.len(),
                limit: self.max_upload_bytes,
            });
        }
        let file_name = upload_file_name(original_file_name);
        self.store_variants(bytes, content_type, &file_name, artist_name)
            .await
    }

    async fn store_variants(
        &self,
        bytes: Bytes,
        content_type: &str,
        file_name: &str,
        artist_name: &str,
    ) -> ImageUploadResult {
        let folder = sanitize_artist_name(artist_name);

        let original_key = original_key(&folder, file_name);
        if let Err(e) = self
            .storage
            .put(&original_key, bytes.clone(), content_type, CACHE_CONTROL)
            .await
        {
            let error = ImageIngestError::Upload(e);
            warn!("{}: {}", artist_name, error);
            return ImageUploadResult::failed(error);
        }
        let original_url = self.public_url(&original_key);

        let small_key = small_key(&folder, file_name);
        let small_url = match self.store_thumbnail(bytes, &small_key).await {
            Ok(()) => Some(self.public_url(&small_key)),
            Err(e) => {
                warn!(
                    "{}: thumbnail unavailable, using original image ({:#})",
                    artist_name, e
                );
                None
            }
        };

        info!("Stored images for {} under artists/{}/", artist_name, folder);
        ImageUploadResult {
            success: true,
            degraded: small_url.is_none(),
            small_url: small_url.unwrap_or_else(|| original_url.clone()),
            original_url,
            error: None,
        }
    }

    async fn store_thumbnail(&self, source: Bytes, key: &str) -> anyhow::Result<()> {
        let thumbnailer = self.thumbnailer.clone();
        let thumbnail = tokio::task::spawn_blocking(move || thumbnailer.thumbnail(&source))
            .await
            .map_err(|e| ThumbnailError::Unavailable(e.to_string()))??;

        self.storage
            .put(key, Bytes::from(thumbnail), THUMBNAIL_CONTENT_TYPE, CACHE_CONTROL)
            .await
    }
}
