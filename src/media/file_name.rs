//! Destination file names for stored images.

use chrono::Utc;
use reqwest::Url;

/// File name for an image fetched from `url`: the last path segment, with
/// `.jpg` appended when it has no extension. Unparsable URLs get a
/// timestamped name.
pub fn file_name_from_url(url: &str) -> String {
    let last_segment = Url::parse(url)
        .ok()
        .and_then(|u| u.path_segments().and_then(|s| s.last().map(str::to_string)));

    match last_segment {
        Some(segment) if segment.contains('.') => segment,
        Some(segment) => format!("{}.jpg", segment),
        None => format!("image_{}.jpg", Utc::now().timestamp_millis()),
    }
}

/// File name for a directly uploaded file: a millisecond timestamp carrying
/// over the original extension, `jpg` if there is none.
pub fn upload_file_name(original_name: &str) -> String {
    let extension = original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .unwrap_or("jpg");
    format!("{}.{}", Utc::now().timestamp_millis(), extension)
}
