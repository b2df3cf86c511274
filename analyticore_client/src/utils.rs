use std::fs::File;
use std::io::Write;
use std::path::Path;

use url::Url;

use crate::ClientError;

pub fn save_json(data: &serde_json::Value, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
    let path = path.as_ref();
    let mut file = File::create(path)?;
    file.write_all(serde_json::to_string_pretty(data)?.as_bytes())?;
    println!("✅ {} written.", path.display());
    Ok(())
}

/// Parses a service base URL, rejecting ones that cannot carry a path.
pub fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(ClientError::UnsupportedUrl(raw.to_string()));
    }
    Ok(url)
}

/// Appends path segments to `base`, keeping any prefix path it already has.
pub fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}
