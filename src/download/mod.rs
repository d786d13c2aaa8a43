use anyhow::{Context, Result};
use log::{debug, info};
use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::runtime::Runtime;

/// Name used when the response does not suggest one.
pub const DEFAULT_FILE_NAME: &str = "download";

static FILENAME_EXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename\*\s*=\s*[\w!#$&+.^`|~-]*'[^']*'([^;]+)"#).expect("valid regex")
});

static FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|;)\s*filename\s*=\s*("[^"]*"|[^;]*)"#).expect("valid regex")
});

/// A downloaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: String,
    /// Where the file was written.
    pub saved_to: PathBuf,
}

impl Blob {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Suggested file name from the response headers, or [`DEFAULT_FILE_NAME`].
pub fn file_name_from_headers(headers: &HeaderMap) -> String {
    headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(file_name_from_disposition)
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string())
}

pub fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Extracts and percent-decodes the `filename` of a `content-disposition`
/// value. The RFC 5987 `filename*=` form wins when both are present.
pub fn file_name_from_disposition(disposition: &str) -> Option<String> {
    let raw = FILENAME_EXT
        .captures(disposition)
        .or_else(|| FILENAME.captures(disposition))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().trim_matches('"'))?;

    let decoded = match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        // Not valid percent-encoded UTF-8; keep it verbatim.
        Err(_) => raw.to_string(),
    };

    sanitize(&decoded)
}

/// Keeps only the final path component so a suggested name can never
/// escape the download directory.
fn sanitize(name: &str) -> Option<String> {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    match base {
        "" | "." | ".." => None,
        _ => Some(base.to_string()),
    }
}

/// Writes the blob bytes to `dir/file_name`, creating `dir` when needed.
#[tracing::instrument(skip(runtime, bytes))]
pub fn save_file<R: Runtime + ?Sized>(
    runtime: &R,
    dir: &Path,
    file_name: &str,
    bytes: &[u8],
) -> Result<PathBuf> {
    runtime
        .create_dir_all(dir)
        .with_context(|| format!("Failed to create download directory {:?}", dir))?;

    let path = dir.join(file_name);
    debug!("Saving {} bytes to {:?}", bytes.len(), path);
    runtime
        .write(&path, bytes)
        .with_context(|| format!("Failed to save {:?}", path))?;

    info!("Saved {}", path.display());
    Ok(path)
}
