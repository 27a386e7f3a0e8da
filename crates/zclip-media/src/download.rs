//! Source image download into the local cache.

use std::path::{Path, PathBuf};
use std::time::Instant;

use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{MediaError, MediaResult};
use crate::metrics;

/// Derive a flat, filesystem-safe cache file name from a source URL.
///
/// `https://cdn.example.com/img/a.jpg` becomes `https_cdn.example.com_img_a.jpg`.
/// Characters other than ASCII alphanumerics, `.`, `_` and `-` are dropped,
/// and leading/trailing dots and underscores are stripped.
pub fn cache_file_name(url: &str) -> String {
    let flattened = url.replace("://", "_").replace('/', "_");
    let safe: String = flattened
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    safe.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Fetch `url` into `cache_dir`, returning the cached path.
///
/// When `reuse_cached` is set and the file already exists, no request is
/// made. The body is streamed into a `.part` file unique to this call and
/// renamed into place only once complete, so a failed download never leaves
/// a truncated image and concurrent fetches of one URL never share a file.
pub async fn fetch_to_cache(
    client: &reqwest::Client,
    url: &str,
    cache_dir: &Path,
    reuse_cached: bool,
) -> MediaResult<PathBuf> {
    let name = cache_file_name(url);
    if name.is_empty() {
        return Err(MediaError::download_failed(format!(
            "Cannot derive a cache name from '{}'",
            url
        )));
    }

    let target = cache_dir.join(&name);
    if reuse_cached && fs::try_exists(&target).await? {
        debug!(path = %target.display(), "Using cached source");
        return Ok(target);
    }

    fs::create_dir_all(cache_dir).await?;

    let started = Instant::now();
    let partial = cache_dir.join(format!("{}.{}.part", name, Uuid::new_v4().simple()));
    let result = download(client, url, &partial, &target).await;
    if result.is_err() {
        let _ = fs::remove_file(&partial).await;
    }
    metrics::record_download(
        result.is_ok(),
        started.elapsed().as_secs_f64(),
        *result.as_ref().unwrap_or(&0),
    );

    let written = result?;
    info!(
        path = %target.display(),
        bytes = written,
        "Cached source image"
    );

    Ok(target)
}

/// Stream `url` into `partial`, then rename it to `target`.
async fn download(
    client: &reqwest::Client,
    url: &str,
    partial: &Path,
    target: &Path,
) -> MediaResult<u64> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(MediaError::download_failed(format!(
            "{} returned HTTP {}",
            url, status
        )));
    }

    let mut file = fs::File::create(partial).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let data = chunk?;
        file.write_all(&data).await?;
        written += data.len() as u64;
    }
    file.flush().await?;
    drop(file);

    fs::rename(partial, target).await?;
    Ok(written)
}
