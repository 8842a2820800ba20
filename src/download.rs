//! Downloads single files over plain HTTP.

use std::{
    fs::{self, File},
    io::{copy, Cursor, Write},
    path::Path,
};

use anyhow::{Context, Error, Result};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;

/// What happened to a single requested file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The file was written to disk.
    Downloaded { bytes: u64 },
    /// The server answered 404.
    NotFound,
    /// The server answered with any other status, including 2xx codes other than 200.
    Failed(StatusCode),
}

impl DownloadOutcome {
    pub fn from_status(status: StatusCode, bytes: u64) -> Self {
        if status == StatusCode::OK {
            DownloadOutcome::Downloaded { bytes }
        } else if status == StatusCode::NOT_FOUND {
            DownloadOutcome::NotFound
        } else {
            DownloadOutcome::Failed(status)
        }
    }

    pub fn is_downloaded(&self) -> bool {
        matches!(self, DownloadOutcome::Downloaded { .. })
    }

    /// The console message reported for this outcome.
    pub fn message(&self, url: &str, file_path: &Path) -> String {
        match self {
            DownloadOutcome::Downloaded { .. } => format!(
                "Download finished successfully for {}.",
                file_path.display()
            ),
            DownloadOutcome::NotFound => format!(
                "File {} was not available on the neon server: {}",
                file_path.display(),
                url
            ),
            DownloadOutcome::Failed(status) => format!(
                "Failed to download {} from {}: {}",
                file_path.display(),
                url,
                status
            ),
        }
    }
}

/// Downloads the file at `url` and saves it to `file_path`.
///
/// Nothing is written unless the server answers 200 and the whole body arrives.
pub async fn download_file(url: &str, file_path: &Path) -> Result<DownloadOutcome> {
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("Failed to request {}", url))?;
    let status = response.status();
    log::debug!("GET {} -> {}", url, status);

    let outcome = DownloadOutcome::from_status(status, 0);
    if !outcome.is_downloaded() {
        return Ok(outcome);
    }

    let body = response
        .bytes()
        .await
        .with_context(|| format!("Failed to read the body of {}", url))?;
    let mut file = File::create(file_path)
        .with_context(|| format!("Failed to create {}", file_path.display()))?;
    let bytes = copy(&mut Cursor::new(body), &mut file)?;
    log::info!("Downloaded {} bytes to {}", bytes, file_path.display());

    Ok(DownloadOutcome::Downloaded { bytes })
}

/// Downloads with a byte progress bar when the server reports a content length.
pub async fn download_file_with_progress(
    url: &str,
    file_path: &Path,
    progress_bar: ProgressBar,
) -> Result<DownloadOutcome> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| Error::msg(format!("Failed to download file: {}", e)))?;
    let status = response.status();
    log::debug!("GET {} -> {}", url, status);

    let outcome = DownloadOutcome::from_status(status, 0);
    if !outcome.is_downloaded() {
        progress_bar.finish_and_clear();
        return Ok(outcome);
    }

    let total_size = response.content_length().unwrap_or(0);
    if total_size > 0 {
        progress_bar.set_length(total_size);
        progress_bar.set_style(
            ProgressStyle::with_template(
                "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {eta}",
            )
            .unwrap()
            .progress_chars("=> "),
        );
    }

    let mut file = File::create(file_path)
        .with_context(|| format!("Failed to create {}", file_path.display()))?;
    let written = write_chunks(response, &mut file, &progress_bar).await;
    drop(file);
    progress_bar.finish_and_clear();

    match written {
        Ok(downloaded) => {
            log::info!("Downloaded {} bytes to {}", downloaded, file_path.display());
            Ok(DownloadOutcome::Downloaded { bytes: downloaded })
        }
        Err(e) => {
            if let Err(remove_error) = fs::remove_file(file_path) {
                log::warn!("Could not remove {}: {}", file_path.display(), remove_error);
            }
            Err(e)
        }
    }
}

async fn write_chunks(
    response: reqwest::Response,
    file: &mut File,
    progress_bar: &ProgressBar,
) -> Result<u64> {
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| Error::msg(format!("Error reading chunk: {}", e)))?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        progress_bar.set_position(downloaded);
    }

    Ok(downloaded)
}

/// Returns the last path segment of a URL.
pub fn file_name_from_url(url: &str) -> Option<&str> {
    url.rsplit('/').next().filter(|name| !name.is_empty())
}

// -- Tests -------------------------------------------------------------------
