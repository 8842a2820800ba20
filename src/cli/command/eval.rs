//! List and download NEON evaluation files.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::{
    cli::create_spinner,
    download::{download_file, download_file_with_progress, file_name_from_url, DownloadOutcome},
    listing::{filter_site, read_listing_file, EvalFiles},
};

use super::default_eval_dir;

/// Counts of downloaded and unavailable evaluation files.
#[derive(Debug, Default, PartialEq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub unavailable: usize,
}

pub async fn list_eval(site: &str, listing_url: &str) -> Result<String> {
    let eval_files = list_neon_eval_files(site, listing_url).await?;

    for (object, last_modified) in &eval_files.files {
        println!("{}  {}", last_modified, object);
    }

    Ok(format!(
        "{} evaluation files available for {}",
        eval_files.len(),
        site
    ))
}

pub async fn download_eval(
    site: &str,
    eval_dir: Option<PathBuf>,
    year: Option<&str>,
    listing_url: &str,
) -> Result<String> {
    match year {
        None => println!("Downloading all available evaluation files for {}.", site),
        Some(year) => println!(
            "Downloading evaluation files for {} for year {}.",
            site, year
        ),
    }

    let eval_dir = match eval_dir {
        Some(dir) => dir,
        None => default_eval_dir()?,
    };
    let site_dir = make_site_dir(&eval_dir, site)?;

    let eval_files = list_neon_eval_files(site, listing_url).await?;
    let summary = download_selected(&eval_files, year, &site_dir).await?;

    Ok(format!(
        "{} files saved to `{}`, {} unavailable",
        summary.downloaded,
        site_dir.display(),
        summary.unavailable
    ))
}

/// Fetches the listing and keeps the evaluation files of `site`.
pub async fn list_neon_eval_files(site: &str, listing_url: &str) -> Result<EvalFiles> {
    let tmp_dir = TempDir::new()?;
    let file_name = file_name_from_url(listing_url).unwrap_or("listing.csv");
    let listing_path = tmp_dir.path().join(file_name);

    let bar = create_spinner("Downloading listing...".to_string());
    let outcome = download_file(listing_url, &listing_path).await?;
    bar.finish_with_message("Listing downloaded");

    if !outcome.is_downloaded() {
        anyhow::bail!("{}", outcome.message(listing_url, &listing_path));
    }

    let entries = read_listing_file(&listing_path)?;
    log::debug!("Listing has {} rows", entries.len());

    Ok(filter_site(entries, site))
}

/// Creates `eval_dir/<site>` and any missing parents.
fn make_site_dir(eval_dir: &Path, site: &str) -> Result<PathBuf> {
    let site_dir = eval_dir.join(site);
    fs::create_dir_all(&site_dir)
        .with_context(|| format!("Failed to create {}", site_dir.display()))?;

    Ok(site_dir)
}

async fn download_selected(
    eval_files: &EvalFiles,
    year: Option<&str>,
    site_dir: &Path,
) -> Result<DownloadSummary> {
    let mut summary = DownloadSummary::default();

    for (object, name) in eval_files.for_year(year) {
        let file_path = site_dir.join(name);
        let bar = create_spinner(format!("Downloading {}", name));
        let outcome = download_file_with_progress(object, &file_path, bar).await?;
        println!("{}", outcome.message(object, &file_path));

        match outcome {
            DownloadOutcome::Downloaded { .. } => summary.downloaded += 1,
            _ => summary.unavailable += 1,
        }
    }

    Ok(summary)
}

// -- Tests -------------------------------------------------------------------
