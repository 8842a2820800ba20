//! The NEON object listing (`listing.csv`) and evaluation-file selection.

use std::{collections::BTreeMap, io::Read, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::download::file_name_from_url;

pub const LISTING_URL: &str = "https://storage.neonscience.org/neon-ncar/listing.csv";

/// One row of the listing. Columns other than these two are ignored.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ListingEntry {
    pub object: String,
    pub last_modified: String,
}

/// Evaluation files for one site, keyed by remote object URL.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EvalFiles {
    pub site: String,
    pub files: BTreeMap<String, String>,
}

impl EvalFiles {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Objects whose file name matches `year`, or all of them for `None`.
    pub fn for_year<'a>(&'a self, year: Option<&'a str>) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.files.keys().filter_map(move |object| {
            let name = file_name_from_url(object)?;
            match year {
                Some(year) if !name.contains(year) => None,
                _ => Some((object.as_str(), name)),
            }
        })
    }
}

/// Reads listing rows from any CSV source with a header line.
pub fn read_listing<R: Read>(reader: R) -> Result<Vec<ListingEntry>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut entries = Vec::new();

    for record in csv_reader.deserialize() {
        let entry: ListingEntry = record.context("Malformed row in listing")?;
        entries.push(entry);
    }

    Ok(entries)
}

pub fn read_listing_file(path: &Path) -> Result<Vec<ListingEntry>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open listing {}", path.display()))?;
    read_listing(file)
}

/// Keeps the rows whose object contains `<site>_eval`.
pub fn filter_site(entries: Vec<ListingEntry>, site: &str) -> EvalFiles {
    let pattern = format!("{}_eval", site);
    let files = entries
        .into_iter()
        .filter(|entry| entry.object.contains(&pattern))
        .map(|entry| (entry.object, entry.last_modified))
        .collect();

    EvalFiles {
        site: site.to_string(),
        files,
    }
}

// -- Tests -------------------------------------------------------------------
