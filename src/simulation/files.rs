//! Locates CTSM history files by case, stream and year.

use std::{
    fmt,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;

/// CTSM history stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Stream {
    /// Monthly averages
    H0,
    /// High-frequency output
    H1,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::H0 => write!(f, "h0"),
            Stream::H1 => write!(f, "h1"),
        }
    }
}

/// Naming convention `<case>.<stream>.<year>*.nc`.
#[derive(Debug, Clone)]
pub struct FilePattern {
    pub case_name: String,
    pub stream: Stream,
    pub year: i32,
}

impl FilePattern {
    pub fn new(case_name: &str, stream: Stream, year: i32) -> Self {
        FilePattern {
            case_name: case_name.to_string(),
            stream,
            year,
        }
    }

    fn prefix(&self) -> String {
        format!("{}.{}.{}", self.case_name, self.stream, self.year)
    }

    pub fn matches(&self, file_name: &str) -> bool {
        file_name.starts_with(&self.prefix()) && file_name.ends_with(".nc")
    }
}

impl fmt::Display for FilePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}*.nc", self.prefix())
    }
}

/// Returns the sorted simulation files in `sim_path` that match `pattern`.
pub fn find_simulation_files(sim_path: &Path, pattern: &FilePattern) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(sim_path)
        .with_context(|| format!("Failed to read simulation directory {}", sim_path.display()))?
    {
        let path = entry?.path();
        let matched = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| pattern.matches(name));

        if matched && path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(anyhow!(
            "No simulation files matching {} in {}",
            pattern,
            sim_path.display()
        ));
    }

    files.sort();

    Ok(files)
}

// -- Tests -------------------------------------------------------------------
