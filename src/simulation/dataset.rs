//! Reads a soil variable from a set of history files and merges it along time.

use std::{ops::Range, path::Path, path::PathBuf, time::Instant};

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use ndarray::{concatenate, s, Array2, ArrayD, Axis, IxDyn};
use netcdf::{AttributeValue, Variable};

use super::{time::TimeFix, time::TimeUnits, variable::SoilVariable};
use crate::cli::create_progress_bar;

/// Land grid cell read from every file.
const COLUMN: usize = 0;

/// Which time records to take from each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    AllRecords,
    /// A single record per file, by index.
    Snapshot(usize),
}

/// A soil variable over time and depth at one grid cell.
#[derive(Debug, Clone)]
pub struct SoilProfile {
    pub variable: SoilVariable,
    pub times: Vec<NaiveDateTime>,
    /// Depth of each level in metres, positive downwards.
    pub depths: Vec<f64>,
    /// `time × level`
    pub values: Array2<f32>,
}

impl SoilProfile {
    /// Keeps the levels in `range`, clamped to the levels present.
    pub fn select_levels(&self, range: Range<usize>) -> SoilProfile {
        let end = range.end.min(self.depths.len());
        let start = range.start.min(end);

        SoilProfile {
            variable: self.variable,
            times: self.times.clone(),
            depths: self.depths[start..end].to_vec(),
            values: self.values.slice(s![.., start..end]).to_owned(),
        }
    }

    /// `level × time`, the orientation profile plots are drawn in.
    pub fn depth_by_time(&self) -> Array2<f32> {
        self.values.t().to_owned()
    }

    pub fn map_values(&self, f: impl Fn(f32) -> f32) -> SoilProfile {
        SoilProfile {
            values: self.values.mapv(f),
            ..self.clone()
        }
    }
}

/// Loads `variable` from each file in order and concatenates the records.
pub fn load_profile(
    files: &[PathBuf],
    variable: SoilVariable,
    mode: LoadMode,
    time_fix: TimeFix,
) -> Result<SoilProfile> {
    if files.is_empty() {
        return Err(anyhow!("No simulation files to read"));
    }

    let start = Instant::now();
    let pb = create_progress_bar(files.len() as u64, "Reading simulation files".to_string());
    let mut parts = Vec::with_capacity(files.len());

    for file in files {
        parts.push(read_file(file, variable, mode, time_fix)?);
        pb.inc(1);
    }
    pb.finish_with_message("Simulation files read");

    let profile = merge(variable, parts)?;
    println!(
        "Reading all simulation files [ {} files] took: {:.3} s.",
        files.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(profile)
}

fn merge(variable: SoilVariable, parts: Vec<SoilProfile>) -> Result<SoilProfile> {
    let depths = parts
        .first()
        .map(|p| p.depths.clone())
        .unwrap_or_default();

    for part in &parts {
        let same = part.depths.len() == depths.len()
            && part
                .depths
                .iter()
                .zip(&depths)
                .all(|(a, b)| (a - b).abs() <= 1e-6 * b.abs().max(1.0));
        if !same {
            return Err(anyhow!(
                "Depth coordinate of {} differs between simulation files",
                variable.depth_dimension()
            ));
        }
    }

    let views: Vec<_> = parts.iter().map(|p| p.values.view()).collect();
    let values = concatenate(Axis(0), &views)?;
    let times = parts.iter().flat_map(|p| p.times.iter().copied()).collect();

    Ok(SoilProfile {
        variable,
        times,
        depths,
        values,
    })
}

fn read_file(
    path: &Path,
    variable: SoilVariable,
    mode: LoadMode,
    time_fix: TimeFix,
) -> Result<SoilProfile> {
    log::debug!("Reading {} from {}", variable, path.display());
    let file = netcdf::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let var = file
        .variable(variable.name())
        .ok_or_else(|| anyhow!("Variable '{}' not found in {}", variable, path.display()))?;
    let dim_names: Vec<String> = var.dimensions().iter().map(|d| d.name().to_string()).collect();
    let dim_lens: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

    let time_axis = dimension_index(&dim_names, "time", variable)?;
    let depth_axis = dimension_index(&dim_names, variable.depth_dimension(), variable)?;

    let times = read_times(&file, path, time_fix)?;
    let records = match mode {
        LoadMode::AllRecords => 0..dim_lens[time_axis],
        LoadMode::Snapshot(index) if index < dim_lens[time_axis] => index..index + 1,
        LoadMode::Snapshot(index) => {
            return Err(anyhow!(
                "{} has {} time records, cannot take record {}",
                path.display(),
                dim_lens[time_axis],
                index
            ))
        }
    };

    let extents: Vec<Range<usize>> = dim_lens
        .iter()
        .enumerate()
        .map(|(axis, &len)| {
            if axis == time_axis {
                records.clone()
            } else if axis == depth_axis {
                0..len
            } else {
                COLUMN..COLUMN + 1
            }
        })
        .collect();
    let raw = read_values(&var, &extents)?;

    let shape: Vec<usize> = extents.iter().map(|r| r.len()).collect();
    let array = ArrayD::from_shape_vec(IxDyn(&shape), raw)?;
    let values = Array2::from_shape_fn((shape[time_axis], shape[depth_axis]), |(t, l)| {
        let mut index = vec![0; shape.len()];
        index[time_axis] = t;
        index[depth_axis] = l;
        mask_fill(array[IxDyn(&index)])
    });

    Ok(SoilProfile {
        variable,
        times: times[records].to_vec(),
        depths: read_depths(&file, variable, dim_lens[depth_axis])?,
        values,
    })
}

fn dimension_index(dim_names: &[String], name: &str, variable: SoilVariable) -> Result<usize> {
    dim_names
        .iter()
        .position(|d| d == name)
        .ok_or_else(|| anyhow!("Dimension '{}' not found in variable '{}'", name, variable))
}

fn read_values(var: &Variable, extents: &[Range<usize>]) -> Result<Vec<f32>> {
    let values = match extents {
        [a] => var.get_values::<f32, _>(a.clone())?,
        [a, b] => var.get_values::<f32, _>((a.clone(), b.clone()))?,
        [a, b, c] => var.get_values::<f32, _>((a.clone(), b.clone(), c.clone()))?,
        [a, b, c, d] => {
            var.get_values::<f32, _>((a.clone(), b.clone(), c.clone(), d.clone()))?
        }
        _ => {
            return Err(anyhow!(
                "Unsupported number of dimensions for '{}': {}",
                var.name(),
                extents.len()
            ))
        }
    };

    Ok(values)
}

fn read_times(file: &netcdf::File, path: &Path, time_fix: TimeFix) -> Result<Vec<NaiveDateTime>> {
    let time = file
        .variable("time")
        .ok_or_else(|| anyhow!("Variable 'time' not found in {}", path.display()))?;
    let units = string_attribute(&time, "units")
        .ok_or_else(|| anyhow!("'time' in {} has no units attribute", path.display()))?;
    let calendar = string_attribute(&time, "calendar");

    let raw = time.get_values::<f64, _>(..)?;
    let decoded = TimeUnits::parse(&units, calendar.as_deref())?.decode_all(&raw)?;

    time_fix.apply(&decoded)
}

/// Depths of the first `count` levels.
///
/// CTSM files often carry no `levsoi` coordinate; soil layers share their
/// depths with the top ground levels, so `levgrnd` stands in. Without either,
/// the level index is used.
fn read_depths(file: &netcdf::File, variable: SoilVariable, count: usize) -> Result<Vec<f64>> {
    for name in [variable.depth_dimension(), "levgrnd"] {
        if let Some(coord) = file.variable(name) {
            let values = coord.get_values::<f64, _>(..)?;
            if values.len() >= count {
                return Ok(values[..count].to_vec());
            }
        }
    }

    log::warn!(
        "No depth coordinate for {}, using level indices",
        variable.depth_dimension()
    );
    Ok((0..count).map(|i| i as f64).collect())
}

fn string_attribute(var: &Variable, name: &str) -> Option<String> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

fn mask_fill(value: f32) -> f32 {
    if value.is_finite() && value.abs() < 1.0e30 {
        value
    } else {
        f32::NAN
    }
}

// -- Tests -------------------------------------------------------------------
