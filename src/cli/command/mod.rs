pub mod eval;
pub mod profile;

use std::path::PathBuf;

use anyhow::{anyhow, Result};

pub use eval::{download_eval, list_eval};
pub use profile::{profile_timeseries, quick_profile};

use crate::simulation::SoilVariable;

pub fn make_plot_file_name(case_name: &str, variable: SoilVariable, year: i32) -> PathBuf {
    PathBuf::from(format!("{}-{}-{}.png", case_name, variable, year))
}

pub fn default_eval_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join("neon-eval"))
        .ok_or_else(|| anyhow!("Could not determine the home directory, pass --eval-dir"))
}
