use std::{path::PathBuf, time::Instant};

use anyhow::Result;

use crate::{
    cli::SimulationArgs,
    plot::{quick_profile_figure, timeseries_figure, Figure},
    simulation::{find_simulation_files, load_profile, FilePattern, LoadMode, SoilProfile},
};

use super::make_plot_file_name;

pub fn quick_profile(sim: &SimulationArgs) -> Result<String> {
    let profile = load_selected(sim, LoadMode::AllRecords)?;
    let figure = quick_profile_figure(&profile)?;

    save(sim, &figure)
}

pub fn profile_timeseries(
    sim: &SimulationArgs,
    neon_site: &str,
    snapshot_index: usize,
) -> Result<String> {
    let start = Instant::now();

    let profile = load_selected(sim, LoadMode::Snapshot(snapshot_index))?;
    let figure = timeseries_figure(&profile, neon_site)?;
    let file_name = save(sim, &figure)?;

    println!(
        "Making this plot took {:.3} s.",
        start.elapsed().as_secs_f64()
    );

    Ok(file_name)
}

fn load_selected(sim: &SimulationArgs, mode: LoadMode) -> Result<SoilProfile> {
    let pattern = FilePattern::new(&sim.case_name, sim.stream, sim.year);
    let files = find_simulation_files(&sim.sim_path, &pattern)?;
    println!("All Simulation files: [ {} files]", files.len());

    let profile = load_profile(&files, sim.var, mode, sim.fix_time)?;

    Ok(profile.select_levels(sim.var.level_range()))
}

fn output_path(sim: &SimulationArgs) -> PathBuf {
    sim.output
        .clone()
        .unwrap_or_else(|| make_plot_file_name(&sim.case_name, sim.var, sim.year))
}

fn save(sim: &SimulationArgs, figure: &Figure) -> Result<String> {
    let path = output_path(sim);
    figure.save(&path)?;
    log::debug!("Saved '{}' to {}", figure.title, path.display());

    Ok(path.to_string_lossy().to_string())
}

// -- Tests -------------------------------------------------------------------
