//! Command line interface.

pub mod command;

use std::{path::PathBuf, time::Duration};

use clap::{command, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    listing::LISTING_URL,
    simulation::{SoilVariable, Stream, TimeFix},
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Plot a soil variable against depth and time from every record
    QuickProfile {
        #[command(flatten)]
        sim: SimulationArgs,
    },
    /// Contour plot of one mid-day record per file for a NEON site
    ProfileTimeseries {
        #[command(flatten)]
        sim: SimulationArgs,
        /// Four character NEON site code, used in the title
        #[arg(long)]
        site: String,
        /// Record taken from each daily file
        #[arg(long, default_value_t = 24)]
        snapshot_index: usize,
    },
    /// List the evaluation files available for a NEON site
    ListEval {
        #[arg(long)]
        site: String,
        #[arg(long, default_value = LISTING_URL)]
        listing_url: String,
    },
    /// Download the evaluation files for a NEON site
    DownloadEval {
        #[arg(long)]
        site: String,
        /// Directory receiving a sub-directory per site [default: ~/neon-eval]
        #[arg(long)]
        eval_dir: Option<PathBuf>,
        /// Only files whose name contains this year [default: all]
        #[arg(long)]
        year: Option<String>,
        #[arg(long, default_value = LISTING_URL)]
        listing_url: String,
    },
}

/// Locates and reads simulation output.
#[derive(clap::Args, Debug, Clone)]
pub struct SimulationArgs {
    /// Directory holding the simulation history files
    #[arg(long)]
    pub sim_path: PathBuf,
    /// CTSM case name, the prefix of each history file
    #[arg(long = "case")]
    pub case_name: String,
    /// Soil variable to plot, TSOI or H2OSOI
    #[arg(long, value_parser = parse_variable)]
    pub var: SoilVariable,
    #[arg(long)]
    pub year: i32,
    #[arg(long, value_enum, default_value_t = Stream::H1)]
    pub stream: Stream,
    /// Timestamp repair applied to each file before merging
    #[arg(long, value_enum, default_value_t = TimeFix::None)]
    pub fix_time: TimeFix,
    /// PNG file to write [default: <case>-<var>-<year>.png]
    #[arg(long)]
    pub output: Option<PathBuf>,
}

fn parse_variable(name: &str) -> Result<SoilVariable, String> {
    SoilVariable::from_name(name)
        .ok_or_else(|| "Please choose either TSOI or H2OSOI for plotting.".to_string())
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> ProgressBar {
    ProgressBar::new(size).with_message(message).with_style(
        ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {msg}")
            .unwrap()
            .progress_chars("##-"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_timeseries_command() {
        let cli = Cli::try_parse_from([
            "ctsm-neon",
            "profile-timeseries",
            "--sim-path",
            "/data/archive",
            "--case",
            "ABBY.transient",
            "--var",
            "H2OSOI",
            "--year",
            "2018",
            "--site",
            "ABBY",
        ])
        .unwrap();

        match cli.command {
            Commands::ProfileTimeseries {
                sim,
                site,
                snapshot_index,
            } => {
                assert_eq!(sim.var, SoilVariable::H2osoi);
                assert_eq!(sim.stream, Stream::H1);
                assert_eq!(sim.fix_time, TimeFix::None);
                assert_eq!(site, "ABBY");
                assert_eq!(snapshot_index, 24);
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn should_reject_unsupported_variable() {
        let result = Cli::try_parse_from([
            "ctsm-neon",
            "quick-profile",
            "--sim-path",
            ".",
            "--case",
            "c",
            "--var",
            "QRUNOFF",
            "--year",
            "2018",
        ]);

        let message = result.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(message.contains("Please choose either TSOI or H2OSOI for plotting."));
        assert!(message.contains("QRUNOFF"));
    }

    #[test]
    fn should_default_listing_url() {
        let cli = Cli::try_parse_from(["ctsm-neon", "download-eval", "--site", "BART", "--year", "2019"])
            .unwrap();

        match cli.command {
            Commands::DownloadEval {
                site,
                eval_dir,
                year,
                listing_url,
            } => {
                assert_eq!(site, "BART");
                assert!(eval_dir.is_none());
                assert_eq!(year.as_deref(), Some("2019"));
                assert_eq!(listing_url, LISTING_URL);
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn should_parse_fix_time_and_stream() {
        let cli = Cli::try_parse_from([
            "ctsm-neon",
            "quick-profile",
            "--sim-path",
            ".",
            "--case",
            "c",
            "--var",
            "TSOI",
            "--year",
            "2018",
            "--stream",
            "h0",
            "--fix-time",
            "monthly",
        ])
        .unwrap();

        match cli.command {
            Commands::QuickProfile { sim } => {
                assert_eq!(sim.stream, Stream::H0);
                assert_eq!(sim.fix_time, TimeFix::Monthly);
            }
            _ => panic!("wrong command"),
        }
    }
}
