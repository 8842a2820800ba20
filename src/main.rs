mod cli;
mod download;
mod listing;
mod plot;
mod simulation;

use anyhow::{Error, Result};
use clap::Parser;
use cli::{command, Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::QuickProfile { sim } => match command::quick_profile(sim) {
            Ok(filename) => println!("Plot saved to `{}`", filename),
            Err(e) => eprintln!("Error: {:#}", e),
        },
        Commands::ProfileTimeseries {
            sim,
            site,
            snapshot_index,
        } => match command::profile_timeseries(sim, site, *snapshot_index) {
            Ok(filename) => println!("Plot saved to `{}`", filename),
            Err(e) => eprintln!("Error: {:#}", e),
        },
        Commands::ListEval { site, listing_url } => {
            match command::list_eval(site, listing_url).await {
                Ok(summary) => println!("{}", summary),
                Err(e) => eprintln!("Error: {:#}", e),
            }
        }
        Commands::DownloadEval {
            site,
            eval_dir,
            year,
            listing_url,
        } => match command::download_eval(site, eval_dir.clone(), year.as_deref(), listing_url)
            .await
        {
            Ok(summary) => println!("{}", summary),
            Err(e) => eprintln!("Error: {:#}", e),
        },
    }

    Ok(())
}
