//! PCDD/F emission models
//!
//! # Usage
//!
//! ```bash
//! # Run the whole device chain of the profile model
//! pcddf profile --config config.toml
//!
//! # Rerun only stage 2 from the persisted output of stage 1
//! pcddf profile --config config.toml --stage 2
//!
//! # Yearly stack emission
//! pcddf quantity --config config.toml
//! ```
//!
//! Logging is controlled with `RUST_LOG`. `--verbose` lowers the default level to `debug`.

use clap::{Parser, Subcommand};
use log::error;
use pcddf::components::{ProfileModel, QuantityModel};
use pcddf::config::ConfigFile;
use pcddf::errors::PcddfResult;
use std::path::PathBuf;
use std::process;

/// PCDD/F emission models for waste incineration
#[derive(Parser, Debug)]
#[command(name = "pcddf")]
#[command(about = "Estimate PCDD/F emission profiles and quantities from waste incineration")]
struct Args {
    /// Log intermediate results
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Follow the congener profile through the chain of abatement devices
    Profile {
        /// Configuration file
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,

        /// Only rerun this stage, starting from the persisted output of the previous stage
        #[arg(short, long)]
        stage: Option<usize>,
    },
    /// Estimate the yearly stack emission from combustion kinetics
    Quantity {
        /// Configuration file
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
}

fn run(command: Command) -> PcddfResult<()> {
    match command {
        Command::Profile { config, stage } => {
            let config = ConfigFile::from_path(&config)?.profile_model()?;
            let model = ProfileModel::from_config(&config);
            match stage {
                Some(stage) => {
                    model.run_stage(stage)?;
                }
                None => {
                    model.run()?;
                }
            }
        }
        Command::Quantity { config } => {
            let config = ConfigFile::from_path(&config)?.quantity_model()?;
            QuantityModel::from_config(&config)?.run()?;
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(args.command) {
        error!("{}", e);
        process::exit(1);
    }
}
