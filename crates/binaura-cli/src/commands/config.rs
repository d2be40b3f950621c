//! Configuration file commands.

use binaura_analysis::AnalysisConfig;
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Show or check analysis configuration.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print a configuration as TOML (defaults when no file is given)
    Show {
        /// Configuration file to merge over the defaults
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Parse and validate a configuration file
    Check {
        /// Configuration file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// Run the config command.
pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show { file } => {
            let config = match file {
                Some(path) => AnalysisConfig::load(path)?,
                None => AnalysisConfig::default(),
            };
            print!("{}", config.to_toml()?);
        }
        ConfigCommand::Check { file } => {
            let config = AnalysisConfig::load(&file)?;
            config.validate()?;
            println!("{}: OK", file.display());
        }
    }
    Ok(())
}
