//! Command-line interface implementation for prept.
//! Provides argument parsing and help text formatting using clap.

use crate::constants::HOME_ENV;
use clap::{error::ErrorKind, ArgAction, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments structure for prept.
#[derive(Parser, Debug)]
#[command(author, version, about = "prept: generate projects from reusable boilerplates", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Installation root for boilerplates and provider modules
    #[arg(long, global = true, value_name = "DIR", env = HOME_ENV)]
    pub home: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bootstrap a project from a boilerplate
    New {
        /// Name of an installed boilerplate or path to a boilerplate directory
        #[arg(value_name = "BOILERPLATE")]
        boilerplate: String,

        /// Directory the project is generated in.
        /// Defaults to the boilerplate's default_generate_directory, or its name.
        #[arg(short = 'O', long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Template variable as a name/value pair, may be repeated
        #[arg(short = 'V', long = "var", num_args = 2, value_names = ["NAME", "VALUE"], action = ArgAction::Append)]
        var: Vec<String>,

        /// Overwrite an existing output directory without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Install a boilerplate globally
    Install {
        /// Path to the boilerplate directory
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Overwrite an existing installation without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Create a boilerplate configuration
    Init {
        /// Boilerplate directory, created if missing
        #[arg(value_name = "PATH", default_value = ".")]
        path: PathBuf,

        /// Boilerplate name
        #[arg(short, long)]
        name: String,

        /// Short description of the boilerplate
        #[arg(short, long)]
        summary: Option<String>,
    },
}

/// Groups the flat `--var NAME VALUE` values into pairs.
pub fn variable_pairs(values: &[String]) -> Vec<(String, String)> {
    values.chunks_exact(2).map(|pair| (pair[0].clone(), pair[1].clone())).collect()
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 and the help text if arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if matches!(
                e.kind(),
                ErrorKind::MissingRequiredArgument
                    | ErrorKind::MissingSubcommand
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) {
                let _ = Args::command().print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
