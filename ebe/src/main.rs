//! Stage files for an external binary, run it, and collect its outputs.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use ebe::exit_codes;
use ebe::io::config::{DEFAULT_CONFIG_FILE, EbeConfig, load_config, write_config};
use ebe::logging;
use ebe::run::run_tokens;

#[derive(Parser)]
#[command(
    name = "ebe",
    version,
    about = "Stage files for an external binary and run it"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the default config file if missing.
    Init {
        /// Overwrite an existing config file.
        #[arg(short, long)]
        force: bool,
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
    /// Run a command line; `in:PATH` and `out:PATH` tokens become staged files.
    Run {
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
        /// Directory for staged files (overrides `tmp_root`).
        #[arg(long)]
        tmp_dir: Option<PathBuf>,
        /// Do not warn when the command fails.
        #[arg(long)]
        no_warn: bool,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        tokens: Vec<String>,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::STAGING_FAILED);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force, config } => cmd_init(&config, force),
        Command::Run {
            config,
            tmp_dir,
            no_warn,
            tokens,
        } => cmd_run(&config, tmp_dir, no_warn, &tokens),
    }
}

fn cmd_init(path: &Path, force: bool) -> Result<i32> {
    if force || !path.exists() {
        write_config(path, &EbeConfig::default())?;
    }
    Ok(exit_codes::OK)
}

fn cmd_run(path: &Path, tmp_dir: Option<PathBuf>, no_warn: bool, tokens: &[String]) -> Result<i32> {
    let mut config = load_config(path)?;
    if tmp_dir.is_some() {
        config.tmp_root = tmp_dir;
    }
    if no_warn {
        config.warn_on_failure = false;
    }
    config.validate()?;

    let outcome = run_tokens(tokens, &config)?;
    Ok(exit_codes::from_status(outcome.status))
}
