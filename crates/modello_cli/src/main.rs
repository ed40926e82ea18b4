//! modello - solve symbolic models from the command line.
//!
//! ```text
//! modello check demos/geometry.mdl
//! modello solve demos/geometry.mdl --model Line --name L \
//!     --set start.x=0 --set start.y=0 --set end.x=3 --set end.y=4
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod format;
mod json_types;

use commands::check::CheckArgs;
use commands::solve::SolveArgs;
use config::{ModelloConfig, OutputFormat};
use json_types::ErrorJsonOutput;

#[derive(Parser, Debug)]
#[command(name = "modello", version, about = "Solve symbolic models")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (default: ./modello.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More logging on stderr: -v debug, -vv trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build every model of a document and list attributes and constraints
    Check(CheckArgs),
    /// Instantiate a model and print its solved attributes
    Solve(SolveArgs),
}

impl Command {
    fn format(&self) -> Option<OutputFormat> {
        match self {
            Command::Check(args) => args.format,
            Command::Solve(args) => args.format,
        }
    }
}

/// `MODELLO_LOG`, then `RUST_LOG`, then the `-v` level.
fn init_logger(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "warn,modello=debug,modello_solver=debug,modello_cli=debug",
        _ => "debug,modello=trace,modello_solver=trace,modello_math=trace",
    };
    let filter = EnvFilter::try_from_env("MODELLO_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
}

fn fail(format: OutputFormat, err: &anyhow::Error) -> ExitCode {
    match format {
        OutputFormat::Json => {
            let out = ErrorJsonOutput::new(format!("{:#}", err));
            match commands::to_json(&out) {
                Ok(json) => print!("{}", json),
                Err(_) => eprintln!("error: {:#}", err),
            }
        }
        OutputFormat::Text => eprintln!("error: {:#}", err),
    }
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = match ModelloConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => return fail(cli.command.format().unwrap_or_default(), &err),
    };
    let format = cli.command.format().unwrap_or(config.format);

    let result = match &cli.command {
        Command::Check(args) => commands::check::run(args, &config, format),
        Command::Solve(args) => commands::solve::run(args, &config, format),
    };
    match result {
        Ok(out) => {
            print!("{}", out);
            ExitCode::SUCCESS
        }
        Err(err) => fail(format, &err),
    }
}
