use clap::{Parser, Subcommand};
use colored::*;
use std::io;
use std::path::PathBuf;
use tickpid_core::params::DEFAULT_PARAMS_PATH;
use tickpid_manager::commands::{self, run::RunOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tickpid")]
#[command(about = "Discrete PID controller: replay error samples and manage gains")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed error samples through the controller and print each output
    Run {
        /// Sample file, one `error` or `error,delta_t` per line (default: stdin)
        input: Option<PathBuf>,

        /// Parameter file (default: .tickpid/params.yaml, or built-in defaults)
        #[arg(short = 'p', long = "params")]
        params: Option<PathBuf>,

        /// Proportional gain override
        #[arg(long, allow_negative_numbers = true)]
        kp: Option<f64>,

        /// Integral gain override
        #[arg(long, allow_negative_numbers = true)]
        ki: Option<f64>,

        /// Derivative gain override
        #[arg(long, allow_negative_numbers = true)]
        kd: Option<f64>,

        /// Time step for samples without one (seconds)
        #[arg(long)]
        dt: Option<f64>,

        /// Emit one JSON object per output
        #[arg(long)]
        json: bool,
    },

    /// Inspect or edit runtime parameters
    Params {
        /// Parameter file
        #[arg(short = 'f', long = "file", global = true, default_value = DEFAULT_PARAMS_PATH)]
        file: PathBuf,

        #[command(subcommand)]
        command: ParamsCommands,
    },
}

#[derive(Subcommand)]
enum ParamsCommands {
    /// List all parameters
    List,
    /// Print one parameter
    Get {
        key: String,
    },
    /// Set a parameter (numbers and booleans are stored as such)
    Set {
        key: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Restore default parameters
    Reset,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tickpid=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run_command(cli.command) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_command(command: Commands) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();

    match command {
        Commands::Run {
            input,
            params,
            kp,
            ki,
            kd,
            dt,
            json,
        } => {
            let options = RunOptions {
                input,
                params,
                kp,
                ki,
                kd,
                dt,
                json,
            };
            commands::run::run(&options, &mut stdout)?;
            Ok(())
        }

        Commands::Params { file, command } => match command {
            ParamsCommands::List => commands::params::list(&file, &mut stdout),
            ParamsCommands::Get { key } => commands::params::get(&file, &key, &mut stdout),
            ParamsCommands::Set { key, value } => commands::params::set(&file, &key, &value),
            ParamsCommands::Reset => commands::params::reset(&file),
        },
    }
}
