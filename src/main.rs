// src/main.rs

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use pacbundle::commands::{self, Outcome, Session};
use pacbundle::config::{self, Config};
use pacbundle::exec::{self, SystemRunner};
use pacbundle::{output, pacman};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "pacbundle")]
#[command(author, version, about = "A declarative pacman wrapper", long_about = None)]
struct Cli {
    /// Print every command before running it
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print commands instead of running them
    #[arg(short = 'n', long, global = true)]
    dry_run: bool,

    /// Do not ask for confirmation
    #[arg(long, global = true)]
    no_confirm: bool,

    /// Config file (default: $PACBUNDLE_CONFIG or ~/.config/pacbundle/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the bundles in the configuration file
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Compare the packages of included bundles with those installed on the system
    Compare {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Sync the system installation with the included bundles
    Sync,
    /// Install a bundle
    Install {
        /// Name of the bundle
        name: String,
    },
    /// Edit the config file
    Config,
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn config_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => config::default_config_path().context("cannot determine the config directory"),
    }
}

fn run(cli: Cli) -> Result<Outcome> {
    let Some(command) = &cli.command else {
        // No command provided, show help
        println!("pacbundle v{}", env!("CARGO_PKG_VERSION"));
        println!("Run 'pacbundle --help' for usage information");
        return Ok(Outcome::Success);
    };

    match command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "pacbundle", &mut io::stdout());
            return Ok(Outcome::Success);
        }
        Commands::Config => {
            let path = config_path(&cli)?;
            info!("Editing config file: {}", path.display());
            let editor = std::env::var("EDITOR").ok();
            commands::edit_config(&path, editor.as_deref(), &mut io::stdout())?;
            return Ok(Outcome::Success);
        }
        _ => {}
    }

    let path = config_path(&cli)?;
    let config = Config::load(&path)?;
    debug!("Using {:?} backend", config.settings.backend);

    let db = pacman::open(&config.settings);
    let runner = SystemRunner::new(cli.dry_run, cli.verbose);
    let session = Session {
        config: &config,
        db: db.as_ref(),
        runner: &runner,
        confirm: &exec::confirm,
        no_confirm: cli.no_confirm,
        width: output::terminal_width(),
    };

    let mut stdout = io::stdout().lock();
    let outcome = match command {
        Commands::List { json } => session.list(&mut stdout, *json)?,
        Commands::Compare { json } => session.compare(&mut stdout, *json)?,
        Commands::Sync => session.sync(&mut stdout)?,
        Commands::Install { name } => session.install(name, &mut stdout)?,
        Commands::Config | Commands::Completions { .. } => Outcome::Success,
    };
    Ok(outcome)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    output::init_styling();

    match run(cli) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            eprintln!("{}", output::red(format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}
