//! auv CLI - run a command against an overlay of the live root, then atomically
//! swap its changes into place

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

use auv::ops::{run, RunPlan};
use auv::{Config, LogLevel, Phases, RootFailurePolicy};

#[derive(Parser)]
#[command(name = "auv")]
#[command(about = "atomic update of live filesystem subtrees through overlayfs")]
#[command(version)]
struct Cli {
    /// run apply, commit and finalize (the default)
    #[arg(long)]
    all: bool,

    /// build the staging trees from the command's changes
    #[arg(long)]
    apply: bool,

    /// exchange the staging trees with the live roots
    #[arg(long)]
    commit: bool,

    /// collapse the sentinel symlinks left by commit
    #[arg(long)]
    finalize: bool,

    /// trace, debug, info, warn, error or fatal
    #[arg(long, value_name = "LEVEL", value_parser = parse_log_level)]
    loglevel: Option<LogLevel>,

    /// config file (toml)
    #[arg(short, long, env = "AUV_CONFIG")]
    config: Option<PathBuf>,

    /// stop at the first mapped root that fails
    #[arg(long)]
    fail_fast: bool,

    /// command to run inside the overlay, with its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    command: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let plan = match build_plan(cli) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(plan.config.log_level.as_tracing())
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: failed to set up logging: {}", e);
    }

    match run(&plan) {
        Ok(reports) => {
            let done = reports.iter().filter(|r| !r.skipped).count();
            tracing::info!("reconciled {} of {} mapped roots", done, reports.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn build_plan(cli: Cli) -> auv::Result<RunPlan> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(level) = cli.loglevel {
        config.log_level = level;
    }
    if cli.fail_fast {
        config.on_root_failure = RootFailurePolicy::Abort;
    }

    Ok(RunPlan {
        config,
        phases: Phases::from_flags(cli.all, cli.apply, cli.commit, cli.finalize),
        command: cli.command,
    })
}

fn parse_log_level(s: &str) -> Result<LogLevel, String> {
    match s.to_lowercase().as_str() {
        "trace" => Ok(LogLevel::Trace),
        "debug" => Ok(LogLevel::Debug),
        "info" => Ok(LogLevel::Info),
        "warn" => Ok(LogLevel::Warn),
        "error" => Ok(LogLevel::Error),
        "fatal" => Ok(LogLevel::Fatal),
        _ => Err(format!("invalid log level: {}", s)),
    }
}
