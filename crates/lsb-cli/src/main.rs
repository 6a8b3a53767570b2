use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod chart;
mod commands;
mod feed;
mod position;

#[derive(Parser)]
#[command(name = "lsb")]
#[command(about = "Lua strategy bridge CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a strategy script over a CSV tick feed and print a run report
    Run {
        /// Strategy script. Also supplies the config globals unless --config is given.
        #[arg(long)]
        script: String,

        /// Config script executed against the same session before the run.
        #[arg(long)]
        config: Option<String>,

        /// Override MAX_TICKS from the config.
        #[arg(long)]
        ticks: Option<i64>,
    },

    /// Load a strategy script and verify it defines a callable tick handler
    Check {
        /// Strategy script path
        #[arg(long)]
        script: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Run {
            script,
            config,
            ticks,
        } => commands::run(&script, config.as_deref(), ticks),
        Commands::Check { script } => commands::check(&script),
    }
}
