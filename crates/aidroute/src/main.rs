mod cli;
mod commands;
mod scenario;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan { scenario, json } => commands::plan::run(&scenario, json),
        Commands::Apply {
            scenario,
            no_record,
        } => commands::apply::run(&scenario, !no_record),
        Commands::History {
            stats,
            scenario,
            hours,
            limit,
        } => commands::history::run(stats, scenario.as_deref(), hours, limit),
        Commands::Version => commands::version::run(),
    }
}
