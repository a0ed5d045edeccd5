//! The hearth CLI binary.

use anyhow::Context;
use clap::Parser;
use hearth::cli::{HearthArgs, execute_command};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let args = HearthArgs::parse();

    // RUST_LOG wins over the verbosity flags.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level())))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    execute_command(&args).with_context(|| format!("hearth {} failed", command_name(&args)))
}

fn command_name(args: &HearthArgs) -> &'static str {
    use hearth::cli::Command;

    match args.command {
        Command::Search(_) => "search",
        Command::Filter(_) => "filter",
        Command::Autocomplete(_) => "autocomplete",
        Command::Spellcheck(_) => "spellcheck",
        Command::Stats => "stats",
    }
}
