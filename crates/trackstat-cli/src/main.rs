use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;

/// Initialize logging to stderr; `--verbose` raises the default level to debug
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);
    commands::execute(args.command)
}
