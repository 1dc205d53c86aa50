//! AssetWarp - serve assets transformed on the fly.

use anyhow::Result;
use assetwarp::{
    cli::{self, Cli, Commands},
    config::WarpConfig,
    logger, serve,
};
use clap::{ColorChoice, Parser};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    serve::lifecycle::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = WarpConfig::load(&cli)?;

    match &cli.command {
        Commands::Serve { .. } => cli::serve::serve_site(&config),
        Commands::Resolve { path, host } => cli::resolve::run_resolve(path, host, &config),
        Commands::Check => cli::check::run_check(&config),
    }
}
