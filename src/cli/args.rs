//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::{net::IpAddr, path::PathBuf};

/// Serve assets transformed on the fly behind a stable URL scheme
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Config file path (default: assetwarp.toml)
    #[arg(short = 'C', long, global = true, default_value = "assetwarp.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve static files with asset transformation
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory of static files (relative to the config file)
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        root: Option<PathBuf>,
    },

    /// Show which target and profile a request path resolves to
    #[command(visible_alias = "r")]
    Resolve {
        /// Request path, e.g. /a/images/42/thumb
        path: String,

        /// Host header used for same-origin targets
        #[arg(long, default_value = "localhost")]
        host: String,
    },

    /// Validate the config and list sources and profiles
    #[command(visible_alias = "c")]
    Check,
}
