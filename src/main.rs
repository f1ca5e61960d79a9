use clap::{Parser, Subcommand};

mod cli;
mod config;
mod core;
mod error;
mod signal_handler;
mod utils;

use config::Config;
use error::Result;

#[derive(Parser)]
#[command(name = "mxlrc")]
#[command(about = "Command-line utility for downloading Musixmatch lyrics as LRC files")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file path (optional)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch lyrics for a single track
    Fetch(cli::fetch::FetchArgs),

    /// Download lyrics for every audio file in a directory
    Dir(cli::dir::DirArgs),

    /// Manage the Musixmatch user token
    Token(cli::token::TokenArgs),

    /// Show configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    utils::logging::init_logging(cli.verbose).map_err(error::MxLrcError::Internal)?;

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Fetch(args) => cli::fetch::execute(args, &config).await,
        Commands::Dir(args) => cli::dir::execute(args, &config).await,
        Commands::Token(args) => cli::token::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, &config).await,
    }
}
