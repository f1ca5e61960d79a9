use clap::{Args, Subcommand};

use crate::config::Config;
use crate::error::Result;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommands>,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the resolved configuration
    Show,

    /// Print the config file path
    Path,
}

pub async fn execute(args: ConfigArgs, config: &Config) -> Result<()> {
    match args.command.unwrap_or(ConfigCommands::Show) {
        ConfigCommands::Show => {
            let content = toml::to_string_pretty(config)
                .map_err(|e| anyhow::anyhow!("serialize config: {}", e))?;
            print!("{}", content);
        }
        ConfigCommands::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }

    Ok(())
}
