use clap::{Args, Subcommand};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::core::musixmatch::LyricsProvider;
use crate::core::token::TokenStore;
use crate::error::{MxLrcError, Result};

#[derive(Args)]
pub struct TokenArgs {
    #[command(subcommand)]
    command: TokenCommands,
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Mint a fresh token and store it in the config file
    Refresh {
        /// Print the token without persisting it
        #[arg(long)]
        no_save: bool,
    },

    /// Show the currently configured token
    Show,
}

pub async fn execute(args: TokenArgs, config: &Config) -> Result<()> {
    match args.command {
        TokenCommands::Refresh { no_save } => {
            let provider: Arc<dyn LyricsProvider> = Arc::new(config.create_client());
            let mut tokens = TokenStore::new(provider);
            let token = tokens.mint().await.map_err(MxLrcError::Fetch)?;

            println!("{}", token.value);

            if !no_save {
                let mut updated = config.clone();
                updated.token = Some(token.value);
                updated.save(&Config::config_path()?)?;
                info!("Token saved to the config file");
            }
        }
        TokenCommands::Show => match &config.token {
            Some(token) => println!("{}", token),
            None => println!("No token configured; one will be minted on demand"),
        },
    }

    Ok(())
}
