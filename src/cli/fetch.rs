use clap::Args;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::core::musixmatch::{LyricsKind, LyricsProvider, TrackQuery};
use crate::core::orchestrator::FetchOrchestrator;
use crate::core::scanner;
use crate::core::token::{Token, TokenStore};
use crate::error::{ConfigError, MxLrcError, Result};

#[derive(Args)]
pub struct FetchArgs {
    /// Artist name
    #[arg(long)]
    artist: Option<String>,

    /// Track title
    #[arg(long)]
    title: Option<String>,

    /// Album name (optional disambiguator)
    #[arg(long)]
    album: Option<String>,

    /// Track duration in seconds (optional disambiguator)
    #[arg(long)]
    duration: Option<u64>,

    /// Read artist/title/album/duration from an audio file's tags
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Musixmatch user token (overrides the configured one)
    #[arg(long)]
    token: Option<String>,

    /// Lyrics variant to download
    #[arg(long = "type", value_enum)]
    lyrics_type: Option<LyricsKind>,

    /// Output path (defaults to "Artist - Title.lrc")
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl FetchArgs {
    /// Resolve the search query from the audio file's tags, explicit flags
    /// taking precedence over tag values.
    fn build_query(&self) -> Result<TrackQuery> {
        let mut query = match &self.file {
            Some(file) => {
                if !file.exists() {
                    return Err(MxLrcError::Validation(format!(
                        "File not found: {}",
                        file.display()
                    )));
                }
                scanner::query_from_path(file)?
            }
            None => {
                let artist = self.artist.clone().ok_or_else(|| missing("artist"))?;
                let title = self.title.clone().ok_or_else(|| missing("title"))?;
                TrackQuery::new(artist, title)
            }
        };

        if let Some(artist) = &self.artist {
            query.artist = artist.clone();
        }
        if let Some(title) = &self.title {
            query.title = title.clone();
        }
        if let Some(album) = &self.album {
            query.album = Some(album.clone());
        }
        if let Some(duration) = self.duration {
            query.duration = Some(duration);
        }

        Ok(query)
    }
}

fn missing(field: &str) -> MxLrcError {
    ConfigError::MissingField {
        field: field.to_string(),
    }
    .into()
}

pub async fn execute(args: FetchArgs, config: &Config) -> Result<()> {
    let query = args.build_query()?;
    let kind = args.lyrics_type.unwrap_or(config.lyrics_type);

    let provider: Arc<dyn LyricsProvider> = Arc::new(config.create_client());
    let mut tokens = TokenStore::new(provider.clone());
    if let Some(value) = args.token.as_deref().or(config.token.as_deref()) {
        tokens.set(Token::preset(value));
    }

    info!(
        "🔍 Fetching {} lyrics for {} - {}",
        kind, query.artist, query.title
    );

    let mut orchestrator = FetchOrchestrator::new(provider, tokens);
    let text = orchestrator
        .fetch_one(&query, kind)
        .await
        .map_err(MxLrcError::Fetch)?;

    let output = args.output.unwrap_or_else(|| {
        PathBuf::from(format!("{} - {}.lrc", query.artist, query.title))
    });
    fs::write(&output, format!("{}\n", text))?;

    println!("✅ Saved {} lyrics to {}", kind, output.display());
    Ok(())
}
