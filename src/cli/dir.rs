use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::validation::ConfigValidator;
use crate::config::Config;
use crate::core::musixmatch::{LyricsKind, LyricsProvider};
use crate::core::orchestrator::{BatchJob, FetchOrchestrator};
use crate::core::scanner;
use crate::core::token::{Token, TokenStore};
use crate::error::{MxLrcError, Result};
use crate::signal_handler::SignalHandler;

#[derive(Args)]
pub struct DirArgs {
    /// Directory to scan for audio files
    #[arg(value_name = "DIRECTORY")]
    directory: PathBuf,

    /// Seconds to wait between tracks (the service penalizes rapid requests)
    #[arg(long)]
    pause: Option<String>,

    /// Lyrics variant to download
    #[arg(long = "type", value_enum)]
    lyrics_type: Option<LyricsKind>,

    /// Musixmatch user token (overrides the configured one)
    #[arg(long)]
    token: Option<String>,

    /// Overwrite existing .lrc files
    #[arg(long)]
    force: bool,
}

pub async fn execute(args: DirArgs, config: &Config) -> Result<()> {
    // Validate the pause setting before touching the filesystem or the
    // network; a bad value must never surface mid-batch.
    let pause = match &args.pause {
        Some(raw) => ConfigValidator::validate_pause(raw)?,
        None => ConfigValidator::validate_pause(&config.pause_seconds.to_string())?,
    };

    if !args.directory.is_dir() {
        return Err(MxLrcError::Validation(format!(
            "Not a directory: {}",
            args.directory.display()
        )));
    }

    let mut entries = scanner::scan_directory(&args.directory)?;
    if !args.force {
        let before = entries.len();
        entries.retain(|entry| !entry.output.exists());
        let skipped = before - entries.len();
        if skipped > 0 {
            info!(
                "Skipping {} track(s) that already have lyrics (use --force to overwrite)",
                skipped
            );
        }
    }

    if entries.is_empty() {
        println!("No audio files to process in {}", args.directory.display());
        return Ok(());
    }

    let total = entries.len();
    info!("Processing {} track(s), pausing {}s between requests", total, pause.as_secs());

    let job = BatchJob {
        entries,
        pause,
        kind: args.lyrics_type.unwrap_or(config.lyrics_type),
    };

    let provider: Arc<dyn LyricsProvider> = Arc::new(config.create_client());
    let mut tokens = TokenStore::new(provider.clone());
    if let Some(value) = args.token.as_deref().or(config.token.as_deref()) {
        tokens.set(Token::preset(value));
    }

    let signal_handler = SignalHandler::new();
    let ctrl_c_task = signal_handler.spawn_ctrl_c_listener();

    let mut orchestrator = FetchOrchestrator::new(provider, tokens)
        .with_cancel_flag(signal_handler.cancel_flag());

    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .expect("valid progress template"),
    );

    let mut write_failures = 0usize;
    let report = orchestrator
        .run_batch(&job, |_, outcome| {
            let label = format!("{} - {}", outcome.query.artist, outcome.query.title);
            match &outcome.result {
                Ok(text) => match fs::write(&outcome.output, format!("{}\n", text)) {
                    Ok(()) => progress.println(format!(
                        "✅ Saved {}",
                        outcome.output.display()
                    )),
                    Err(e) => {
                        write_failures += 1;
                        progress.println(format!(
                            "❌ Failed to write {}: {}",
                            outcome.output.display(),
                            e
                        ));
                    }
                },
                Err(error) => {
                    progress.println(format!("❌ {}: {}", label, error));
                }
            }
            progress.inc(1);
        })
        .await?;
    progress.finish_and_clear();
    ctrl_c_task.abort();

    println!("\n📊 Batch Summary:");
    println!("  ✅ Successful: {}", report.successful() - write_failures);
    println!("  ❌ Failed: {}", report.failed() + write_failures);
    if report.cancelled {
        println!(
            "  ⏹️ Cancelled after {} of {} track(s)",
            report.outcomes.len(),
            total
        );
    }

    Ok(())
}
