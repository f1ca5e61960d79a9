use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::lrc::{self, LrcTags};
use crate::core::musixmatch::{LyricPayload, LyricsKind, LyricsProvider, TrackMatch, TrackQuery};
use crate::core::token::{Token, TokenStore};
use crate::error::{ConfigError, FetchError, MxLrcError, Result};

/// Pause/sleep seam so the batch pacing policy is testable without waiting
/// out real time.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// One track of a batch: the search parameters and where the rendered
/// lyrics should end up.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub query: TrackQuery,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct BatchJob {
    pub entries: Vec<BatchEntry>,
    /// Pause between consecutive tracks. The service penalizes rapid
    /// requests, so this must be positive.
    pub pause: Duration,
    pub kind: LyricsKind,
}

/// Terminal state of one track. The rendered text is handed back to the
/// caller; persistence is the caller's responsibility.
#[derive(Debug)]
pub struct TrackOutcome {
    pub query: TrackQuery,
    pub output: PathBuf,
    pub result: std::result::Result<String, FetchError>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<TrackOutcome>,
    /// True when the batch was interrupted between tracks; `outcomes` then
    /// covers only the tracks attempted before the interruption.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn successful(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.successful()
    }
}

/// Drives one fetch (or a batch of fetches) through token acquisition,
/// search, lyric retrieval and rendering. All network calls run strictly
/// sequentially; concurrency is deliberately absent because the service
/// penalizes parallel clients.
pub struct FetchOrchestrator {
    provider: Arc<dyn LyricsProvider>,
    tokens: TokenStore,
    sleeper: Arc<dyn Sleeper>,
    cancel: Arc<AtomicBool>,
    /// Re-mint-and-retry budget when the service rejects the token mid-use.
    auth_retries: u32,
}

impl FetchOrchestrator {
    pub fn new(provider: Arc<dyn LyricsProvider>, tokens: TokenStore) -> Self {
        Self {
            provider,
            tokens,
            sleeper: Arc::new(TokioSleeper),
            cancel: Arc::new(AtomicBool::new(false)),
            auth_retries: 1,
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_auth_retries(mut self, auth_retries: u32) -> Self {
        self.auth_retries = auth_retries;
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// The held token, minting one if none is held yet.
    async fn current_token(&mut self) -> std::result::Result<Token, FetchError> {
        match self.tokens.get() {
            Some(token) => Ok(token.clone()),
            None => self.tokens.mint().await,
        }
    }

    async fn search_track(
        &mut self,
        query: &TrackQuery,
    ) -> std::result::Result<TrackMatch, FetchError> {
        let mut attempts = 0;
        loop {
            let token = self.current_token().await?;
            match self.provider.search(&token, query).await {
                Err(FetchError::Auth) if attempts < self.auth_retries => {
                    attempts += 1;
                    warn!("Search rejected the token, minting a new one");
                    self.tokens.mint().await?;
                }
                other => return other,
            }
        }
    }

    async fn retrieve_lyrics(
        &mut self,
        matched: &TrackMatch,
        kind: LyricsKind,
    ) -> std::result::Result<LyricPayload, FetchError> {
        let mut attempts = 0;
        loop {
            let token = self.current_token().await?;
            match self.provider.fetch_lyrics(&token, matched, kind).await {
                Err(FetchError::Auth) if attempts < self.auth_retries => {
                    attempts += 1;
                    warn!("Lyrics fetch rejected the token, minting a new one");
                    self.tokens.mint().await?;
                }
                other => return other,
            }
        }
    }

    /// Fetch and render lyrics for a single track.
    pub async fn fetch_one(
        &mut self,
        query: &TrackQuery,
        kind: LyricsKind,
    ) -> std::result::Result<String, FetchError> {
        debug!("Searching for {} - {}", query.artist, query.title);
        let matched = self.search_track(query).await?;

        debug!("Matched track {}", matched.track_id);
        let payload = self.retrieve_lyrics(&matched, kind).await?;

        Ok(lrc::render(&payload, &LrcTags::from_query(query)))
    }

    /// Process a batch strictly in order, pausing between tracks. A track's
    /// failure is recorded and the batch continues; only a failed token mint
    /// before the first track aborts the whole run.
    pub async fn run_batch<F>(&mut self, job: &BatchJob, mut observer: F) -> Result<BatchReport>
    where
        F: FnMut(usize, &TrackOutcome),
    {
        if job.pause.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "pause".to_string(),
                value: format!("{}s", job.pause.as_secs()),
            }
            .into());
        }

        // Without a token nothing in the batch can proceed, so a mint
        // failure here is fatal for the run rather than a per-track outcome.
        self.current_token().await.map_err(MxLrcError::Fetch)?;

        let mut report = BatchReport::default();
        for (index, entry) in job.entries.iter().enumerate() {
            if self.cancelled() {
                info!("Batch cancelled after {} tracks", report.outcomes.len());
                report.cancelled = true;
                return Ok(report);
            }

            if index > 0 {
                debug!("Pausing {}s before the next track", job.pause.as_secs());
                self.sleeper.sleep(job.pause).await;
                if self.cancelled() {
                    info!("Batch cancelled after {} tracks", report.outcomes.len());
                    report.cancelled = true;
                    return Ok(report);
                }
            }

            let result = self.fetch_one(&entry.query, job.kind).await;
            if let Err(error) = &result {
                warn!(
                    "{} - {}: {}",
                    entry.query.artist, entry.query.title, error
                );
            }

            let outcome = TrackOutcome {
                query: entry.query.clone(),
                output: entry.output.clone(),
                result,
            };
            observer(index, &outcome);
            report.outcomes.push(outcome);
        }

        Ok(report)
    }
}
