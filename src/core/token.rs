use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::core::musixmatch::LyricsProvider;
use crate::error::FetchError;

/// Opaque credential issued by the lyrics service. The service never reports
/// an expiry; a token simply starts getting rejected at some point.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub value: String,
    pub issued_at: Option<DateTime<Utc>>,
}

impl Token {
    /// A token freshly minted from the service.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            issued_at: Some(Utc::now()),
        }
    }

    /// A token supplied by the caller, of unknown age.
    pub fn preset(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            issued_at: None,
        }
    }
}

/// Owns the single token used for a run. Only `mint` touches the network;
/// callers decide when a rejection warrants replacing the held token.
///
/// Not safe for concurrent mint/set without external locking; batches that
/// share a store must serialize themselves.
pub struct TokenStore {
    provider: Arc<dyn LyricsProvider>,
    token: Option<Token>,
}

impl TokenStore {
    pub fn new(provider: Arc<dyn LyricsProvider>) -> Self {
        Self {
            provider,
            token: None,
        }
    }

    /// The currently held token, without network access.
    pub fn get(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Replace the held token with a caller-supplied one.
    pub fn set(&mut self, token: Token) {
        self.token = Some(token);
    }

    /// Request a new token from the service and hold it. No retries; the
    /// retry policy belongs to the orchestrator.
    pub async fn mint(&mut self) -> Result<Token, FetchError> {
        let token = self.provider.mint_token().await?;
        info!("Obtained a new user token");
        self.token = Some(token.clone());
        Ok(token)
    }
}
