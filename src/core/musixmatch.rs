use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::token::Token;
use crate::error::FetchError;

/// App id of the Musixmatch desktop client, required on every request.
pub const DESKTOP_APP_ID: &str = "web-desktop-app-v1.0";

/// The desktop API refuses requests without the token-guid cookie.
const TOKEN_GUID_COOKIE: &str = "x-mxm-token-guid=";

/// Placeholder line used for instrumental tracks and empty synced lines.
const NOTE_PLACEHOLDER: &str = "♪";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LyricsKind {
    Synced,
    Unsynced,
}

impl fmt::Display for LyricsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LyricsKind::Synced => write!(f, "synced"),
            LyricsKind::Unsynced => write!(f, "unsynced"),
        }
    }
}

/// Search parameters for one track. Artist and title identify the track,
/// album and duration only disambiguate when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackQuery {
    pub artist: String,
    pub title: String,
    pub album: Option<String>,
    /// Duration in seconds.
    pub duration: Option<u64>,
}

impl TrackQuery {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            album: None,
            duration: None,
        }
    }
}

/// A matched track as reported by the search endpoint, consumed immediately
/// by the lyrics fetch step.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMatch {
    pub track_id: i64,
    pub has_synced: bool,
    pub has_unsynced: bool,
    pub instrumental: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncedLine {
    pub time_ms: u64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LyricPayload {
    Synced(Vec<SyncedLine>),
    Unsynced(String),
}

/// The wire protocol seam. The orchestrator and token store only talk to
/// this trait, so tests can substitute a scripted provider and the exact
/// request/response shapes stay an implementation detail of the client.
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Request a fresh user token from the service.
    async fn mint_token(&self) -> Result<Token, FetchError>;

    /// Find the track matching the query, or fail with `NotFound`.
    async fn search(&self, token: &Token, query: &TrackQuery) -> Result<TrackMatch, FetchError>;

    /// Retrieve lyric content in the requested variant for a matched track.
    async fn fetch_lyrics(
        &self,
        token: &Token,
        matched: &TrackMatch,
        kind: LyricsKind,
    ) -> Result<LyricPayload, FetchError>;
}

/// Stateless client for the Musixmatch desktop API. Performs no retries and
/// holds no token state; resilience lives in the orchestrator.
#[derive(Clone)]
pub struct MusixmatchClient {
    client: reqwest::Client,
    base_url: String,
}

impl MusixmatchClient {
    pub fn new(base_url: &str) -> Self {
        let version = env!("CARGO_PKG_VERSION");
        let user_agent = format!("mxlrc-cli v{}", version);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<ApiResponse<T>, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .header("cookie", TOKEN_GUID_COOKIE)
            .query(params)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        debug!("{} responded with HTTP {}", endpoint, response.status());
        response.json().await.map_err(FetchError::from_reqwest)
    }
}

#[async_trait]
impl LyricsProvider for MusixmatchClient {
    async fn mint_token(&self) -> Result<Token, FetchError> {
        let params = [("app_id", DESKTOP_APP_ID.to_string())];
        let response: ApiResponse<TokenBody> = self
            .get_json("token.get", &params)
            .await
            .map_err(|e| FetchError::TokenMint {
                reason: e.to_string(),
            })?;

        token_from_response(response)
    }

    async fn search(&self, token: &Token, query: &TrackQuery) -> Result<TrackMatch, FetchError> {
        let mut params = vec![
            ("format", "json".to_string()),
            ("app_id", DESKTOP_APP_ID.to_string()),
            ("q_artist", query.artist.clone()),
            ("q_track", query.title.clone()),
            ("usertoken", token.value.clone()),
        ];
        if let Some(album) = &query.album {
            params.push(("q_album", album.clone()));
        }
        if let Some(duration) = query.duration {
            params.push(("q_duration", duration.to_string()));
            params.push(("f_subtitle_length", duration.to_string()));
        }

        let response: ApiResponse<MatcherBody> =
            self.get_json("matcher.track.get", &params).await?;
        track_from_response(response)
    }

    async fn fetch_lyrics(
        &self,
        token: &Token,
        matched: &TrackMatch,
        kind: LyricsKind,
    ) -> Result<LyricPayload, FetchError> {
        if matched.instrumental {
            debug!("Track {} is instrumental", matched.track_id);
            return Ok(instrumental_payload(kind));
        }

        let available = match kind {
            LyricsKind::Synced => matched.has_synced,
            LyricsKind::Unsynced => matched.has_unsynced,
        };
        if !available {
            return Err(FetchError::LyricsUnavailable { kind });
        }

        let mut params = vec![
            ("format", "json".to_string()),
            ("app_id", DESKTOP_APP_ID.to_string()),
            ("track_id", matched.track_id.to_string()),
            ("usertoken", token.value.clone()),
        ];

        match kind {
            LyricsKind::Synced => {
                params.push(("subtitle_format", "mxm".to_string()));
                let response: ApiResponse<SubtitlesBody> =
                    self.get_json("track.subtitles.get", &params).await?;
                synced_from_response(response)
            }
            LyricsKind::Unsynced => {
                let response: ApiResponse<LyricsBody> =
                    self.get_json("track.lyrics.get", &params).await?;
                unsynced_from_response(response)
            }
        }
    }
}

fn instrumental_payload(kind: LyricsKind) -> LyricPayload {
    let text = format!("{} Instrumental {}", NOTE_PLACEHOLDER, NOTE_PLACEHOLDER);
    match kind {
        LyricsKind::Synced => LyricPayload::Synced(vec![SyncedLine { time_ms: 0, text }]),
        LyricsKind::Unsynced => LyricPayload::Unsynced(text),
    }
}

// ---------------------------------------------------------------------------
// Wire format. Every endpoint wraps its payload in a message envelope whose
// header carries the real status code; the HTTP status is usually 200 even
// for failures.
// ---------------------------------------------------------------------------

#[derive(Deserialize, Debug)]
struct ApiResponse<T> {
    message: ApiMessage<T>,
}

#[derive(Deserialize, Debug)]
struct ApiMessage<T> {
    header: ApiHeader,
    body: Option<T>,
}

#[derive(Deserialize, Debug)]
struct ApiHeader {
    status_code: i64,
    #[serde(default)]
    hint: Option<String>,
}

#[derive(Deserialize, Debug)]
struct TokenBody {
    user_token: Option<String>,
}

#[derive(Deserialize, Debug)]
struct MatcherBody {
    track: ApiTrack,
}

#[derive(Deserialize, Debug)]
struct ApiTrack {
    track_id: i64,
    #[serde(default)]
    has_subtitles: i64,
    #[serde(default)]
    has_lyrics: i64,
    #[serde(default)]
    instrumental: i64,
}

#[derive(Deserialize, Debug)]
struct SubtitlesBody {
    subtitle_list: Vec<SubtitleEntry>,
}

#[derive(Deserialize, Debug)]
struct SubtitleEntry {
    subtitle: Subtitle,
}

#[derive(Deserialize, Debug)]
struct Subtitle {
    #[serde(default)]
    subtitle_body: String,
    #[serde(default)]
    restricted: i64,
}

#[derive(Deserialize, Debug)]
struct LyricsBody {
    lyrics: Lyrics,
}

#[derive(Deserialize, Debug)]
struct Lyrics {
    #[serde(default)]
    lyrics_body: Option<String>,
    #[serde(default)]
    restricted: i64,
}

/// One line of the `mxm` subtitle body, itself a JSON document embedded as a
/// string inside the subtitle payload.
#[derive(Deserialize, Debug)]
struct SubtitleLine {
    #[serde(default)]
    text: String,
    time: SubtitleTime,
}

#[derive(Deserialize, Debug)]
struct SubtitleTime {
    total: f64,
}

fn check_header(header: &ApiHeader, endpoint: &str) -> Result<(), FetchError> {
    match header.status_code {
        200 => Ok(()),
        401 => Err(FetchError::Auth),
        404 => Err(FetchError::NotFound),
        code => Err(FetchError::InvalidResponse {
            reason: format!("{} returned status {}", endpoint, code),
        }),
    }
}

fn token_from_response(response: ApiResponse<TokenBody>) -> Result<Token, FetchError> {
    let header = &response.message.header;
    if header.status_code != 200 {
        return Err(FetchError::TokenMint {
            reason: format!("token.get returned status {}", header.status_code),
        });
    }
    if let Some(hint) = header.hint.as_deref().filter(|hint| !hint.is_empty()) {
        // The service answers 200 with a captcha hint when it is throttling
        // token issuance.
        return Err(FetchError::TokenMint {
            reason: format!("token issuance throttled ({})", hint),
        });
    }

    let value = response
        .message
        .body
        .and_then(|body| body.user_token)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| FetchError::TokenMint {
            reason: "response carried no user token".to_string(),
        })?;

    Ok(Token::new(value))
}

fn track_from_response(response: ApiResponse<MatcherBody>) -> Result<TrackMatch, FetchError> {
    check_header(&response.message.header, "matcher.track.get")?;

    let track = response
        .message
        .body
        .ok_or(FetchError::NotFound)?
        .track;

    Ok(TrackMatch {
        track_id: track.track_id,
        has_synced: track.has_subtitles != 0,
        has_unsynced: track.has_lyrics != 0,
        instrumental: track.instrumental != 0,
    })
}

fn synced_from_response(response: ApiResponse<SubtitlesBody>) -> Result<LyricPayload, FetchError> {
    check_header(&response.message.header, "track.subtitles.get")?;

    let subtitle = response
        .message
        .body
        .and_then(|body| body.subtitle_list.into_iter().next())
        .map(|entry| entry.subtitle)
        .ok_or(FetchError::LyricsUnavailable {
            kind: LyricsKind::Synced,
        })?;

    if subtitle.restricted != 0 {
        warn!("Subtitles are restricted for this track");
        return Err(FetchError::LyricsUnavailable {
            kind: LyricsKind::Synced,
        });
    }
    if subtitle.subtitle_body.is_empty() {
        return Err(FetchError::LyricsUnavailable {
            kind: LyricsKind::Synced,
        });
    }

    let lines = parse_subtitle_body(&subtitle.subtitle_body)?;
    if lines.is_empty() {
        return Err(FetchError::LyricsUnavailable {
            kind: LyricsKind::Synced,
        });
    }
    Ok(LyricPayload::Synced(lines))
}

fn unsynced_from_response(response: ApiResponse<LyricsBody>) -> Result<LyricPayload, FetchError> {
    check_header(&response.message.header, "track.lyrics.get")?;

    let lyrics = response
        .message
        .body
        .ok_or(FetchError::LyricsUnavailable {
            kind: LyricsKind::Unsynced,
        })?
        .lyrics;

    if lyrics.restricted != 0 {
        warn!("Lyrics are restricted for this track");
        return Err(FetchError::LyricsUnavailable {
            kind: LyricsKind::Unsynced,
        });
    }

    let body = lyrics
        .lyrics_body
        .filter(|body| !body.trim().is_empty())
        .ok_or(FetchError::LyricsUnavailable {
            kind: LyricsKind::Unsynced,
        })?;

    Ok(LyricPayload::Unsynced(body))
}

/// Parse the `mxm` subtitle body into ordered synced lines. Empty line text
/// becomes a note placeholder, matching how the desktop client renders
/// musical breaks.
fn parse_subtitle_body(raw: &str) -> Result<Vec<SyncedLine>, FetchError> {
    let parsed: Vec<SubtitleLine> =
        serde_json::from_str(raw).map_err(|e| FetchError::InvalidResponse {
            reason: format!("malformed subtitle body: {}", e),
        })?;

    Ok(parsed
        .into_iter()
        .map(|line| SyncedLine {
            time_ms: (line.time.total * 1000.0).round() as u64,
            text: if line.text.is_empty() {
                NOTE_PLACEHOLDER.to_string()
            } else {
                line.text
            },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response<T: serde::de::DeserializeOwned>(json: &str) -> ApiResponse<T> {
        serde_json::from_str(json).expect("test response must parse")
    }

    #[test]
    fn test_token_from_response() {
        let ok: ApiResponse<TokenBody> = response(
            r#"{"message":{"header":{"status_code":200},"body":{"user_token":"abc123"}}}"#,
        );
        let token = token_from_response(ok).unwrap();
        assert_eq!(token.value, "abc123");
        assert!(token.issued_at.is_some());
    }

    #[test]
    fn test_token_mint_rejected_on_captcha_hint() {
        let throttled: ApiResponse<TokenBody> = response(
            r#"{"message":{"header":{"status_code":200,"hint":"captcha"},"body":{}}}"#,
        );
        assert!(matches!(
            token_from_response(throttled),
            Err(FetchError::TokenMint { .. })
        ));
    }

    #[test]
    fn test_token_mint_rejected_on_missing_token() {
        let empty: ApiResponse<TokenBody> =
            response(r#"{"message":{"header":{"status_code":200},"body":{}}}"#);
        assert!(matches!(
            token_from_response(empty),
            Err(FetchError::TokenMint { .. })
        ));
    }

    #[test]
    fn test_track_from_response() {
        let found: ApiResponse<MatcherBody> = response(
            r#"{"message":{"header":{"status_code":200},"body":{"track":{"track_id":42,"has_subtitles":1,"has_lyrics":1,"instrumental":0}}}}"#,
        );
        let matched = track_from_response(found).unwrap();
        assert_eq!(matched.track_id, 42);
        assert!(matched.has_synced);
        assert!(matched.has_unsynced);
        assert!(!matched.instrumental);
    }

    #[test]
    fn test_track_not_found_maps_to_not_found() {
        let missing: ApiResponse<MatcherBody> =
            response(r#"{"message":{"header":{"status_code":404},"body":null}}"#);
        assert!(matches!(
            track_from_response(missing),
            Err(FetchError::NotFound)
        ));
    }

    #[test]
    fn test_rejected_token_maps_to_auth() {
        let rejected: ApiResponse<MatcherBody> =
            response(r#"{"message":{"header":{"status_code":401},"body":null}}"#);
        assert!(matches!(
            track_from_response(rejected),
            Err(FetchError::Auth)
        ));
    }

    #[test]
    fn test_parse_subtitle_body() {
        let raw = r#"[{"text":"la","time":{"total":0.0}},{"text":"","time":{"total":5.0}}]"#;
        let lines = parse_subtitle_body(raw).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].time_ms, 0);
        assert_eq!(lines[0].text, "la");
        assert_eq!(lines[1].time_ms, 5000);
        assert_eq!(lines[1].text, NOTE_PLACEHOLDER);
    }

    #[test]
    fn test_parse_subtitle_body_rejects_garbage() {
        assert!(matches!(
            parse_subtitle_body("not json"),
            Err(FetchError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_restricted_subtitles_are_unavailable() {
        let restricted: ApiResponse<SubtitlesBody> = response(
            r#"{"message":{"header":{"status_code":200},"body":{"subtitle_list":[{"subtitle":{"subtitle_body":"[]","restricted":1}}]}}}"#,
        );
        assert!(matches!(
            synced_from_response(restricted),
            Err(FetchError::LyricsUnavailable {
                kind: LyricsKind::Synced
            })
        ));
    }

    #[test]
    fn test_empty_lyrics_body_is_unavailable() {
        let empty: ApiResponse<LyricsBody> = response(
            r#"{"message":{"header":{"status_code":200},"body":{"lyrics":{"lyrics_body":"","restricted":0}}}}"#,
        );
        assert!(matches!(
            unsynced_from_response(empty),
            Err(FetchError::LyricsUnavailable {
                kind: LyricsKind::Unsynced
            })
        ));
    }
}
