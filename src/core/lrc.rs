use crate::core::musixmatch::{LyricPayload, TrackQuery};

/// Header tags for the rendered LRC document. Empty values are skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LrcTags {
    pub artist: String,
    pub title: String,
    pub album: String,
}

impl LrcTags {
    pub fn from_query(query: &TrackQuery) -> Self {
        Self {
            artist: query.artist.clone(),
            title: query.title.clone(),
            album: query.album.clone().unwrap_or_default(),
        }
    }
}

/// Render a lyric payload into LRC text. Purely structural: synced lines are
/// emitted in payload order without reordering or deduplication, unsynced
/// text is emitted verbatim after the tag header.
pub fn render(payload: &LyricPayload, tags: &LrcTags) -> String {
    let mut lines = Vec::new();

    for (name, value) in [
        ("artist", &tags.artist),
        ("title", &tags.title),
        ("album", &tags.album),
    ] {
        if !value.is_empty() {
            lines.push(format!("[{}:{}]", name, value));
        }
    }

    match payload {
        LyricPayload::Synced(synced) => {
            for line in synced {
                lines.push(format!("{}{}", format_timestamp(line.time_ms), line.text));
            }
        }
        LyricPayload::Unsynced(text) => {
            lines.push(text.clone());
        }
    }

    lines.join("\n")
}

/// `[mm:ss.xx]` timestamp, centisecond precision.
fn format_timestamp(time_ms: u64) -> String {
    let total_seconds = time_ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    let hundredths = (time_ms % 1000) / 10;
    format!("[{:02}:{:02}.{:02}]", minutes, seconds, hundredths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::musixmatch::SyncedLine;

    fn synced(lines: &[(u64, &str)]) -> LyricPayload {
        LyricPayload::Synced(
            lines
                .iter()
                .map(|(time_ms, text)| SyncedLine {
                    time_ms: *time_ms,
                    text: text.to_string(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_render_synced_golden() {
        let payload = synced(&[(0, "la"), (5000, "la la")]);
        let tags = LrcTags {
            artist: "A".to_string(),
            title: "B".to_string(),
            album: String::new(),
        };
        assert_eq!(
            render(&payload, &tags),
            "[artist:A]\n[title:B]\n[00:00.00]la\n[00:05.00]la la"
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let payload = synced(&[(1230, "one"), (61_500, "two")]);
        let tags = LrcTags {
            artist: "Artist".to_string(),
            title: "Title".to_string(),
            album: "Album".to_string(),
        };
        assert_eq!(render(&payload, &tags), render(&payload, &tags));
    }

    #[test]
    fn test_render_preserves_payload_order() {
        // The formatter is a structural transform; even out-of-order input
        // stays in payload order.
        let payload = synced(&[(9000, "later"), (1000, "earlier")]);
        let tags = LrcTags::default();
        assert_eq!(render(&payload, &tags), "[00:09.00]later\n[00:01.00]earlier");
    }

    #[test]
    fn test_render_skips_empty_tags() {
        let payload = synced(&[(0, "x")]);
        let tags = LrcTags {
            artist: String::new(),
            title: "Only Title".to_string(),
            album: String::new(),
        };
        assert_eq!(render(&payload, &tags), "[title:Only Title]\n[00:00.00]x");
    }

    #[test]
    fn test_render_unsynced_verbatim() {
        let payload = LyricPayload::Unsynced("line one\nline two\n\nline four".to_string());
        let tags = LrcTags {
            artist: "A".to_string(),
            title: "B".to_string(),
            album: String::new(),
        };
        assert_eq!(
            render(&payload, &tags),
            "[artist:A]\n[title:B]\nline one\nline two\n\nline four"
        );
    }

    #[test]
    fn test_timestamp_formatting() {
        assert_eq!(format_timestamp(0), "[00:00.00]");
        assert_eq!(format_timestamp(5000), "[00:05.00]");
        assert_eq!(format_timestamp(61_230), "[01:01.23]");
        assert_eq!(format_timestamp(600_000), "[10:00.00]");
        assert_eq!(format_timestamp(59_999), "[00:59.99]");
    }
}
