use globwalk::{glob, DirEntry};
use lofty::error::LoftyError;
use lofty::file::AudioFile;
use lofty::file::TaggedFileExt;
use lofty::read_from_path;
use lofty::tag::Accessor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::musixmatch::TrackQuery;
use crate::core::orchestrator::BatchEntry;
use crate::error::Result;

/// Audio formats accepted in directory mode.
const AUDIO_EXTENSIONS: &[&str] = &[
    "aiff", "aif", "aifc", "wma", "flac", "opus", "ogg", "wav", "m4a", "mp3", "mp2", "mp1",
];

#[derive(Error, Debug)]
pub enum TrackError {
    #[error("Cannot parse the tag info from track: `{0}`. Error: `{1}`")]
    ParseFailed(String, LoftyError),
    #[error("No title was found from track: `{0}`")]
    TitleNotFound(String),
    #[error("No artist name was found from track: `{0}`")]
    ArtistNotFound(String),
    #[error("No primary tag was found from track: `{0}`")]
    PrimaryTagNotFound(String),
}

/// Build a search query from an audio file's tags. Artist and title are
/// required; album and duration ride along as disambiguators when present.
pub fn query_from_path(path: &Path) -> std::result::Result<TrackQuery, TrackError> {
    let file_path = path.display().to_string();
    let tagged_file =
        read_from_path(path).map_err(|err| TrackError::ParseFailed(file_path.clone(), err))?;
    let tag = tagged_file
        .primary_tag()
        .ok_or_else(|| TrackError::PrimaryTagNotFound(file_path.clone()))?;

    let title = tag
        .title()
        .ok_or_else(|| TrackError::TitleNotFound(file_path.clone()))?
        .to_string();
    let artist = tag
        .artist()
        .ok_or_else(|| TrackError::ArtistNotFound(file_path.clone()))?
        .to_string();
    let album = tag
        .album()
        .map(|album| album.to_string())
        .filter(|album| !album.is_empty());
    let duration = tagged_file.properties().duration().as_secs();

    Ok(TrackQuery {
        artist,
        title,
        album,
        duration: (duration > 0).then_some(duration),
    })
}

/// Walk a directory for audio files and derive one batch entry per readable
/// track, the `.lrc` destination sitting next to the audio file. Files whose
/// tags cannot be read are skipped with a warning rather than failing the
/// scan.
pub fn scan_directory(directory: &Path) -> Result<Vec<BatchEntry>> {
    let directory_str = directory.to_string_lossy();
    debug!("Scanning directory: {}", directory_str);

    let extensions_pattern = AUDIO_EXTENSIONS
        .iter()
        .flat_map(|ext| vec![ext.to_lowercase(), ext.to_uppercase()])
        .collect::<Vec<_>>()
        .join(",");
    let pattern = format!("{}/**/*.{{{}}}", directory_str, extensions_pattern);

    let globwalker = glob(&pattern).map_err(anyhow::Error::from)?;
    let mut entries: Vec<DirEntry> = globwalker
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(anyhow::Error::from)?;
    entries.sort_by_key(|entry| entry.path().to_path_buf());

    debug!("Found {} audio files", entries.len());

    let mut batch = Vec::new();
    for entry in entries {
        let path = entry.path();
        match query_from_path(path) {
            Ok(query) => batch.push(BatchEntry {
                query,
                output: lrc_path_for(path),
            }),
            Err(error) => {
                warn!("Skipping {}: {}", path.display(), error);
            }
        }
    }

    Ok(batch)
}

/// `<audio stem>.lrc` in the same directory as the audio file.
pub fn lrc_path_for(audio_path: &Path) -> PathBuf {
    audio_path.with_extension("lrc")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lrc_path_sits_next_to_audio_file() {
        assert_eq!(
            lrc_path_for(Path::new("/music/album/song.mp3")),
            PathBuf::from("/music/album/song.lrc")
        );
        assert_eq!(
            lrc_path_for(Path::new("song.flac")),
            PathBuf::from("song.lrc")
        );
    }

    #[test]
    fn test_scan_skips_unreadable_files() {
        let dir = std::env::temp_dir().join("mxlrc-scanner-test");
        std::fs::create_dir_all(&dir).unwrap();
        // Not a real audio file, so tag parsing fails and the file is skipped.
        std::fs::write(dir.join("broken.mp3"), b"not audio").unwrap();
        std::fs::write(dir.join("notes.txt"), b"ignored").unwrap();

        let batch = scan_directory(&dir).unwrap();
        assert!(batch.is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }
}
