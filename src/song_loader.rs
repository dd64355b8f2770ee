use crate::chart::build_chart;
use crate::model::song::{SongDescriptor, builtin_songs};
use anyhow::{Result, anyhow};
use log::{debug, warn};
use std::fs;
use std::path::Path;

/// Reads a JSON array of song descriptors.
///
/// Songs that fail chart validation are dropped with a warning, so one broken
/// entry does not take the whole catalogue down.
pub fn import_song_file<P: AsRef<Path>>(path: P) -> Result<Vec<SongDescriptor>> {
    let bytes = fs::read(path.as_ref()).map_err(|e| {
        anyhow!(
            "Failed to read song file {}: {}",
            path.as_ref().display(),
            e
        )
    })?;

    json_bytes_to_songs(&bytes, path.as_ref())
}

fn json_bytes_to_songs(bytes: &[u8], source_path: &Path) -> Result<Vec<SongDescriptor>> {
    let songs: Vec<SongDescriptor> = serde_json::from_slice(bytes)
        .map_err(|e| anyhow!("Failed to parse song file {}: {}", source_path.display(), e))?;

    debug!("Parsed {} songs from {}", songs.len(), source_path.display());

    Ok(songs
        .into_iter()
        .filter(|song| match build_chart(song) {
            Ok(_) => true,
            Err(why) => {
                warn!("Skipping unplayable song: {}..!", why);
                false
            }
        })
        .collect())
}

/// Built-in songs followed by those from `extra`. A later song replaces an
/// earlier one with the same id.
pub fn song_catalogue<P: AsRef<Path>>(extra: Option<P>) -> Result<Vec<SongDescriptor>> {
    let mut songs = builtin_songs();

    if let Some(path) = extra {
        for song in import_song_file(path)? {
            if let Some(existing) = songs.iter_mut().find(|s| s.id == song.id) {
                debug!("Song '{}' overrides the built-in entry", song.id);
                *existing = song;
            } else {
                songs.push(song);
            }
        }
    }

    Ok(songs)
}

pub fn find_song<'a>(songs: &'a [SongDescriptor], id: &str) -> Option<&'a SongDescriptor> {
    songs.iter().find(|s| s.id.eq_ignore_ascii_case(id))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    const SONGS_JSON: &str = r#"[
        {
            "id": "warmup",
            "title": "Warm Up",
            "bpm": 90,
            "noteCount": 12,
            "leadIn": 1.0,
            "pattern": [0, 1, 2, 3],
            "audioPath": "assets/song/warmup.mp3",
            "audioStartTime": 2.5
        },
        {
            "id": "broken",
            "title": "Broken",
            "bpm": 0,
            "noteCount": 4,
            "leadIn": 0,
            "pattern": [0]
        },
        {
            "id": "demo-120",
            "title": "Demo - Slower",
            "bpm": 100,
            "noteCount": 8,
            "leadIn": 2,
            "pattern": [3, 2, 1, 0]
        }
    ]"#;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("melody_rush_{}_{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn parses_and_drops_unplayable() {
        env_logger::try_init().unwrap_or(());

        let songs = json_bytes_to_songs(SONGS_JSON.as_bytes(), Path::new("inline.json")).unwrap();
        assert_eq!(songs.len(), 2);

        let warmup = &songs[0];
        assert_eq!(warmup.note_count, 12);
        assert_eq!(warmup.audio_path.as_deref(), Some("assets/song/warmup.mp3"));
        assert_eq!(warmup.audio_start_time, Some(2.5));
        assert_eq!(warmup.audio_end_time, None);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let result = json_bytes_to_songs(b"{ not json", Path::new("bad.json"));
        assert!(result.is_err());
    }

    #[test]
    fn catalogue_merges_by_id() {
        env_logger::try_init().unwrap_or(());

        let path = temp_file("catalogue.json", SONGS_JSON);
        let songs = song_catalogue(Some(&path)).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(songs.len(), builtin_songs().len() + 1);
        assert_eq!(find_song(&songs, "demo-120").unwrap().bpm, 100.0);
        assert!(find_song(&songs, "WARMUP").is_some());
        assert!(find_song(&songs, "broken").is_none());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(import_song_file("./does/not/exist.json").is_err());
        assert_eq!(song_catalogue::<&Path>(None).unwrap(), builtin_songs());
    }
}
