//! Core types for playback management

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Stable song identifier from the catalog backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(String);

impl SongId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SongId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SongId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Song metadata as delivered by the catalog
///
/// Read-only from the controller's point of view. The controller clones
/// songs into its queue but never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    /// Catalog identifier
    pub id: SongId,

    /// Song title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name
    pub album: String,

    /// Track length, serialized as fractional seconds
    #[serde(with = "duration_secs")]
    pub duration: Duration,

    /// Cover image reference
    pub cover_url: String,

    /// Playable audio reference handed to the audio backend
    #[serde(alias = "song_url")]
    pub audio_url: String,
}

impl Song {
    /// Build a song with empty cover/album fields
    pub fn new(
        id: impl Into<SongId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        duration: Duration,
        audio_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: String::new(),
            duration,
            cover_url: String::new(),
            audio_url: audio_url.into(),
        }
    }
}

/// Transport status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// No audio running (nothing loaded, load failed, or queue ran out)
    #[default]
    Stopped,

    /// Audio is playing and the position sampler is active
    Playing,

    /// Paused mid-song
    Paused,
}

/// Full copy of the controller state for UI consumers
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub current_song: Option<Song>,
    pub status: PlaybackStatus,
    #[serde(with = "duration_secs")]
    pub position: Duration,
    pub volume: f32,
    pub muted: bool,
    pub queue: Vec<Song>,
    pub original_order: Vec<Song>,
    pub current_index: Option<usize>,
    pub shuffle_enabled: bool,
    pub repeat_enabled: bool,
}

impl PlayerSnapshot {
    /// Fraction of the current song already played, in [0, 1]
    pub fn progress(&self) -> f32 {
        match &self.current_song {
            Some(song) if !song.duration.is_zero() => {
                (self.position.as_secs_f64() / song.duration.as_secs_f64()).clamp(0.0, 1.0) as f32
            }
            _ => 0.0,
        }
    }
}

/// Render a duration as `m:ss` for the transport bar
pub fn format_clock(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{}:{:02}", total / 60, total % 60)
}

/// Serde adapter storing a `Duration` as fractional seconds
pub(crate) mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|e| {
            serde::de::Error::custom(format!("invalid duration of {secs} seconds: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_clock_pads_seconds() {
        assert_eq!(format_clock(Duration::from_secs(0)), "0:00");
        assert_eq!(format_clock(Duration::from_secs(65)), "1:05");
        assert_eq!(format_clock(Duration::from_secs_f64(212.9)), "3:32");
        assert_eq!(format_clock(Duration::from_secs(3600)), "60:00");
    }

    #[test]
    fn song_deserializes_from_catalog_row() {
        let json = r#"{
            "id": "s1",
            "title": "Night Drive",
            "artist": "Lumen",
            "album": "Afterglow",
            "duration": 184.5,
            "cover_url": "https://cdn.example/covers/s1.jpg",
            "song_url": "https://cdn.example/audio/s1.mp3"
        }"#;

        let song: Song = serde_json::from_str(json).unwrap();
        assert_eq!(song.id, SongId::from("s1"));
        assert_eq!(song.duration, Duration::from_secs_f64(184.5));
        assert_eq!(song.audio_url, "https://cdn.example/audio/s1.mp3");
    }

    #[test]
    fn negative_duration_is_rejected() {
        let json = r#"{"id":"x","title":"t","artist":"a","album":"",
            "duration":-3,"cover_url":"","audio_url":"u"}"#;
        assert!(serde_json::from_str::<Song>(json).is_err());
    }

    #[test]
    fn huge_duration_is_rejected() {
        let json = r#"{"id":"x","title":"t","artist":"a","album":"",
            "duration":1e30,"cover_url":"","audio_url":"u"}"#;
        assert!(serde_json::from_str::<Song>(json).is_err());
    }

    #[test]
    fn snapshot_progress() {
        let mut snapshot = PlayerSnapshot::default();
        assert_eq!(snapshot.progress(), 0.0);

        snapshot.current_song = Some(Song::new("a", "A", "X", Duration::from_secs(200), "u"));
        snapshot.position = Duration::from_secs(50);
        assert!((snapshot.progress() - 0.25).abs() < f32::EPSILON);
    }
}
