//! Song source collaborator
//!
//! The controller only ever sees finite, ordered song lists. Where they
//! come from (hosted tables, a local file) sits behind [`SongSource`].

use crate::error::{PlaybackError, Result};
use crate::types::{Song, SongId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// A list of songs a user can start playback from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    /// Every song in the catalog
    Catalog,

    /// Songs of one playlist, in playlist order
    Playlist(String),

    /// Songs a user liked
    Liked(String),
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Catalog => f.write_str("catalog"),
            Collection::Playlist(id) => write!(f, "playlist {id}"),
            Collection::Liked(user) => write!(f, "liked songs of {user}"),
        }
    }
}

/// Supplier of song lists
#[async_trait]
pub trait SongSource: Send + Sync {
    /// Fetch the songs of `collection`, in display order
    async fn fetch(&self, collection: &Collection) -> Result<Vec<Song>>;
}

/// In-memory song source
///
/// JSON layout:
/// ```json
/// {
///   "songs": [{ "id": "s1", "title": "...", "artist": "...", "album": "...",
///               "duration": 184.0, "cover_url": "...", "song_url": "..." }],
///   "playlists": { "road-trip": ["s1"] },
///   "likes": { "user-1": ["s1"] }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticCatalog {
    songs: Vec<Song>,

    #[serde(default)]
    playlists: BTreeMap<String, Vec<SongId>>,

    #[serde(default)]
    likes: BTreeMap<String, Vec<SongId>>,
}

impl StaticCatalog {
    pub fn new(songs: Vec<Song>) -> Self {
        Self {
            songs,
            ..Default::default()
        }
    }

    /// Register a playlist by song ids
    #[must_use]
    pub fn with_playlist(mut self, id: impl Into<String>, songs: Vec<SongId>) -> Self {
        self.playlists.insert(id.into(), songs);
        self
    }

    /// Register a user's liked songs
    #[must_use]
    pub fn with_likes(mut self, user_id: impl Into<String>, songs: Vec<SongId>) -> Self {
        self.likes.insert(user_id.into(), songs);
        self
    }

    /// Parse a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a catalog JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// All songs in catalog order
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    /// Look up a song by id
    pub fn find(&self, id: &SongId) -> Option<&Song> {
        self.songs.iter().find(|song| &song.id == id)
    }

    fn resolve(&self, ids: &[SongId]) -> Vec<Song> {
        ids.iter()
            .filter_map(|id| {
                let song = self.find(id).cloned();
                if song.is_none() {
                    debug!(song = %id, "Skipping unknown song id");
                }
                song
            })
            .collect()
    }
}

#[async_trait]
impl SongSource for StaticCatalog {
    async fn fetch(&self, collection: &Collection) -> Result<Vec<Song>> {
        match collection {
            Collection::Catalog => Ok(self.songs.clone()),
            Collection::Playlist(id) => self
                .playlists
                .get(id)
                .map(|ids| self.resolve(ids))
                .ok_or_else(|| PlaybackError::CollectionNotFound(collection.to_string())),
            Collection::Liked(user) => Ok(self
                .likes
                .get(user)
                .map(|ids| self.resolve(ids))
                .unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn catalog() -> StaticCatalog {
        let songs = ["a", "b", "c"]
            .iter()
            .map(|id| {
                Song::new(
                    *id,
                    format!("Song {id}"),
                    "Artist",
                    Duration::from_secs(120),
                    format!("https://cdn.example/{id}.mp3"),
                )
            })
            .collect();

        StaticCatalog::new(songs)
            .with_playlist("mix", vec!["c".into(), "ghost".into(), "a".into()])
            .with_likes("u1", vec!["b".into()])
    }

    fn ids(songs: &[Song]) -> Vec<&str> {
        songs.iter().map(|s| s.id.as_str()).collect()
    }

    #[tokio::test]
    async fn fetch_catalog_in_order() {
        let songs = catalog().fetch(&Collection::Catalog).await.unwrap();
        assert_eq!(ids(&songs), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn playlist_keeps_order_and_skips_unknown() {
        let songs = catalog()
            .fetch(&Collection::Playlist("mix".to_string()))
            .await
            .unwrap();
        assert_eq!(ids(&songs), vec!["c", "a"]);
    }

    #[tokio::test]
    async fn unknown_playlist_is_an_error() {
        let result = catalog()
            .fetch(&Collection::Playlist("nope".to_string()))
            .await;
        assert!(matches!(result, Err(PlaybackError::CollectionNotFound(_))));
    }

    #[tokio::test]
    async fn likes_default_to_empty() {
        let catalog = catalog();
        let liked = catalog.fetch(&Collection::Liked("u1".to_string())).await.unwrap();
        assert_eq!(ids(&liked), vec!["b"]);

        let none = catalog.fetch(&Collection::Liked("u2".to_string())).await.unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn parse_catalog_json() {
        let json = r#"{
            "songs": [{"id": "s1", "title": "One", "artist": "X", "album": "Y",
                       "duration": 61, "cover_url": "", "song_url": "https://cdn.example/1.mp3"}],
            "playlists": {"p": ["s1"]}
        }"#;

        let catalog = StaticCatalog::from_json(json).unwrap();
        assert_eq!(catalog.songs().len(), 1);
        assert!(catalog.find(&SongId::from("s1")).is_some());
    }

    #[test]
    fn oversized_duration_is_parse_error() {
        let json = r#"{
            "songs": [{"id": "s1", "title": "One", "artist": "X", "album": "Y",
                       "duration": 1e30, "cover_url": "", "song_url": "https://cdn.example/1.mp3"}]
        }"#;

        assert!(matches!(
            StaticCatalog::from_json(json),
            Err(PlaybackError::Parse(_))
        ));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            StaticCatalog::from_json("{ nope"),
            Err(PlaybackError::Parse(_))
        ));
    }
}
