//! Error types for playback management

use thiserror::Error;

/// Playback errors
///
/// Transport controls never surface these: invalid preconditions are
/// silent no-ops. Errors only flow out of collaborator boundaries
/// (audio backend, song source, configuration, the service channel).
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The audio backend could not acquire a handle for a song
    #[error("Failed to load audio for {song_id}: {reason}")]
    Load { song_id: String, reason: String },

    /// The song source collaborator failed
    #[error("Song source error: {0}")]
    Source(String),

    /// Requested collection does not exist in the song source
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// The playback service task is no longer running
    #[error("Playback service stopped")]
    ServiceStopped,

    /// Catalog file could not be parsed
    #[error("Catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlaybackError {
    /// Convenience constructor for backend load failures
    pub fn load(song_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Load {
            song_id: song_id.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
