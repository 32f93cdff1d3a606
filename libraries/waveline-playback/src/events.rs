//! Playback Events
//!
//! Two directions:
//! - [`PlayerSignal`]: asynchronous inputs the controller reacts to
//!   (sampler ticks, end of track, late load failures)
//! - [`PlaybackEvent`]: notifications emitted for UI synchronization

use crate::audio::HandleId;
use crate::types::{PlaybackStatus, SongId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Asynchronous input delivered to the controller's single entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerSignal {
    /// Position sampler cadence fired
    PositionTick {
        /// Sampler generation that scheduled this tick
        generation: u64,
    },

    /// Handle reached the natural end of its song
    TrackEnded {
        /// Handle that finished
        handle: HandleId,
    },

    /// Handle failed after it was acquired (unreachable or undecodable source)
    LoadFailed {
        /// Handle that failed
        handle: HandleId,
        /// Backend-provided reason
        reason: String,
    },
}

/// Callback through which audio handles report [`PlayerSignal`]s
///
/// Cheap to clone; every handle gets its own copy at construction.
#[derive(Clone)]
pub struct SignalSink(Arc<dyn Fn(PlayerSignal) + Send + Sync>);

impl SignalSink {
    pub fn new(f: impl Fn(PlayerSignal) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Sink that drops everything
    pub fn discard() -> Self {
        Self::new(|_| {})
    }

    pub fn send(&self, signal: PlayerSignal) {
        (self.0)(signal);
    }
}

impl fmt::Debug for SignalSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SignalSink")
    }
}

/// Events emitted by the playback system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Transport status changed
    StateChanged {
        /// The new status
        status: PlaybackStatus,
    },

    /// A different song was loaded into the handle
    SongChanged {
        /// ID of the new (current) song
        song_id: SongId,
        /// ID of the previous song (if any)
        previous_song_id: Option<SongId>,
    },

    /// Song finished playing naturally (reached end)
    SongFinished {
        /// ID of the finished song
        song_id: SongId,
    },

    /// Position update from the sampler or a seek
    PositionUpdate {
        /// Current playback position
        position_ms: u64,
        /// Total song duration
        duration_ms: u64,
    },

    /// Volume changed
    VolumeChanged {
        /// New volume level (0.0-1.0)
        level: f32,
        /// Whether audio is muted
        is_muted: bool,
    },

    /// Queue contents or position changed
    QueueChanged {
        /// New queue length
        length: usize,
        /// Position of the loaded song in the queue
        current_index: Option<usize>,
    },

    /// Shuffle flag flipped
    ShuffleChanged { enabled: bool },

    /// Repeat flag flipped
    RepeatChanged { enabled: bool },

    /// Audio could not be played
    Error {
        /// Error message
        message: String,
    },

    /// Transient user-facing notice (toast)
    Notice {
        level: NoticeLevel,
        message: String,
    },
}

/// Severity of a [`PlaybackEvent::Notice`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}
