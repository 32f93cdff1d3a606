//! Platform-agnostic audio handle traits
//!
//! Abstracts the media pipeline behind one handle per loaded song. The
//! controller never touches samples; it issues fire-and-forget commands
//! and learns about completion through
//! [`PlayerSignal`](crate::events::PlayerSignal)s.

use crate::error::Result;
use crate::events::SignalSink;
use crate::types::Song;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Identity of one acquired audio handle
///
/// Monotonic per controller, so signals from a released handle can be
/// told apart from the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleId(u64);

impl HandleId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything a backend needs to bind a handle to a song
#[derive(Debug, Clone)]
pub struct LoadRequest {
    /// Identity the handle must report in its signals
    pub id: HandleId,

    /// Song to bind
    pub song: Song,

    /// Initial linear volume (0.0-1.0)
    pub volume: f32,

    /// Where to report end-of-track and late failures
    pub signals: SignalSink,
}

/// Live binding between the controller and one song's media pipeline
///
/// Implementors should make every method return promptly; the controller
/// calls them from its single control flow.
pub trait AudioHandle: Send {
    /// Identity given in the [`LoadRequest`]
    fn id(&self) -> HandleId;

    /// Start or resume output
    ///
    /// Called after the end of the song, restarts from the current position
    /// (which the controller seeks to zero first when repeating).
    fn play(&mut self);

    /// Pause output, keeping the position
    fn pause(&mut self);

    /// Move to `position` from the start of the song
    fn seek(&mut self, position: Duration);

    /// Set linear output volume (0.0-1.0)
    fn set_volume(&mut self, volume: f32);

    /// True playback position
    fn current_position(&self) -> Duration;

    /// Whether audio is audibly advancing right now
    ///
    /// False when paused, finished, unloaded or still buffering.
    fn is_actively_playing(&self) -> bool;

    /// Release the pipeline
    ///
    /// After unload the handle must not emit further signals and every
    /// other method becomes a no-op.
    fn unload(&mut self);
}

/// Factory for [`AudioHandle`]s
pub trait AudioBackend: Send {
    /// Handle type produced by this backend
    type Handle: AudioHandle;

    /// Acquire a handle for a song
    ///
    /// The handle starts paused at position zero; the controller calls
    /// `play()` itself.
    ///
    /// # Returns
    /// * `Ok(handle)` - Pipeline created (it may still fail later through
    ///   [`PlayerSignal::LoadFailed`](crate::events::PlayerSignal::LoadFailed))
    /// * `Err(_)` - Source rejected up front (unsupported reference, etc.)
    fn load(&mut self, request: LoadRequest) -> Result<Self::Handle>;
}

impl<B: AudioBackend + ?Sized> AudioBackend for Box<B> {
    type Handle = B::Handle;

    fn load(&mut self, request: LoadRequest) -> Result<Self::Handle> {
        (**self).load(request)
    }
}
