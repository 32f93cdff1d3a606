//! Virtual-clock audio backend
//!
//! Produces handles that "play" by advancing a position when the owner
//! of the [`SimulatedDeck`] calls [`advance`](SimulatedDeck::advance).
//! Used by the console front end (driven by a wall-clock ticker) and by
//! tests (driven step by step).

use crate::audio::{AudioBackend, AudioHandle, HandleId, LoadRequest};
use crate::error::{PlaybackError, Result};
use crate::events::{PlayerSignal, SignalSink};
use crate::types::SongId;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Lifecycle of a simulated handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Loaded,
    Playing,
    Paused,
    Ended,
    Failed,
    Unloaded,
}

#[derive(Debug)]
struct VirtualTrack {
    song_id: SongId,
    duration: Duration,
    position: Duration,
    volume: f32,
    state: HandleState,
    fails_late: bool,
    signals: SignalSink,
}

#[derive(Debug, Default)]
struct DeckState {
    tracks: BTreeMap<HandleId, VirtualTrack>,
    rejected_urls: HashSet<String>,
    late_failure_urls: HashSet<String>,
}

/// Shared view of every handle a [`SimulatedBackend`] created
#[derive(Debug, Clone, Default)]
pub struct SimulatedDeck {
    inner: Arc<Mutex<DeckState>>,
}

impl SimulatedDeck {
    fn lock(&self) -> MutexGuard<'_, DeckState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advance every playing handle by `elapsed`
    ///
    /// Handles reaching their duration move to `Ended` and report
    /// end-of-track; handles marked to fail report `LoadFailed` instead.
    pub fn advance(&self, elapsed: Duration) {
        let mut outgoing = Vec::new();
        {
            let mut deck = self.lock();
            for (id, track) in &mut deck.tracks {
                if track.state != HandleState::Playing {
                    continue;
                }

                if track.fails_late {
                    track.state = HandleState::Failed;
                    outgoing.push((
                        track.signals.clone(),
                        PlayerSignal::LoadFailed {
                            handle: *id,
                            reason: "stream unreachable".to_string(),
                        },
                    ));
                    continue;
                }

                track.position = (track.position + elapsed).min(track.duration);
                if track.position >= track.duration {
                    track.state = HandleState::Ended;
                    outgoing.push((
                        track.signals.clone(),
                        PlayerSignal::TrackEnded { handle: *id },
                    ));
                }
            }
        }

        // Deliver outside the lock; sinks may call straight back into handles
        for (sink, signal) in outgoing {
            sink.send(signal);
        }
    }

    /// Make future loads of `audio_url` fail synchronously
    pub fn reject_url(&self, audio_url: impl Into<String>) {
        self.lock().rejected_urls.insert(audio_url.into());
    }

    /// Make handles for `audio_url` fail on their first advance
    pub fn fail_after_load(&self, audio_url: impl Into<String>) {
        self.lock().late_failure_urls.insert(audio_url.into());
    }

    /// Handles that have not been unloaded
    pub fn live_handles(&self) -> Vec<HandleId> {
        self.lock()
            .tracks
            .iter()
            .filter(|(_, track)| track.state != HandleState::Unloaded)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Total handles ever created
    pub fn handle_count(&self) -> usize {
        self.lock().tracks.len()
    }

    pub fn state_of(&self, id: HandleId) -> Option<HandleState> {
        self.lock().tracks.get(&id).map(|track| track.state)
    }

    pub fn position_of(&self, id: HandleId) -> Option<Duration> {
        self.lock().tracks.get(&id).map(|track| track.position)
    }

    pub fn volume_of(&self, id: HandleId) -> Option<f32> {
        self.lock().tracks.get(&id).map(|track| track.volume)
    }

    pub fn song_of(&self, id: HandleId) -> Option<SongId> {
        self.lock().tracks.get(&id).map(|track| track.song_id.clone())
    }

    fn update(&self, id: HandleId, f: impl FnOnce(&mut VirtualTrack)) {
        let mut deck = self.lock();
        if let Some(track) = deck.tracks.get_mut(&id) {
            if track.state != HandleState::Unloaded {
                f(track);
            }
        }
    }

    fn read<T>(&self, id: HandleId, f: impl FnOnce(&VirtualTrack) -> T) -> Option<T> {
        self.lock().tracks.get(&id).map(f)
    }
}

/// Backend handing out [`SimulatedHandle`]s
#[derive(Debug, Clone, Default)]
pub struct SimulatedBackend {
    deck: SimulatedDeck,
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared deck for driving and inspecting handles
    pub fn deck(&self) -> SimulatedDeck {
        self.deck.clone()
    }
}

impl AudioBackend for SimulatedBackend {
    type Handle = SimulatedHandle;

    fn load(&mut self, request: LoadRequest) -> Result<SimulatedHandle> {
        let mut deck = self.deck.lock();

        if request.song.audio_url.is_empty() || deck.rejected_urls.contains(&request.song.audio_url)
        {
            return Err(PlaybackError::load(
                request.song.id.as_str(),
                format!("unplayable source '{}'", request.song.audio_url),
            ));
        }

        let fails_late = deck.late_failure_urls.contains(&request.song.audio_url);
        deck.tracks.insert(
            request.id,
            VirtualTrack {
                song_id: request.song.id.clone(),
                duration: request.song.duration,
                position: Duration::ZERO,
                volume: request.volume,
                state: HandleState::Loaded,
                fails_late,
                signals: request.signals,
            },
        );

        Ok(SimulatedHandle {
            id: request.id,
            deck: self.deck.clone(),
        })
    }
}

/// Handle over one virtual track
#[derive(Debug)]
pub struct SimulatedHandle {
    id: HandleId,
    deck: SimulatedDeck,
}

impl AudioHandle for SimulatedHandle {
    fn id(&self) -> HandleId {
        self.id
    }

    fn play(&mut self) {
        self.deck.update(self.id, |track| {
            if track.state == HandleState::Failed {
                return;
            }
            if track.state == HandleState::Ended {
                track.position = Duration::ZERO;
            }
            track.state = HandleState::Playing;
        });
    }

    fn pause(&mut self) {
        self.deck.update(self.id, |track| {
            if track.state == HandleState::Playing {
                track.state = HandleState::Paused;
            }
        });
    }

    fn seek(&mut self, position: Duration) {
        self.deck.update(self.id, |track| {
            track.position = position.min(track.duration);
            if track.state == HandleState::Ended && track.position < track.duration {
                track.state = HandleState::Paused;
            }
        });
    }

    fn set_volume(&mut self, volume: f32) {
        self.deck.update(self.id, |track| track.volume = volume);
    }

    fn current_position(&self) -> Duration {
        self.deck
            .read(self.id, |track| track.position)
            .unwrap_or(Duration::ZERO)
    }

    fn is_actively_playing(&self) -> bool {
        self.deck
            .read(self.id, |track| track.state == HandleState::Playing)
            .unwrap_or(false)
    }

    fn unload(&mut self) {
        let mut deck = self.deck.lock();
        if let Some(track) = deck.tracks.get_mut(&self.id) {
            track.state = HandleState::Unloaded;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Song;

    fn request(id: u64, secs: u64, sink: SignalSink) -> LoadRequest {
        LoadRequest {
            id: HandleId::new(id),
            song: Song::new(
                format!("s{id}"),
                "Song",
                "Artist",
                Duration::from_secs(secs),
                format!("https://cdn.example/s{id}.mp3"),
            ),
            volume: 0.5,
            signals: sink,
        }
    }

    fn collecting_sink() -> (SignalSink, Arc<Mutex<Vec<PlayerSignal>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let received = Arc::clone(&received);
            SignalSink::new(move |signal| received.lock().unwrap().push(signal))
        };
        (sink, received)
    }

    #[test]
    fn handle_plays_to_end_and_reports() {
        let mut backend = SimulatedBackend::new();
        let deck = backend.deck();
        let (sink, received) = collecting_sink();

        let mut handle = backend.load(request(1, 10, sink)).unwrap();
        assert_eq!(deck.state_of(handle.id()), Some(HandleState::Loaded));

        handle.play();
        deck.advance(Duration::from_secs(4));
        assert_eq!(handle.current_position(), Duration::from_secs(4));
        assert!(handle.is_actively_playing());

        deck.advance(Duration::from_secs(10));
        assert_eq!(handle.current_position(), Duration::from_secs(10));
        assert!(!handle.is_actively_playing());
        assert_eq!(
            received.lock().unwrap().as_slice(),
            &[PlayerSignal::TrackEnded {
                handle: HandleId::new(1)
            }]
        );
    }

    #[test]
    fn paused_handle_does_not_advance() {
        let mut backend = SimulatedBackend::new();
        let deck = backend.deck();
        let mut handle = backend.load(request(1, 10, SignalSink::discard())).unwrap();

        handle.play();
        deck.advance(Duration::from_secs(2));
        handle.pause();
        deck.advance(Duration::from_secs(5));

        assert_eq!(handle.current_position(), Duration::from_secs(2));
    }

    #[test]
    fn unloaded_handle_is_inert() {
        let mut backend = SimulatedBackend::new();
        let deck = backend.deck();
        let mut handle = backend.load(request(1, 10, SignalSink::discard())).unwrap();

        handle.play();
        handle.unload();
        handle.play();
        deck.advance(Duration::from_secs(3));

        assert!(!handle.is_actively_playing());
        assert!(deck.live_handles().is_empty());
        assert_eq!(deck.handle_count(), 1);
    }

    #[test]
    fn rejected_url_fails_to_load() {
        let mut backend = SimulatedBackend::new();
        backend.deck().reject_url("https://cdn.example/s1.mp3");

        let result = backend.load(request(1, 10, SignalSink::discard()));
        assert!(matches!(result, Err(PlaybackError::Load { .. })));
    }

    #[test]
    fn late_failure_reports_load_failed() {
        let mut backend = SimulatedBackend::new();
        let deck = backend.deck();
        deck.fail_after_load("https://cdn.example/s1.mp3");
        let (sink, received) = collecting_sink();

        let mut handle = backend.load(request(1, 10, sink)).unwrap();
        handle.play();
        deck.advance(Duration::from_millis(100));

        assert_eq!(deck.state_of(handle.id()), Some(HandleState::Failed));
        assert!(matches!(
            received.lock().unwrap()[0],
            PlayerSignal::LoadFailed { .. }
        ));
    }

    #[test]
    fn play_after_end_restarts() {
        let mut backend = SimulatedBackend::new();
        let deck = backend.deck();
        let mut handle = backend.load(request(1, 3, SignalSink::discard())).unwrap();

        handle.play();
        deck.advance(Duration::from_secs(5));
        assert_eq!(deck.state_of(handle.id()), Some(HandleState::Ended));

        handle.play();
        assert_eq!(handle.current_position(), Duration::ZERO);
        assert!(handle.is_actively_playing());
    }
}
