//! Playback controller - core orchestration
//!
//! Owns the loaded song, transport status, time cursor, queue and
//! shuffle/repeat flags, and drives exactly one audio handle at a time.

use crate::{
    audio::{AudioBackend, AudioHandle, HandleId, LoadRequest},
    config::PlayerConfig,
    events::{PlaybackEvent, PlayerSignal, SignalSink},
    queue::PlayQueue,
    sampler::PositionSampler,
    shuffle::Shuffler,
    types::{PlaybackStatus, PlayerSnapshot, Song, SongId},
    volume::Volume,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Central playback management
///
/// Single-owner and synchronous: every transition happens inside one of
/// the public methods or [`handle_signal`](Self::handle_signal). Handle
/// release always precedes acquisition within the same call, so at most
/// one handle is ever alive.
///
/// Transport controls never fail. Calls whose preconditions do not hold
/// (next on an empty queue, seek with nothing loaded) are ignored.
pub struct PlaybackController<B: AudioBackend> {
    // Audio
    backend: B,
    handle: Option<B::Handle>,
    next_handle_id: u64,
    signals: SignalSink,

    // State
    status: PlaybackStatus,
    current_song: Option<Song>,
    position: Duration,

    // Queue and settings
    queue: PlayQueue,
    volume: Volume,
    shuffle_enabled: bool,
    repeat_enabled: bool,
    stop_at_queue_end: bool,

    sampler: PositionSampler,

    // Event queue for UI synchronization
    pending_events: Vec<PlaybackEvent>,
}

impl<B: AudioBackend> PlaybackController<B> {
    /// Create new controller
    ///
    /// `signals` is handed to every handle the backend creates; whatever it
    /// receives must eventually be passed back to `handle_signal`.
    pub fn new(backend: B, config: &PlayerConfig, signals: SignalSink) -> Self {
        Self {
            backend,
            handle: None,
            next_handle_id: 1,
            signals,
            status: PlaybackStatus::Stopped,
            current_song: None,
            position: Duration::ZERO,
            queue: PlayQueue::new(Shuffler::new(config.shuffle_seed)),
            volume: Volume::new(config.initial_volume),
            shuffle_enabled: config.shuffle,
            repeat_enabled: config.repeat,
            stop_at_queue_end: config.stop_at_queue_end,
            sampler: PositionSampler::new(config.sample_interval()),
            pending_events: Vec::new(),
        }
    }

    // ===== Playback Control =====

    /// Play `song` immediately
    ///
    /// A non-empty `context` (the list the song was picked from) replaces
    /// the queue; an empty one leaves queue and index untouched.
    pub fn load_and_play(&mut self, song: Song, context: Vec<Song>) {
        self.release_handle();

        if !context.is_empty() {
            self.queue
                .set_context(context, self.shuffle_enabled, &song.id);
            if self.queue.current_index().is_none() {
                debug!(song = %song.id, "Song not found in its context list");
            }
            self.emit_queue_changed();
        }

        self.start_song(song);
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if self.status != PlaybackStatus::Playing {
            return;
        }
        let Some(handle) = self.handle.as_mut() else {
            return;
        };

        handle.pause();
        self.sampler.stop();
        self.set_status(PlaybackStatus::Paused);
    }

    /// Resume playback of the loaded song
    pub fn resume(&mut self) {
        if self.current_song.is_none() || self.status == PlaybackStatus::Playing {
            return;
        }
        let Some(handle) = self.handle.as_mut() else {
            debug!("Resume ignored: no live audio handle");
            return;
        };

        handle.play();
        // An ended handle restarts from zero
        self.position = handle.current_position();
        self.sampler.start();
        self.set_status(PlaybackStatus::Playing);
    }

    /// Pause when playing, resume otherwise
    pub fn toggle_play_pause(&mut self) {
        if self.status == PlaybackStatus::Playing {
            self.pause();
        } else {
            self.resume();
        }
    }

    /// Skip to next song in queue
    ///
    /// Wraps to the first song only when repeat is enabled. Returns whether
    /// a song was loaded.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        match self.queue.next_index(self.repeat_enabled) {
            Some(index) => self.play_queue_index(index),
            None => {
                debug!("Next ignored: end of queue");
                false
            }
        }
    }

    /// Go to previous song in queue
    ///
    /// Never wraps backwards, even with repeat enabled. Returns whether a
    /// song was loaded.
    pub fn previous(&mut self) -> bool {
        match self.queue.previous_index() {
            Some(index) => self.play_queue_index(index),
            None => {
                debug!("Previous ignored: start of queue");
                false
            }
        }
    }

    /// Release the audio handle and stop sampling
    pub fn shutdown(&mut self) {
        self.release_handle();
        if self.status != PlaybackStatus::Stopped {
            self.set_status(PlaybackStatus::Stopped);
        }
    }

    // ===== Seek =====

    /// Seek to `seconds` in the current song, clamped to its length
    pub fn seek(&mut self, seconds: f64) {
        let Some(song) = self.current_song.as_ref() else {
            return;
        };
        let Some(handle) = self.handle.as_mut() else {
            return;
        };

        let max = song.duration.as_secs_f64();
        let seconds = if seconds.is_nan() {
            0.0
        } else {
            seconds.clamp(0.0, max)
        };
        let position = Duration::from_secs_f64(seconds);

        handle.seek(position);
        self.position = position;
        self.emit_position_update();
    }

    /// Seek by fraction of the song (progress bar)
    pub fn seek_to_percent(&mut self, percent: f32) {
        let Some(song) = self.current_song.as_ref() else {
            return;
        };
        let percent = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 1.0)
        };
        let seconds = song.duration.as_secs_f64() * f64::from(percent);
        self.seek(seconds);
    }

    // ===== Volume =====

    /// Set volume (clamped into 0.0-1.0)
    pub fn set_volume(&mut self, level: f32) {
        self.volume.set_level(level);
        self.apply_volume();
    }

    /// Toggle mute, remembering the level to restore
    pub fn toggle_mute(&mut self) {
        self.volume.toggle_mute();
        self.apply_volume();
    }

    // ===== Queue Management =====

    /// Append a song to the end of the queue
    pub fn add_to_queue(&mut self, song: Song) {
        debug!(song = %song.id, "Adding to queue");
        self.queue.push(song);
        self.emit_queue_changed();
    }

    // ===== Shuffle & Repeat =====

    /// Flip shuffle and rebuild the play order from the original order
    pub fn toggle_shuffle(&mut self) {
        self.shuffle_enabled = !self.shuffle_enabled;

        let playing = self.current_song.as_ref().map(|song| song.id.clone());
        if self.queue.reorder(self.shuffle_enabled, playing.as_ref()) {
            self.emit_queue_changed();
        }

        self.pending_events.push(PlaybackEvent::ShuffleChanged {
            enabled: self.shuffle_enabled,
        });
    }

    /// Flip repeat
    pub fn toggle_repeat(&mut self) {
        self.repeat_enabled = !self.repeat_enabled;
        self.pending_events.push(PlaybackEvent::RepeatChanged {
            enabled: self.repeat_enabled,
        });
    }

    // ===== Signals =====

    /// Process an asynchronous signal (sampler tick or handle report)
    pub fn handle_signal(&mut self, signal: PlayerSignal) {
        match signal {
            PlayerSignal::PositionTick { generation } => self.on_position_tick(generation),
            PlayerSignal::TrackEnded { handle } => self.on_track_ended(handle),
            PlayerSignal::LoadFailed { handle, reason } => self.on_load_failed(handle, &reason),
        }
    }

    fn on_position_tick(&mut self, generation: u64) {
        if !self.sampler.accepts(generation) {
            return;
        }

        let Some(handle) = self.handle.as_ref() else {
            self.sampler.stop();
            return;
        };

        if self.status != PlaybackStatus::Playing || !handle.is_actively_playing() {
            debug!(handle = %handle.id(), "Position sampler stopping: handle not playing");
            self.sampler.stop();
            return;
        }

        let limit = self
            .current_song
            .as_ref()
            .map_or(Duration::MAX, |song| song.duration);
        self.position = handle.current_position().min(limit);
        self.emit_position_update();
    }

    fn on_track_ended(&mut self, handle_id: HandleId) {
        if !self.is_live(handle_id) {
            debug!(handle = %handle_id, "Ignoring end of track from released handle");
            return;
        }

        if let Some(song) = self.current_song.as_ref() {
            self.pending_events.push(PlaybackEvent::SongFinished {
                song_id: song.id.clone(),
            });
        }

        if self.repeat_enabled {
            if let Some(handle) = self.handle.as_mut() {
                handle.seek(Duration::ZERO);
                handle.play();
            }
            self.position = Duration::ZERO;
            self.sampler.start();
            self.set_status(PlaybackStatus::Playing);
            self.emit_position_update();
            return;
        }

        if self.next() {
            return;
        }

        if self.stop_at_queue_end {
            info!("Queue finished");
            self.sampler.stop();
            if let Some(song) = self.current_song.as_ref() {
                self.position = song.duration;
            }
            self.set_status(PlaybackStatus::Stopped);
        }
    }

    fn on_load_failed(&mut self, handle_id: HandleId, reason: &str) {
        if !self.is_live(handle_id) {
            debug!(handle = %handle_id, "Ignoring failure from released handle");
            return;
        }

        let song_id = self
            .current_song
            .as_ref()
            .map(|song| song.id.to_string())
            .unwrap_or_default();
        warn!(song = %song_id, handle = %handle_id, reason, "Audio failed after load");
        self.fail_playback(format!("Failed to load audio for {song_id}: {reason}"));
    }

    // ===== State Queries =====

    /// Get current transport status
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// Get currently loaded song
    pub fn current_song(&self) -> Option<&Song> {
        self.current_song.as_ref()
    }

    /// Last sampled (or sought) position
    pub fn position(&self) -> Duration {
        self.position
    }

    /// Fraction of the current song already played, in [0, 1]
    pub fn progress(&self) -> f32 {
        match &self.current_song {
            Some(song) if !song.duration.is_zero() => {
                (self.position.as_secs_f64() / song.duration.as_secs_f64()).clamp(0.0, 1.0) as f32
            }
            _ => 0.0,
        }
    }

    /// Get current volume level (0.0-1.0)
    pub fn volume(&self) -> f32 {
        self.volume.level()
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.volume.is_muted()
    }

    /// Songs in play order
    pub fn queue(&self) -> &[Song] {
        self.queue.songs()
    }

    /// Songs in caller-supplied order
    pub fn original_order(&self) -> &[Song] {
        self.queue.original_order()
    }

    /// Position of the loaded song in the queue
    pub fn current_index(&self) -> Option<usize> {
        self.queue.current_index()
    }

    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle_enabled
    }

    pub fn repeat_enabled(&self) -> bool {
        self.repeat_enabled
    }

    /// Sampler state, for whoever drives the tick timer
    pub fn sampler(&self) -> &PositionSampler {
        &self.sampler
    }

    /// Identity of the live audio handle, if any
    pub fn live_handle(&self) -> Option<HandleId> {
        self.handle.as_ref().map(|handle| handle.id())
    }

    /// Copy of the full state for UI consumers
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            current_song: self.current_song.clone(),
            status: self.status,
            position: self.position,
            volume: self.volume.level(),
            muted: self.volume.is_muted(),
            queue: self.queue.songs().to_vec(),
            original_order: self.queue.original_order().to_vec(),
            current_index: self.queue.current_index(),
            shuffle_enabled: self.shuffle_enabled,
            repeat_enabled: self.repeat_enabled,
        }
    }

    // ===== Events =====

    /// Drain all pending events
    ///
    /// Returns all events that have been emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Check if there are pending events
    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internals =====

    fn play_queue_index(&mut self, index: usize) -> bool {
        let Some(song) = self.queue.select(index).cloned() else {
            return false;
        };

        self.release_handle();
        self.emit_queue_changed();
        self.start_song(song);
        true
    }

    /// Acquire a handle for `song` and start it
    ///
    /// Callers must have released the previous handle.
    fn start_song(&mut self, song: Song) {
        debug_assert!(self.handle.is_none(), "previous handle still alive");

        let previous_song_id = self.current_song.as_ref().map(|s| s.id.clone());
        let id = HandleId::new(self.next_handle_id);
        self.next_handle_id += 1;

        let request = LoadRequest {
            id,
            song: song.clone(),
            volume: self.volume.level(),
            signals: self.signals.clone(),
        };

        let song_id = song.id.clone();
        self.current_song = Some(song);
        self.position = Duration::ZERO;
        self.emit_song_changed(song_id.clone(), previous_song_id);

        match self.backend.load(request) {
            Ok(mut handle) => {
                handle.play();
                info!(song = %song_id, handle = %id, "Playing");
                self.handle = Some(handle);
                self.sampler.start();
                self.set_status(PlaybackStatus::Playing);
            }
            Err(e) => {
                warn!(song = %song_id, error = %e, "Could not acquire audio handle");
                self.fail_playback(e.to_string());
            }
        }
    }

    /// Drop to a safe idle state after a playback failure (no retry)
    fn fail_playback(&mut self, message: String) {
        self.release_handle();
        self.set_status(PlaybackStatus::Stopped);
        self.pending_events.push(PlaybackEvent::Error { message });
    }

    fn release_handle(&mut self) {
        self.sampler.stop();
        if let Some(mut handle) = self.handle.take() {
            debug!(handle = %handle.id(), "Releasing audio handle");
            handle.unload();
        }
    }

    fn is_live(&self, id: HandleId) -> bool {
        self.handle.as_ref().is_some_and(|handle| handle.id() == id)
    }

    fn apply_volume(&mut self) {
        let level = self.volume.level();
        if let Some(handle) = self.handle.as_mut() {
            handle.set_volume(level);
        }
        self.pending_events.push(PlaybackEvent::VolumeChanged {
            level,
            is_muted: self.volume.is_muted(),
        });
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        if self.status != status {
            self.status = status;
            self.pending_events
                .push(PlaybackEvent::StateChanged { status });
        }
    }

    fn emit_song_changed(&mut self, song_id: SongId, previous_song_id: Option<SongId>) {
        self.pending_events.push(PlaybackEvent::SongChanged {
            song_id,
            previous_song_id,
        });
    }

    fn emit_queue_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
            current_index: self.queue.current_index(),
        });
    }

    fn emit_position_update(&mut self) {
        let duration = self
            .current_song
            .as_ref()
            .map_or(Duration::ZERO, |song| song.duration);
        self.pending_events.push(PlaybackEvent::PositionUpdate {
            position_ms: self.position.as_millis() as u64,
            duration_ms: duration.as_millis() as u64,
        });
    }
}

impl<B: AudioBackend> Drop for PlaybackController<B> {
    fn drop(&mut self) {
        self.release_handle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::{HandleState, SimulatedBackend, SimulatedDeck};
    use crate::types::Song;

    fn song(id: &str, secs: u64) -> Song {
        Song::new(
            id,
            format!("Song {id}"),
            "Artist",
            Duration::from_secs(secs),
            format!("https://cdn.example/{id}.mp3"),
        )
    }

    fn songs(ids: &[&str]) -> Vec<Song> {
        ids.iter().map(|id| song(id, 180)).collect()
    }

    fn setup() -> (PlaybackController<SimulatedBackend>, SimulatedDeck) {
        let backend = SimulatedBackend::new();
        let deck = backend.deck();
        let controller =
            PlaybackController::new(backend, &PlayerConfig::default(), SignalSink::discard());
        (controller, deck)
    }

    fn tick(controller: &mut PlaybackController<SimulatedBackend>) {
        let generation = controller.sampler().generation();
        controller.handle_signal(PlayerSignal::PositionTick { generation });
    }

    #[test]
    fn test_initial_state() {
        let (controller, _) = setup();

        assert_eq!(controller.status(), PlaybackStatus::Stopped);
        assert!(controller.current_song().is_none());
        assert_eq!(controller.position(), Duration::ZERO);
        assert_eq!(controller.volume(), 0.5);
        assert!(controller.queue().is_empty());
        assert_eq!(controller.current_index(), None);
        assert!(!controller.sampler().is_running());
        assert!(controller.live_handle().is_none());
    }

    #[test]
    fn test_load_and_play_event_order() {
        let (mut controller, _) = setup();
        let list = songs(&["a", "b"]);

        controller.load_and_play(list[0].clone(), list.clone());

        let events = controller.drain_events();
        assert_eq!(
            events,
            vec![
                PlaybackEvent::QueueChanged {
                    length: 2,
                    current_index: Some(0),
                },
                PlaybackEvent::SongChanged {
                    song_id: SongId::from("a"),
                    previous_song_id: None,
                },
                PlaybackEvent::StateChanged {
                    status: PlaybackStatus::Playing,
                },
            ]
        );
        assert!(!controller.has_pending_events());
    }

    #[test]
    fn test_pause_resume_toggles_sampler() {
        let (mut controller, deck) = setup();
        controller.load_and_play(song("a", 60), vec![]);
        let handle = controller.live_handle().unwrap();

        controller.pause();
        assert_eq!(controller.status(), PlaybackStatus::Paused);
        assert!(!controller.sampler().is_running());
        assert_eq!(deck.state_of(handle), Some(HandleState::Paused));

        controller.toggle_play_pause();
        assert_eq!(controller.status(), PlaybackStatus::Playing);
        assert!(controller.sampler().is_running());
        assert_eq!(deck.state_of(handle), Some(HandleState::Playing));
    }

    #[test]
    fn test_pause_when_not_playing_is_noop() {
        let (mut controller, _) = setup();
        controller.pause();
        controller.resume();

        assert_eq!(controller.status(), PlaybackStatus::Stopped);
        assert!(controller.drain_events().is_empty());
    }

    #[test]
    fn test_position_tick_samples_handle() {
        let (mut controller, deck) = setup();
        controller.load_and_play(song("a", 60), vec![]);

        deck.advance(Duration::from_secs(7));
        tick(&mut controller);

        assert_eq!(controller.position(), Duration::from_secs(7));
        assert!((controller.progress() - 7.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_stale_generation_tick_ignored() {
        let (mut controller, deck) = setup();
        controller.load_and_play(song("a", 60), vec![]);
        let stale = controller.sampler().generation();

        controller.pause();
        controller.resume();
        deck.advance(Duration::from_secs(3));
        controller.handle_signal(PlayerSignal::PositionTick { generation: stale });

        assert_eq!(controller.position(), Duration::ZERO);
    }

    #[test]
    fn test_tick_while_paused_stops_sampler() {
        let (mut controller, _) = setup();
        controller.load_and_play(song("a", 60), vec![]);
        let generation = controller.sampler().generation();

        controller.pause();
        controller.handle_signal(PlayerSignal::PositionTick { generation });

        assert!(!controller.sampler().is_running());
        assert_eq!(controller.position(), Duration::ZERO);
    }

    #[test]
    fn test_seek_clamps_to_duration() {
        let (mut controller, deck) = setup();
        controller.load_and_play(song("a", 100), vec![]);
        let handle = controller.live_handle().unwrap();

        controller.seek(30.0);
        assert_eq!(controller.position(), Duration::from_secs(30));
        assert_eq!(deck.position_of(handle), Some(Duration::from_secs(30)));

        controller.seek(1_000.0);
        assert_eq!(controller.position(), Duration::from_secs(100));

        controller.seek(-5.0);
        assert_eq!(controller.position(), Duration::ZERO);
    }

    #[test]
    fn test_seek_to_percent() {
        let (mut controller, _) = setup();
        controller.load_and_play(song("a", 200), vec![]);

        controller.seek_to_percent(0.25);
        assert_eq!(controller.position(), Duration::from_secs(50));

        controller.seek_to_percent(3.0);
        assert_eq!(controller.position(), Duration::from_secs(200));
        assert_eq!(controller.progress(), 1.0);
    }

    #[test]
    fn test_seek_without_song_is_noop() {
        let (mut controller, _) = setup();
        controller.seek(10.0);
        assert_eq!(controller.position(), Duration::ZERO);
        assert!(controller.drain_events().is_empty());
    }

    #[test]
    fn test_volume_reaches_live_handle() {
        let (mut controller, deck) = setup();
        controller.load_and_play(song("a", 60), vec![]);
        let handle = controller.live_handle().unwrap();
        assert_eq!(deck.volume_of(handle), Some(0.5));

        controller.set_volume(0.8);
        assert_eq!(deck.volume_of(handle), Some(0.8));

        controller.toggle_mute();
        assert!(controller.is_muted());
        assert_eq!(deck.volume_of(handle), Some(0.0));

        controller.toggle_mute();
        assert_eq!(deck.volume_of(handle), Some(0.8));
    }

    #[test]
    fn test_new_handle_inherits_volume() {
        let (mut controller, deck) = setup();
        controller.set_volume(0.3);
        controller.load_and_play(song("a", 60), vec![]);

        let handle = controller.live_handle().unwrap();
        assert_eq!(deck.volume_of(handle), Some(0.3));
    }

    #[test]
    fn test_add_to_queue_appends_both_orders() {
        let (mut controller, _) = setup();
        let list = songs(&["a", "b"]);
        controller.load_and_play(list[0].clone(), list);

        controller.add_to_queue(song("z", 60));

        assert_eq!(controller.queue().len(), 3);
        assert_eq!(controller.queue()[2].id.as_str(), "z");
        assert_eq!(controller.original_order()[2].id.as_str(), "z");
        assert_eq!(controller.current_index(), Some(0));
    }

    #[test]
    fn test_toggle_repeat_emits() {
        let (mut controller, _) = setup();
        controller.toggle_repeat();

        assert!(controller.repeat_enabled());
        assert_eq!(
            controller.drain_events(),
            vec![PlaybackEvent::RepeatChanged { enabled: true }]
        );
    }

    #[test]
    fn test_shutdown_releases_handle() {
        let (mut controller, deck) = setup();
        controller.load_and_play(song("a", 60), vec![]);

        controller.shutdown();

        assert!(controller.live_handle().is_none());
        assert!(deck.live_handles().is_empty());
        assert_eq!(controller.status(), PlaybackStatus::Stopped);
    }

    #[test]
    fn test_drop_releases_handle() {
        let (mut controller, deck) = setup();
        controller.load_and_play(song("a", 60), vec![]);
        drop(controller);

        assert!(deck.live_handles().is_empty());
    }

    #[test]
    fn test_snapshot_mirrors_state() {
        let (mut controller, _) = setup();
        let list = songs(&["a", "b", "c"]);
        controller.load_and_play(list[1].clone(), list.clone());
        controller.toggle_repeat();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.status, PlaybackStatus::Playing);
        assert_eq!(snapshot.current_song.as_ref(), Some(&list[1]));
        assert_eq!(snapshot.current_index, Some(1));
        assert_eq!(snapshot.queue, list);
        assert!(snapshot.repeat_enabled);
        assert!(!snapshot.muted);
    }
}
