//! Waveline - Playback Control
//!
//! Client-side playback controller for a music streaming front end.
//!
//! This crate provides:
//! - Transport control (play, pause, resume, seek, next, previous)
//! - Play queue with original and shuffled order
//! - Shuffle (Fisher-Yates, optionally seeded) and two-state repeat
//! - Volume with mute/unmute memory
//! - Position sampling on a fixed cadence
//! - An async service wrapping the controller for UI consumers
//!
//! # Architecture
//!
//! `waveline-playback` never decodes audio itself. The media pipeline sits
//! behind [`AudioBackend`]/[`AudioHandle`], and song lists come from a
//! [`SongSource`]. [`PlaybackController`] is synchronous and single-owner;
//! [`PlayerService`] runs it on a tokio task and feeds it commands, handle
//! signals and sampler ticks through one loop.
//!
//! # Example: Driving the controller directly
//!
//! ```rust
//! use std::time::Duration;
//! use waveline_playback::{
//!     PlaybackController, PlaybackStatus, PlayerConfig, SignalSink, SimulatedBackend, Song,
//! };
//!
//! let songs: Vec<Song> = ["a", "b", "c"]
//!     .iter()
//!     .map(|id| Song::new(*id, "Title", "Artist", Duration::from_secs(180), format!("https://cdn/{id}.mp3")))
//!     .collect();
//!
//! let mut player = PlaybackController::new(
//!     SimulatedBackend::new(),
//!     &PlayerConfig::default(),
//!     SignalSink::discard(),
//! );
//!
//! player.load_and_play(songs[1].clone(), songs.clone());
//! assert_eq!(player.status(), PlaybackStatus::Playing);
//! assert_eq!(player.current_index(), Some(1));
//!
//! player.next();
//! assert_eq!(player.current_song().map(|s| s.id.as_str()), Some("c"));
//! ```
//!
//! # Example: Async service
//!
//! ```rust,no_run
//! use waveline_playback::{Collection, PlayerConfig, PlayerService, SimulatedBackend, StaticCatalog, SongId};
//!
//! # async fn demo(catalog: StaticCatalog) -> waveline_playback::Result<()> {
//! let service = PlayerService::spawn(SimulatedBackend::new(), &PlayerConfig::default())?;
//! let player = service.client();
//! let mut events = player.subscribe();
//!
//! if let Some(song) = catalog.find(&SongId::from("s1")).cloned() {
//!     player.play_from(&catalog, &Collection::Catalog, song).await?;
//! }
//!
//! while let Ok(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//!
//! service.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod catalog;
pub mod config;
mod controller;
mod error;
pub mod events;
mod queue;
mod sampler;
mod service;
mod shuffle;
pub mod simulated;
pub mod types;
mod volume;

// Public exports
pub use audio::{AudioBackend, AudioHandle, HandleId, LoadRequest};
pub use catalog::{Collection, SongSource, StaticCatalog};
pub use config::PlayerConfig;
pub use controller::PlaybackController;
pub use error::{PlaybackError, Result};
pub use events::{NoticeLevel, PlaybackEvent, PlayerSignal, SignalSink};
pub use queue::PlayQueue;
pub use sampler::PositionSampler;
pub use service::{PlayerClient, PlayerCommand, PlayerService};
pub use shuffle::Shuffler;
pub use simulated::{HandleState, SimulatedBackend, SimulatedDeck, SimulatedHandle};
pub use types::{format_clock, PlaybackStatus, PlayerSnapshot, Song, SongId};
pub use volume::{Volume, DEFAULT_LEVEL};
