//! Async playback service
//!
//! Runs a [`PlaybackController`] inside one tokio task. UI commands, handle
//! signals and sampler ticks all funnel into a single `select!` loop, so
//! the controller is never touched from two places at once and needs no
//! lock. After every step the service publishes a fresh
//! [`PlayerSnapshot`] (watch channel) and the drained
//! [`PlaybackEvent`]s (broadcast channel).

use crate::{
    audio::AudioBackend,
    catalog::{Collection, SongSource},
    config::PlayerConfig,
    controller::PlaybackController,
    error::{PlaybackError, Result},
    events::{NoticeLevel, PlaybackEvent, PlayerSignal, SignalSink},
    sampler::PositionSampler,
    types::{PlayerSnapshot, Song},
};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Transport command sent by UI consumers
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    /// Play a song, optionally replacing the queue with its context list
    Play { song: Song, context: Vec<Song> },
    Pause,
    Resume,
    TogglePlayPause,
    SetVolume(f32),
    ToggleMute,
    /// Seek to seconds from the start
    Seek(f64),
    /// Seek to a fraction of the song
    SeekPercent(f32),
    Next,
    Previous,
    ToggleShuffle,
    ToggleRepeat,
    AddToQueue(Song),
    /// Release audio and end the service task
    Shutdown,
}

impl<B: AudioBackend> PlaybackController<B> {
    /// Dispatch a [`PlayerCommand`] to the matching operation
    pub fn execute(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::Play { song, context } => self.load_and_play(song, context),
            PlayerCommand::Pause => self.pause(),
            PlayerCommand::Resume => self.resume(),
            PlayerCommand::TogglePlayPause => self.toggle_play_pause(),
            PlayerCommand::SetVolume(level) => self.set_volume(level),
            PlayerCommand::ToggleMute => self.toggle_mute(),
            PlayerCommand::Seek(seconds) => self.seek(seconds),
            PlayerCommand::SeekPercent(percent) => self.seek_to_percent(percent),
            PlayerCommand::Next => {
                self.next();
            }
            PlayerCommand::Previous => {
                self.previous();
            }
            PlayerCommand::ToggleShuffle => self.toggle_shuffle(),
            PlayerCommand::ToggleRepeat => self.toggle_repeat(),
            PlayerCommand::AddToQueue(song) => self.add_to_queue(song),
            PlayerCommand::Shutdown => self.shutdown(),
        }
    }
}

/// Running playback service
pub struct PlayerService {
    client: PlayerClient,
    task: JoinHandle<()>,
}

impl PlayerService {
    /// Spawn the service task on the current tokio runtime
    ///
    /// Fails without spawning anything when `config` does not validate.
    pub fn spawn<B>(backend: B, config: &PlayerConfig) -> Result<Self>
    where
        B: AudioBackend + 'static,
        B::Handle: 'static,
    {
        config.validate()?;

        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let sink = SignalSink::new(move |signal| {
            // Receiver only goes away once the service loop has exited
            let _ = signal_tx.send(signal);
        });

        let controller = PlaybackController::new(backend, config, sink);
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer);
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());
        let (event_tx, _) = broadcast::channel(config.event_buffer);

        let task = tokio::spawn(run(
            controller,
            command_rx,
            signal_rx,
            snapshot_tx,
            event_tx.clone(),
        ));

        info!("Playback service started");

        Ok(Self {
            client: PlayerClient {
                commands: command_tx,
                snapshots: snapshot_rx,
                events: event_tx,
            },
            task,
        })
    }

    /// Cloneable handle for sending commands and reading state
    pub fn client(&self) -> PlayerClient {
        self.client.clone()
    }

    /// Stop playback, release audio and wait for the task to finish
    pub async fn shutdown(self) {
        // Already stopped if the send fails
        let _ = self.client.commands.send(PlayerCommand::Shutdown).await;
        if let Err(e) = self.task.await {
            warn!(error = %e, "Playback service task ended abnormally");
        }
    }
}

/// Front-end side of the service
#[derive(Debug, Clone)]
pub struct PlayerClient {
    commands: mpsc::Sender<PlayerCommand>,
    snapshots: watch::Receiver<PlayerSnapshot>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl PlayerClient {
    /// Queue a command for the service
    pub async fn send(&self, command: PlayerCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PlaybackError::ServiceStopped)
    }

    pub async fn play(&self, song: Song, context: Vec<Song>) -> Result<()> {
        self.send(PlayerCommand::Play { song, context }).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(PlayerCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.send(PlayerCommand::Resume).await
    }

    pub async fn toggle_play_pause(&self) -> Result<()> {
        self.send(PlayerCommand::TogglePlayPause).await
    }

    pub async fn next(&self) -> Result<()> {
        self.send(PlayerCommand::Next).await
    }

    pub async fn previous(&self) -> Result<()> {
        self.send(PlayerCommand::Previous).await
    }

    pub async fn seek(&self, seconds: f64) -> Result<()> {
        self.send(PlayerCommand::Seek(seconds)).await
    }

    pub async fn set_volume(&self, level: f32) -> Result<()> {
        self.send(PlayerCommand::SetVolume(level)).await
    }

    pub async fn toggle_mute(&self) -> Result<()> {
        self.send(PlayerCommand::ToggleMute).await
    }

    pub async fn toggle_shuffle(&self) -> Result<()> {
        self.send(PlayerCommand::ToggleShuffle).await
    }

    pub async fn toggle_repeat(&self) -> Result<()> {
        self.send(PlayerCommand::ToggleRepeat).await
    }

    pub async fn add_to_queue(&self, song: Song) -> Result<()> {
        self.send(PlayerCommand::AddToQueue(song)).await
    }

    /// Fetch `collection` from `source` and play `song` within it
    ///
    /// A failed fetch leaves playback untouched and raises an error notice
    /// for the user.
    pub async fn play_from(
        &self,
        source: &dyn SongSource,
        collection: &Collection,
        song: Song,
    ) -> Result<()> {
        match source.fetch(collection).await {
            Ok(context) => self.play(song, context).await,
            Err(e) => {
                warn!(%collection, error = %e, "Failed to fetch songs");
                self.notify(NoticeLevel::Error, format!("Failed to load {collection}"));
                Err(e)
            }
        }
    }

    /// Publish a transient notice to event subscribers
    pub fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        let _ = self.events.send(PlaybackEvent::Notice {
            level,
            message: message.into(),
        });
    }

    /// Latest published state
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn watch(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshots.clone()
    }

    /// Subscribe to playback events
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }
}

async fn run<B: AudioBackend>(
    mut controller: PlaybackController<B>,
    mut commands: mpsc::Receiver<PlayerCommand>,
    mut signals: mpsc::UnboundedReceiver<PlayerSignal>,
    snapshots: watch::Sender<PlayerSnapshot>,
    events: broadcast::Sender<PlaybackEvent>,
) {
    let mut ticker: Option<(u64, Interval)> = None;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(PlayerCommand::Shutdown) | None => break,
                Some(command) => {
                    debug!(?command, "Command");
                    controller.execute(command);
                }
            },
            Some(signal) = signals.recv() => controller.handle_signal(signal),
            generation = next_tick(&mut ticker) => {
                controller.handle_signal(PlayerSignal::PositionTick { generation });
            }
        }

        sync_ticker(controller.sampler(), &mut ticker);
        publish(&mut controller, &snapshots, &events);
    }

    controller.shutdown();
    publish(&mut controller, &snapshots, &events);
    info!("Playback service stopped");
}

/// Wait for the armed sampler interval; never resolves when disarmed
async fn next_tick(ticker: &mut Option<(u64, Interval)>) -> u64 {
    match ticker {
        Some((generation, interval)) => {
            interval.tick().await;
            *generation
        }
        None => std::future::pending().await,
    }
}

/// Arm, re-arm or disarm the tick timer to match the sampler
fn sync_ticker(sampler: &PositionSampler, ticker: &mut Option<(u64, Interval)>) {
    if !sampler.is_running() {
        *ticker = None;
        return;
    }

    let armed = ticker.as_ref().map(|(generation, _)| *generation);
    if armed != Some(sampler.generation()) {
        let cadence = sampler.cadence();
        let mut interval = tokio::time::interval_at(Instant::now() + cadence, cadence);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        *ticker = Some((sampler.generation(), interval));
    }
}

fn publish<B: AudioBackend>(
    controller: &mut PlaybackController<B>,
    snapshots: &watch::Sender<PlayerSnapshot>,
    events: &broadcast::Sender<PlaybackEvent>,
) {
    let snapshot = controller.snapshot();
    snapshots.send_if_modified(|current| {
        if *current == snapshot {
            false
        } else {
            *current = snapshot;
            true
        }
    });

    for event in controller.drain_events() {
        // No subscribers is fine
        let _ = events.send(event);
    }
}
