/// Waveline Console - terminal music player over the playback controller
mod input;

use clap::{Parser, Subcommand};
use input::Input;
use std::{path::PathBuf, time::Duration};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waveline_playback::{
    format_clock, NoticeLevel, PlaybackError, PlaybackEvent, PlaybackStatus, PlayerClient,
    PlayerCommand, PlayerConfig, PlayerService, PlayerSnapshot, SimulatedBackend, StaticCatalog,
};

/// Step of the wall clock driving the simulated deck
const CLOCK_STEP: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "waveline-console")]
#[command(about = "Waveline terminal player", long_about = None)]
struct Cli {
    /// Catalog JSON file
    #[arg(short = 'k', long, env = "WAVELINE_CATALOG", default_value = "catalog.json")]
    catalog: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive player (default)
    Play,
    /// Print the songs in the catalog
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they do not tangle with the prompt
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "waveline_playback=info,waveline_console=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let catalog = StaticCatalog::load(&cli.catalog)?;
    tracing::info!(
        "Loaded {} songs from {}",
        catalog.songs().len(),
        cli.catalog.display()
    );

    match cli.command.unwrap_or(Commands::Play) {
        Commands::Play => {
            let config = PlayerConfig::load(cli.config.as_deref())?;
            interactive(config, catalog).await?;
        }
        Commands::List => list_songs(&catalog),
    }

    Ok(())
}

async fn interactive(config: PlayerConfig, catalog: StaticCatalog) -> anyhow::Result<()> {
    let backend = SimulatedBackend::new();
    let deck = backend.deck();
    let service = PlayerService::spawn(backend, &config)?;
    let player = service.client();

    // Real time drives the virtual audio
    let clock = tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLOCK_STEP);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            deck.advance(CLOCK_STEP);
        }
    });

    let printer = tokio::spawn(print_events(player.subscribe()));

    println!("{}", input::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match input::parse(&line) {
            Ok(Some(Input::Quit)) => break,
            Ok(Some(input)) => dispatch(&player, &catalog, input).await?,
            Ok(None) => {}
            Err(e) => println!("{e}"),
        }
    }

    clock.abort();
    service.shutdown().await;
    printer.abort();
    tracing::info!("Bye");

    Ok(())
}

async fn dispatch(
    player: &PlayerClient,
    catalog: &StaticCatalog,
    input: Input,
) -> anyhow::Result<()> {
    let command = match input {
        Input::Play { song, from } => {
            let Some(song) = catalog.find(&song).cloned() else {
                println!("no song '{song}' in the catalog");
                return Ok(());
            };
            return match player.play_from(catalog, &from, song).await {
                // Fetch failures were already reported as a notice
                Err(PlaybackError::ServiceStopped) => Err(PlaybackError::ServiceStopped.into()),
                _ => Ok(()),
            };
        }
        Input::Enqueue(id) => {
            let Some(song) = catalog.find(&id).cloned() else {
                println!("no song '{id}' in the catalog");
                return Ok(());
            };
            let title = song.title.clone();
            player.send(PlayerCommand::AddToQueue(song)).await?;
            player.notify(NoticeLevel::Success, format!("Added '{title}' to the queue"));
            return Ok(());
        }
        Input::Pause => PlayerCommand::Pause,
        Input::Resume => PlayerCommand::Resume,
        Input::Toggle => PlayerCommand::TogglePlayPause,
        Input::Next => PlayerCommand::Next,
        Input::Previous => PlayerCommand::Previous,
        Input::Shuffle => PlayerCommand::ToggleShuffle,
        Input::Repeat => PlayerCommand::ToggleRepeat,
        Input::Volume(level) => PlayerCommand::SetVolume(level),
        Input::Mute => PlayerCommand::ToggleMute,
        Input::Seek(seconds) => PlayerCommand::Seek(seconds),
        Input::Status => {
            println!("{}", render_status(&player.snapshot()));
            return Ok(());
        }
        Input::List => {
            list_songs(catalog);
            return Ok(());
        }
        Input::Help => {
            println!("{}", input::HELP);
            return Ok(());
        }
        Input::Quit => return Ok(()),
    };

    player.send(command).await?;
    Ok(())
}

async fn print_events(mut events: broadcast::Receiver<PlaybackEvent>) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!("Event printer lagged by {} events", skipped);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match event {
            PlaybackEvent::SongChanged { song_id, .. } => println!("♪ now playing {song_id}"),
            PlaybackEvent::SongFinished { song_id } => println!("  finished {song_id}"),
            PlaybackEvent::StateChanged { status } => println!("  {}", status_label(status)),
            PlaybackEvent::VolumeChanged { level, is_muted } => {
                if is_muted {
                    println!("  muted");
                } else {
                    println!("  volume {:.0}%", level * 100.0);
                }
            }
            PlaybackEvent::ShuffleChanged { enabled } => println!("  shuffle {}", on_off(enabled)),
            PlaybackEvent::RepeatChanged { enabled } => println!("  repeat {}", on_off(enabled)),
            PlaybackEvent::Error { message } => println!("✗ {message}"),
            PlaybackEvent::Notice { level, message } => match level {
                NoticeLevel::Error => println!("✗ {message}"),
                NoticeLevel::Success | NoticeLevel::Info => println!("✓ {message}"),
            },
            PlaybackEvent::PositionUpdate { .. } | PlaybackEvent::QueueChanged { .. } => {}
        }
    }
}

fn render_status(snapshot: &PlayerSnapshot) -> String {
    let Some(song) = &snapshot.current_song else {
        return "nothing loaded".to_string();
    };

    let mut line = format!(
        "{} {} - {}  {} / {}",
        status_label(snapshot.status),
        song.title,
        song.artist,
        format_clock(snapshot.position),
        format_clock(song.duration),
    );

    if let Some(index) = snapshot.current_index {
        line.push_str(&format!("  [{}/{}]", index + 1, snapshot.queue.len()));
    }
    if snapshot.muted {
        line.push_str("  muted");
    } else {
        line.push_str(&format!("  vol {:.0}%", snapshot.volume * 100.0));
    }
    if snapshot.shuffle_enabled {
        line.push_str("  shuffle");
    }
    if snapshot.repeat_enabled {
        line.push_str("  repeat");
    }

    line
}

fn list_songs(catalog: &StaticCatalog) {
    for song in catalog.songs() {
        println!(
            "{:<8} {:<28} {:<20} {}",
            song.id,
            song.title,
            song.artist,
            format_clock(song.duration)
        );
    }
}

fn status_label(status: PlaybackStatus) -> &'static str {
    match status {
        PlaybackStatus::Playing => "▶ playing",
        PlaybackStatus::Paused => "⏸ paused",
        PlaybackStatus::Stopped => "■ stopped",
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}
