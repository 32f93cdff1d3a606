//! Line-oriented command parsing

use anyhow::{anyhow, bail, Context};
use waveline_playback::{Collection, SongId};

/// One line typed at the prompt
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Play a song, using `from` as the queue
    Play { song: SongId, from: Collection },
    Pause,
    Resume,
    Toggle,
    Next,
    Previous,
    Shuffle,
    Repeat,
    Volume(f32),
    Mute,
    Seek(f64),
    Enqueue(SongId),
    Status,
    List,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  play <song> [playlist]   play a song (queue: catalog or the playlist)
  liked <song> <user>      play a song from a user's liked songs
  pause | resume | toggle
  next | prev
  shuffle | repeat         toggle shuffle / repeat
  vol <0-100>              set volume
  mute                     toggle mute
  seek <m:ss | seconds>    jump within the song
  enqueue <song>           append a song to the queue
  status | list | help | quit";

/// Parse one input line; blank lines yield `None`
pub fn parse(line: &str) -> anyhow::Result<Option<Input>> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let input = match (command, args.as_slice()) {
        ("play" | "p", [song]) => Input::Play {
            song: SongId::from(*song),
            from: Collection::Catalog,
        },
        ("play" | "p", [song, playlist]) => Input::Play {
            song: SongId::from(*song),
            from: Collection::Playlist((*playlist).to_string()),
        },
        ("liked", [song, user]) => Input::Play {
            song: SongId::from(*song),
            from: Collection::Liked((*user).to_string()),
        },
        ("pause", []) => Input::Pause,
        ("resume", []) => Input::Resume,
        ("toggle" | "t", []) => Input::Toggle,
        ("next" | "n", []) => Input::Next,
        ("prev" | "previous", []) => Input::Previous,
        ("shuffle", []) => Input::Shuffle,
        ("repeat", []) => Input::Repeat,
        ("vol" | "volume", [level]) => {
            let percent: f32 = level
                .parse()
                .with_context(|| format!("invalid volume '{level}'"))?;
            Input::Volume(percent / 100.0)
        }
        ("mute", []) => Input::Mute,
        ("seek", [at]) => Input::Seek(parse_time(at)?),
        ("enqueue" | "q", [song]) => Input::Enqueue(SongId::from(*song)),
        ("status" | "s", []) => Input::Status,
        ("list" | "ls", []) => Input::List,
        ("help" | "?", []) => Input::Help,
        ("quit" | "exit", []) => Input::Quit,
        _ => bail!("unknown command '{}' (try 'help')", line.trim()),
    };

    Ok(Some(input))
}

/// Parse `m:ss` or plain seconds
fn parse_time(text: &str) -> anyhow::Result<f64> {
    let invalid = || anyhow!("invalid time '{text}'");

    match text.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: u64 = minutes.parse().map_err(|_| invalid())?;
            let seconds: f64 = seconds.parse().map_err(|_| invalid())?;
            if !(0.0..60.0).contains(&seconds) {
                return Err(invalid());
            }
            Ok(minutes as f64 * 60.0 + seconds)
        }
        None => text.parse().map_err(|_| invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_is_ignored() {
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn play_defaults_to_catalog() {
        assert_eq!(
            parse("play s1").unwrap(),
            Some(Input::Play {
                song: SongId::from("s1"),
                from: Collection::Catalog,
            })
        );
    }

    #[test]
    fn play_from_playlist_and_likes() {
        assert_eq!(
            parse("play s2 road-trip").unwrap(),
            Some(Input::Play {
                song: SongId::from("s2"),
                from: Collection::Playlist("road-trip".to_string()),
            })
        );
        assert_eq!(
            parse("liked s2 user-1").unwrap(),
            Some(Input::Play {
                song: SongId::from("s2"),
                from: Collection::Liked("user-1".to_string()),
            })
        );
    }

    #[test]
    fn volume_is_percent() {
        assert_eq!(parse("vol 80").unwrap(), Some(Input::Volume(0.8)));
        assert!(parse("vol loud").is_err());
    }

    #[test]
    fn seek_accepts_clock_or_seconds() {
        assert_eq!(parse("seek 1:30").unwrap(), Some(Input::Seek(90.0)));
        assert_eq!(parse("seek 42").unwrap(), Some(Input::Seek(42.0)));
        assert!(parse("seek 1:75").is_err());
        assert!(parse("seek soon").is_err());
    }

    #[test]
    fn unknown_or_malformed_commands_fail() {
        assert!(parse("dance").is_err());
        assert!(parse("next now").is_err());
        assert!(parse("play").is_err());
    }
}
