//! Line-oriented command shell driving a [`Player`]

use anyhow::{anyhow, bail, Context, Result};
use playkit_core::{MediaDescriptor, RenderTarget, TrackKind, TrackSelectionOverride, TIME_UNSET};
use playkit_player::Player;
use std::io::{BufRead, Write};

const HELP: &str = "\
commands:
  load <uri> [start-ms]     load media, optionally starting at an offset
  play | pause              resume or pause playback
  seek <ms>                 seek to a position
  speed <rate>              set the playback rate
  sub-delay <seconds>       shift subtitles
  tracks                    list the current tracks
  select <video|audio|sub> <id|off>
  surface <handle|none>     attach (hex or decimal) or detach a render target
  state                     print the current snapshot
  stop                      unload the current item
  quit";

/// One parsed shell line
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Load { uri: String, start_ms: i64 },
    Play,
    Pause,
    Seek(i64),
    Speed(f64),
    SubDelay(f64),
    Tracks,
    Select { kind: TrackKind, native_id: Option<i64> },
    Surface(Option<i64>),
    State,
    Stop,
    Help,
    Quit,
}

fn parse_number<T: std::str::FromStr>(word: Option<&str>, what: &str) -> Result<T> {
    let word = word.ok_or_else(|| anyhow!("missing {}", what))?;
    word.parse()
        .map_err(|_| anyhow!("invalid {}: {}", what, word))
}

fn parse_handle(word: &str) -> Result<i64> {
    let parsed = match word.strip_prefix("0x") {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => word.parse(),
    };
    parsed.with_context(|| format!("invalid surface handle: {}", word))
}

/// Parse a line; `Ok(None)` for blank lines and comments
pub fn parse_line(line: &str) -> Result<Option<ReplCommand>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    if verb.starts_with('#') {
        return Ok(None);
    }

    let command = match verb {
        "load" => {
            let uri = words.next().ok_or_else(|| anyhow!("missing uri"))?;
            let start_ms = match words.next() {
                Some(word) => parse_number(Some(word), "start offset")?,
                None => 0,
            };
            ReplCommand::Load {
                uri: uri.to_string(),
                start_ms,
            }
        }
        "play" => ReplCommand::Play,
        "pause" => ReplCommand::Pause,
        "seek" => ReplCommand::Seek(parse_number(words.next(), "position")?),
        "speed" => ReplCommand::Speed(parse_number(words.next(), "rate")?),
        "sub-delay" => ReplCommand::SubDelay(parse_number(words.next(), "delay")?),
        "tracks" => ReplCommand::Tracks,
        "select" => {
            let kind = match words.next() {
                Some("video") => TrackKind::Video,
                Some("audio") => TrackKind::Audio,
                Some("sub") => TrackKind::Text,
                Some(other) => bail!("unknown track kind: {}", other),
                None => bail!("missing track kind"),
            };
            let native_id = match words.next() {
                Some("off") => None,
                other => Some(parse_number(other, "track id")?),
            };
            ReplCommand::Select { kind, native_id }
        }
        "surface" => match words.next() {
            Some("none") => ReplCommand::Surface(None),
            Some(handle) => ReplCommand::Surface(Some(parse_handle(handle)?)),
            None => bail!("missing surface handle"),
        },
        "state" => ReplCommand::State,
        "stop" => ReplCommand::Stop,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        other => bail!("unknown command: {} (try help)", other),
    };
    Ok(Some(command))
}

fn format_ms(ms: i64) -> String {
    if ms == TIME_UNSET {
        "-".to_string()
    } else {
        format!("{:.3}s", ms as f64 / 1000.0)
    }
}

fn select(player: &Player, kind: TrackKind, native_id: Option<i64>) -> Result<()> {
    let selection = match native_id {
        None => TrackSelectionOverride::Disable(kind),
        Some(id) => {
            let group = player
                .current_tracks()
                .of_kind(kind)
                .find(|g| g.native_id == id)
                .cloned()
                .ok_or_else(|| anyhow!("no {} track with id {}", kind, id))?;
            TrackSelectionOverride::Select(group)
        }
    };
    player.apply_track_selection(&[selection])?;
    Ok(())
}

/// Apply one command; returns false when the shell should exit
pub fn execute<W: Write>(player: &Player, command: ReplCommand, out: &mut W) -> Result<bool> {
    match command {
        ReplCommand::Load { uri, start_ms } => {
            player.load_media(MediaDescriptor::new(uri.clone(), uri), start_ms)?
        }
        ReplCommand::Play => player.play()?,
        ReplCommand::Pause => player.pause()?,
        ReplCommand::Seek(ms) => player.seek_to(ms)?,
        ReplCommand::Speed(rate) => player.set_speed(rate)?,
        ReplCommand::SubDelay(seconds) => player.set_subtitle_delay(seconds)?,
        ReplCommand::Tracks => {
            let tracks = player.current_tracks();
            if tracks.is_empty() {
                writeln!(out, "no tracks")?;
            }
            for group in tracks.groups() {
                writeln!(
                    out,
                    "{} {:<5} id={} lang={} codec={}{}",
                    if group.is_selected { "*" } else { " " },
                    group.kind,
                    group.native_id,
                    group.language.as_deref().unwrap_or("-"),
                    group.codec_name.as_deref().unwrap_or("-"),
                    if group.is_external { " (external)" } else { "" },
                )?;
            }
        }
        ReplCommand::Select { kind, native_id } => select(player, kind, native_id)?,
        ReplCommand::Surface(handle) => player.attach_surface(handle.map(RenderTarget::new))?,
        ReplCommand::State => {
            let state = player.snapshot();
            writeln!(
                out,
                "{} playing={} loading={} pos={} buf={} dur={} speed={} sub-delay={}",
                state.lifecycle,
                state.is_playing(),
                state.is_loading(),
                format_ms(state.position_ms),
                format_ms(state.buffer_ms),
                format_ms(state.duration_ms),
                state.speed,
                state.subtitle_delay_seconds,
            )?;
            if let Some(size) = state.video_size {
                writeln!(out, "video {}x{}", size.width, size.height)?;
            }
        }
        ReplCommand::Stop => player.stop()?,
        ReplCommand::Help => writeln!(out, "{}", HELP)?,
        ReplCommand::Quit => return Ok(false),
    }
    Ok(true)
}

/// Read commands from `input` until EOF or `quit`.
///
/// Bad lines and rejected calls are reported on `out` and do not end the loop.
pub fn run<R: BufRead, W: Write>(player: &Player, input: R, out: &mut W) -> Result<()> {
    for line in input.lines() {
        let line = line.context("Failed to read input")?;
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(out, "error: {}", e)?;
                continue;
            }
        };
        match execute(player, command, out) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => writeln!(out, "error: {:#}", e)?,
        }
    }
    Ok(())
}
