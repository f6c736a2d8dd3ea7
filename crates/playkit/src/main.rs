//! Playkit - headless player driver
//!
//! Builds a [`Player`] over the native engine, optionally loads a media item and
//! attaches a render target, then reads commands from stdin.

mod app_config;
mod logging_setup;
mod repl;

use anyhow::Result;
use app_config::AppConfig;
use clap::Parser;
use playkit_core::{MediaDescriptor, PlayerEvent, RenderTarget};
use playkit_engine::NativeEngine;
use playkit_player::Player;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "playkit", version, about = "Drive a native playback engine from the terminal")]
struct Args {
    /// TOML file with [log] and [player] tables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<String>,

    /// Native window handle to render into (hex with 0x prefix, or decimal)
    #[arg(long, value_parser = parse_wid)]
    wid: Option<i64>,

    /// Start offset for the initial media, in milliseconds
    #[arg(long, default_value_t = 0)]
    start: i64,

    /// Media to load on startup
    media: Option<String>,
}

fn parse_wid(value: &str) -> std::result::Result<i64, String> {
    match value.strip_prefix("0x") {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => value.parse(),
    }
    .map_err(|e| format!("invalid window handle {}: {}", value, e))
}

#[cfg(feature = "libmpv")]
fn create_engine() -> Result<Box<dyn NativeEngine>> {
    Ok(Box::new(playkit_engine::LibMpvEngine::new()))
}

#[cfg(not(feature = "libmpv"))]
fn create_engine() -> Result<Box<dyn NativeEngine>> {
    anyhow::bail!("built without a native engine; rebuild with `--features libmpv`")
}

fn log_event(event: &PlayerEvent) {
    match event {
        PlayerEvent::Error(e) => error!("{}", e),
        PlayerEvent::TracksChanged(tracks) => info!("Tracks changed: {} tracks", tracks.len()),
        PlayerEvent::MediaItemTransition(media) => info!("Now playing: {}", media.id),
        other => info!("{:?}", other),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(level) = &args.log_level {
        config.log.level = level.clone();
    }

    let _log_guard = logging_setup::init(&config.log)?;
    info!("Playkit {} starting", env!("CARGO_PKG_VERSION"));

    let player = Player::new(create_engine()?, config.player)?;
    player.add_listener(Arc::new(log_event));

    if let Some(wid) = args.wid {
        player.attach_surface(Some(RenderTarget::new(wid)))?;
    }
    if let Some(uri) = args.media {
        player.load_media(MediaDescriptor::new(uri.clone(), uri), args.start)?;
        player.play()?;
    }

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let result = repl::run(&player, stdin.lock(), &mut stdout);

    player.release();
    drop(player);
    info!("Playkit stopped");
    result
}
