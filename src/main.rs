//! Keyclack - typing practice on an animated keyboard
//!
//! Every keystroke presses a spring-animated key, advances the typing test
//! and plays the matching sample from a mechanical switch sound pack.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keyclack::config::Config;
use keyclack::constants::{
    APP_BINARY_NAME, APP_NAME, DEFAULT_PACK_IDS, MAX_WORDS_LIMIT, TIMER_CHOICES_SECS,
};
use keyclack::pipeline::Pipeline;
use keyclack::session::SessionController;
use keyclack::sound::{
    AudioBackend, DirAssetSource, KeyCodeTable, NullBackend, PackLoader, SoundEngine,
};
use keyclack::tui::{self, App};
use keyclack::typing::TypingEngine;

/// Keyclack - typing practice with mechanical keyboard sounds
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Sound packs directory, one subdirectory per pack.
    /// Defaults to `key_sounds` in the config directory.
    #[arg(long, value_name = "DIR")]
    packs_dir: Option<PathBuf>,

    /// Sound pack to start with (overrides the saved choice)
    #[arg(short, long, value_name = "ID")]
    pack: Option<String>,

    /// Words kept in the typing queue
    #[arg(short, long, value_name = "N")]
    words: Option<usize>,

    /// Start with the timer armed for this many seconds (15, 30 or 60)
    #[arg(short, long, value_name = "SECS")]
    timer: Option<u64>,

    /// Key code table overriding the embedded one
    #[arg(long, value_name = "FILE")]
    keycodes: Option<PathBuf>,

    /// List the sound packs found and exit
    #[arg(long)]
    list_packs: bool,

    /// Run without audio output
    #[arg(long)]
    mute: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Everything the app needs except the audio backend.
struct Setup {
    config: Config,
    config_path: Option<PathBuf>,
    key_codes: KeyCodeTable,
    source: Arc<DirAssetSource>,
    pack_ids: Vec<String>,
    start_pack: Option<String>,
    words: usize,
    timer: Option<Duration>,
}

/// Logs to a file in the config directory; the terminal belongs to the UI.
fn init_logging(verbose: bool) -> Result<PathBuf> {
    let log_dir = Config::config_dir()?;
    fs::create_dir_all(&log_dir).context(format!(
        "Failed to create log directory: {}",
        log_dir.display()
    ))?;

    let log_path = log_dir.join(format!("{APP_BINARY_NAME}.log"));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context(format!("Failed to open log file: {}", log_path.display()))?;

    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();

    Ok(log_path)
}

fn prepare(cli: &Cli) -> Result<Setup> {
    let config_path = Config::config_file_path().ok();
    let config = match &config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::new(),
    };

    let words = cli.words.unwrap_or(config.typing.max_words);
    if !(1..=MAX_WORDS_LIMIT).contains(&words) {
        anyhow::bail!("--words must be between 1 and {MAX_WORDS_LIMIT}, got {words}");
    }

    let timer = match cli.timer {
        Some(secs) if !TIMER_CHOICES_SECS.contains(&secs) => {
            anyhow::bail!("--timer must be one of {TIMER_CHOICES_SECS:?}, got {secs}")
        }
        Some(secs) => Some(Duration::from_secs(secs)),
        None => None,
    };

    let key_codes = match cli.keycodes.as_ref().or(config.paths.keycodes.as_ref()) {
        Some(path) => KeyCodeTable::from_file(path)?,
        None => KeyCodeTable::load_embedded()?,
    };

    let packs_dir = match &cli.packs_dir {
        Some(dir) => dir.clone(),
        None => config.sound_packs_dir()?,
    };
    let source = Arc::new(DirAssetSource::new(packs_dir));

    let pack_ids = match source.discover_packs() {
        Ok(ids) if !ids.is_empty() => ids,
        Ok(_) => DEFAULT_PACK_IDS.iter().map(ToString::to_string).collect(),
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "Falling back to the default pack list");
            DEFAULT_PACK_IDS.iter().map(ToString::to_string).collect()
        }
    };

    let start_pack = cli
        .pack
        .clone()
        .or_else(|| config.preferences.sound_pack.clone());

    Ok(Setup {
        config,
        config_path,
        key_codes,
        source,
        pack_ids,
        start_pack,
        words,
        timer,
    })
}

fn list_packs(setup: Setup) {
    let mut engine = SoundEngine::new(NullBackend, setup.key_codes);
    engine.load_catalog(setup.source.as_ref(), &setup.pack_ids);

    println!("Sound packs in {}:", setup.source.root().display());
    if engine.catalog().is_empty() {
        println!("  (none)");
        return;
    }

    let default = engine.default_pack_id();
    for entry in engine.catalog() {
        let marker = if Some(entry.id.as_str()) == default {
            " (default)"
        } else {
            ""
        };
        println!(
            "  {:<24} {} [{}]{marker}",
            entry.id,
            entry.display_name(),
            entry.manifest.key_define_type
        );
    }
}

fn launch<B: AudioBackend>(backend: B, setup: Setup) -> Result<()> {
    let Setup {
        config,
        config_path,
        key_codes,
        source,
        pack_ids,
        start_pack,
        words,
        timer,
    } = setup;

    let mut sound = SoundEngine::new(backend, key_codes);
    sound.load_catalog(source.as_ref(), &pack_ids);

    // A saved or requested pack that no longer loads falls back to the default.
    let start_pack = start_pack
        .filter(|id| sound.catalog().iter().any(|entry| &entry.id == id))
        .or_else(|| sound.default_pack_id().map(ToString::to_string));

    let typing = TypingEngine::new(words, config.typing.backspace_policy);
    let mut pipeline = Pipeline::new(typing, sound, SessionController::new(config.timer_limit()));
    if let Some(limit) = timer {
        pipeline.toggle_timer(limit);
    }

    let mut app = App::new(pipeline, PackLoader::new(source), config, config_path);
    if let Some(id) = start_pack {
        app.select_pack(&id);
    }

    let mut terminal = tui::setup_terminal()?;
    let release_events = tui::enable_release_events();
    app.set_release_events(release_events);
    tracing::info!(release_events, "Terminal ready");

    let result = tui::run(&mut terminal, &mut app);

    tui::restore_terminal(terminal, release_events)?;

    result
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(err) = init_logging(cli.verbose) {
        eprintln!("Warning: logging disabled: {err:#}");
    }
    tracing::info!("{} v{} starting", APP_NAME, env!("CARGO_PKG_VERSION"));

    let setup = prepare(&cli)?;

    if cli.list_packs {
        list_packs(setup);
        return Ok(());
    }

    #[cfg(feature = "audio")]
    if !cli.mute {
        match keyclack::sound::RodioBackend::new() {
            Ok(backend) => return launch(backend, setup),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "No audio output, running silent");
            }
        }
    }

    launch(NullBackend, setup)
}
