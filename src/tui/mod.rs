//! Terminal user interface.
//!
//! Draws the keyboard, the typing panel and a status bar with ratatui and
//! feeds crossterm input into the [`Pipeline`].

// Allow intentional type casts for terminal UI coordinates
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

pub mod input;
pub mod keyboard;
pub mod status_bar;
pub mod typing;

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyboardEnhancementFlags,
        MouseEventKind, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::Block,
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::constants::TIMER_CHOICES_SECS;
use crate::models::KeyEvent;
use crate::pipeline::Pipeline;
use crate::sound::{AudioBackend, PackLoader, SelectOutcome, Selection};
use crate::typing::BackspacePolicy;

pub use input::{translate_key, Command, InputAction};
pub use keyboard::{KeyboardViewport, KeyboardWidget};
pub use status_bar::StatusBar;
pub use typing::TypingWidget;

/// Animation step; key springs advance once per interval.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Hold time after which a key is released when the terminal reports no
/// key releases.
pub const SYNTHETIC_RELEASE: Duration = Duration::from_millis(120);

/// Volume change per key press.
const VOLUME_STEP: f32 = 0.05;

/// Application state for the terminal front end.
pub struct App<B: AudioBackend> {
    pipeline: Pipeline<B>,
    loader: PackLoader,
    config: Config,
    /// Where preference changes are saved; `None` keeps them in memory
    config_path: Option<PathBuf>,
    viewport: Option<KeyboardViewport>,
    /// Keys pressed without a release event yet, with their press time
    held: Vec<(KeyEvent, Instant)>,
    release_events: bool,
    frame_debt: Duration,
    status_message: String,
    should_quit: bool,
}

impl<B: AudioBackend> App<B> {
    /// Creates the app and applies the configured theme and volume.
    pub fn new(
        mut pipeline: Pipeline<B>,
        loader: PackLoader,
        config: Config,
        config_path: Option<PathBuf>,
    ) -> Self {
        let preferences = &config.preferences;
        pipeline.apply_theme(preferences.special_key_color, preferences.normal_key_color);
        pipeline.sound_mut().set_volume(preferences.sound_volume);
        pipeline
            .typing_mut()
            .set_backspace_policy(config.typing.backspace_policy);

        Self {
            pipeline,
            loader,
            config,
            config_path,
            viewport: None,
            held: Vec::new(),
            release_events: false,
            frame_debt: Duration::ZERO,
            status_message: String::new(),
            should_quit: false,
        }
    }

    /// Tells the app whether the terminal reports key releases.
    pub fn set_release_events(&mut self, enabled: bool) {
        self.release_events = enabled;
    }

    /// Starts switching to a catalog pack in the background.
    pub fn select_pack(&mut self, id: &str) {
        match self.pipeline.sound_mut().begin_selection(id) {
            Ok(Selection::Cached) => self.pack_applied(id.to_string()),
            Ok(Selection::Fetch(ticket)) => {
                self.status_message = format!("Loading sound pack '{id}'...");
                self.loader.start(ticket);
            }
            Err(err) => {
                tracing::warn!(error = %err.report(), "Cannot select sound pack");
                self.status_message = err.to_string();
            }
        }
    }

    /// Handles one terminal event.
    pub fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Key(key) => match translate_key(&key) {
                InputAction::Command(command) => self.run_command(command),
                InputAction::KeyDown(key) => self.key_down(key, now),
                InputAction::KeyUp(key) => {
                    self.held.retain(|(held, _)| *held != key);
                    self.pipeline.key_up(key);
                }
                InputAction::Ignore => {}
            },
            Event::Mouse(mouse) => {
                if matches!(mouse.kind, MouseEventKind::Moved | MouseEventKind::Drag(_)) {
                    let ray = self
                        .viewport
                        .and_then(|viewport| viewport.ray_at(mouse.column, mouse.row));
                    self.pipeline.pointer_moved(ray);
                }
            }
            Event::FocusLost => {
                self.pipeline.pointer_moved(None);
            }
            _ => {}
        }
    }

    fn key_down(&mut self, key: KeyEvent, now: Instant) {
        self.status_message.clear();
        self.pipeline.key_down(key);

        if !self.release_events {
            self.held.retain(|(held, _)| *held != key);
            self.held.push((key, now));
        }
    }

    fn run_command(&mut self, command: Command) {
        match command {
            Command::Quit => self.should_quit = true,
            Command::NextPack => self.next_pack(),
            Command::VolumeDown => self.change_volume(-VOLUME_STEP),
            Command::VolumeUp => self.change_volume(VOLUME_STEP),
            Command::CycleTimerLength => {
                let current = self.config.timer.default_secs;
                let next = TIMER_CHOICES_SECS
                    .iter()
                    .position(|secs| *secs == current)
                    .map_or(TIMER_CHOICES_SECS[0], |idx| {
                        TIMER_CHOICES_SECS[(idx + 1) % TIMER_CHOICES_SECS.len()]
                    });
                self.config.timer.default_secs = next;
                if self.pipeline.session().is_active() {
                    // Re-arm with the new length.
                    self.pipeline.toggle_timer(self.config.timer_limit());
                    self.pipeline.toggle_timer(self.config.timer_limit());
                }
                self.status_message = format!("Timer length: {next}s");
                self.persist();
            }
            Command::ToggleTimer => {
                let armed = self.pipeline.toggle_timer(self.config.timer_limit());
                self.held.clear();
                self.status_message = if armed {
                    format!("Timer armed: {}s", self.config.timer.default_secs)
                } else {
                    "Timer off".to_string()
                };
            }
            Command::Restart => {
                self.pipeline.restart();
                self.held.clear();
                self.status_message = "New session".to_string();
            }
            Command::ToggleBackspacePolicy => {
                let policy = match self.pipeline.typing().backspace_policy() {
                    BackspacePolicy::StayInWord => BackspacePolicy::CrossWordBoundary,
                    BackspacePolicy::CrossWordBoundary => BackspacePolicy::StayInWord,
                };
                self.pipeline.typing_mut().set_backspace_policy(policy);
                self.config.typing.backspace_policy = policy;
                self.status_message = format!("Backspace: {policy}");
                self.persist();
            }
        }
    }

    fn next_pack(&mut self) {
        let sound = self.pipeline.sound();
        let catalog = sound.catalog();
        if catalog.is_empty() {
            self.status_message = "No sound packs found".to_string();
            return;
        }

        let current = self
            .config
            .preferences
            .sound_pack
            .as_deref()
            .or_else(|| sound.active_pack_id());
        let next = current
            .and_then(|id| catalog.iter().position(|entry| entry.id == id))
            .map_or(0, |idx| (idx + 1) % catalog.len());
        let id = catalog[next].id.clone();

        self.config.preferences.sound_pack = Some(id.clone());
        self.select_pack(&id);
    }

    fn change_volume(&mut self, delta: f32) {
        let sound = self.pipeline.sound_mut();
        // Round to whole percent so repeated steps land on even values.
        let volume = ((sound.volume() + delta) * 100.0).round() / 100.0;
        sound.set_volume(volume);

        let volume = sound.volume();
        self.config.set_sound_volume(volume);
        self.status_message = format!("Volume: {:.0}%", volume * 100.0);
        self.persist();
    }

    /// Advances background loading, synthetic releases and animation.
    pub fn on_frame(&mut self, dt: Duration, now: Instant) {
        while let Some(fetched) = self.loader.poll() {
            let id = fetched.pack_id().to_string();
            match self.pipeline.sound_mut().complete_selection(fetched) {
                SelectOutcome::Applied => self.pack_applied(id),
                SelectOutcome::Stale => {}
                SelectOutcome::Failed(err) => {
                    self.status_message = format!("Sound pack '{id}' failed: {err}");
                }
            }
        }

        let pipeline = &mut self.pipeline;
        self.held.retain(|(key, pressed_at)| {
            if now.saturating_duration_since(*pressed_at) >= SYNTHETIC_RELEASE {
                pipeline.key_up(*key);
                false
            } else {
                true
            }
        });

        self.frame_debt += dt;
        while self.frame_debt >= FRAME_INTERVAL {
            self.frame_debt -= FRAME_INTERVAL;
            if let Some(summary) = self.pipeline.frame(FRAME_INTERVAL) {
                self.status_message = format!(
                    "Time! {:.0} wpm, {:.1}% accuracy",
                    summary.wpm, summary.accuracy
                );
            }
        }
    }

    fn pack_applied(&mut self, id: String) {
        let name = self
            .pipeline
            .sound()
            .active_pack()
            .map_or_else(|| id.clone(), |pack| pack.display_name().to_string());
        self.status_message = format!("Sound pack: {name}");
        self.config.preferences.sound_pack = Some(id);
        self.persist();
    }

    fn persist(&mut self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(err) = self.config.save_to(path) {
            tracing::warn!(error = %format!("{err:#}"), "Failed to save preferences");
            self.status_message = format!("Failed to save preferences: {err}");
        }
    }

    /// The feedback pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &Pipeline<B> {
        &self.pipeline
    }

    /// Current configuration, including unsaved changes.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Last status message; empty when there is none.
    #[must_use]
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// True while a pack switch is loading.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    /// True once the user asked to quit.
    #[must_use]
    pub const fn should_quit(&self) -> bool {
        self.should_quit
    }
}

/// Sets up the terminal for TUI rendering.
pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Keyboard protocol flags requested where supported: releases, bare
/// modifier presses and shifted characters.
pub const KEYBOARD_FLAGS: KeyboardEnhancementFlags = KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
    .union(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    .union(KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES)
    .union(KeyboardEnhancementFlags::REPORT_ALTERNATE_KEYS);

/// Asks the terminal to report key releases and modifier keys.
///
/// Returns false if the terminal cannot; keys are then released on a timer.
pub fn enable_release_events() -> bool {
    if !matches!(supports_keyboard_enhancement(), Ok(true)) {
        return false;
    }
    execute!(io::stdout(), PushKeyboardEnhancementFlags(KEYBOARD_FLAGS)).is_ok()
}

/// Restores the terminal to normal mode.
pub fn restore_terminal(
    mut terminal: Terminal<CrosstermBackend<io::Stdout>>,
    release_events: bool,
) -> Result<()> {
    if release_events {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("Failed to restore keyboard mode")?;
    }
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Main TUI event loop.
pub fn run<B: AudioBackend>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<B>,
) -> Result<()> {
    let mut last_frame = Instant::now();

    while !app.should_quit() {
        let mut viewport = None;
        terminal.draw(|f| viewport = Some(render(f, app)))?;
        app.viewport = viewport;

        if event::poll(FRAME_INTERVAL)? {
            let event = event::read()?;
            app.handle_event(event, Instant::now());
        }

        let now = Instant::now();
        app.on_frame(now.saturating_duration_since(last_frame), now);
        last_frame = now;
    }

    Ok(())
}

/// Renders the whole screen and returns the keyboard viewport.
fn render<B: AudioBackend>(f: &mut Frame, app: &App<B>) -> KeyboardViewport {
    let preferences = &app.config.preferences;
    let layout = app.pipeline.layout();

    let background =
        Block::default().style(Style::default().bg(preferences.background_color.to_ratatui_color()));
    f.render_widget(background, f.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),                                // Typing panel
            Constraint::Length(KeyboardWidget::height(layout)), // Keyboard
            Constraint::Length(3),                             // Status bar
        ])
        .split(f.area());

    TypingWidget::render(
        f,
        chunks[0],
        app.pipeline.typing(),
        app.pipeline.session(),
        preferences,
    );
    let viewport = KeyboardWidget::render(f, chunks[1], layout, app.pipeline.keyboard(), preferences);
    StatusBar::render(f, chunks[2], app);

    viewport
}
