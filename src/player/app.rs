//! Main application state and control flow for the player.
//!
//! The app owns the playback coordinator, the background loader and the file
//! picker. The event loop drains finished loads, keeps every lane surface the
//! size of its on-screen area, delivers due frames from the `FrameClock` to
//! the coordinator, draws, and then waits for input no longer than the time
//! left until the next frame.

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::info;
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use std::{
    error::Error,
    io,
    path::PathBuf,
    time::{Duration, Instant},
};
use tracklane::config::{Config, Theme};
use tracklane::coordinator::PlaybackCoordinator;
use tracklane::error::TrackError;
use tracklane::frame::FrameClock;
use tracklane::loader::{EnvelopeLoader, LoadOutcome};
use tracklane::media::FileDecoder;
use tracklane::registry::TrackId;

use super::audio::{AudioOutput, SinkHandle};
use super::browser::Browser;
use super::lane::LaneSurface;
use super::ui;

/// Input wait while no frame is scheduled
const IDLE_POLL: Duration = Duration::from_millis(100);
/// How long notices stay in the status line
const STATUS_TIMEOUT: Duration = Duration::from_secs(4);

pub type Coordinator = PlaybackCoordinator<SinkHandle, LaneSurface, FrameClock>;

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Normal,
    Rename { id: TrackId, buffer: String },
}

pub struct App {
    pub should_quit: bool,
    pub config: Config,
    pub theme: Theme,
    pub coordinator: Coordinator,
    pub browser: Browser,
    pub selected: usize,
    pub mode: Mode,
    pub status: Option<String>,
    status_timer: Option<Instant>,
    output: Option<AudioOutput>,
    loader: EnvelopeLoader<FileDecoder>,
    screen: Rect,
}

impl App {
    pub fn new(config: Config) -> Self {
        let theme = config.theme;
        Self {
            should_quit: false,
            coordinator: PlaybackCoordinator::new(
                FrameClock::new(config.frame_interval()),
                theme.palette(),
            ),
            config,
            theme,
            browser: Browser::new(),
            selected: 0,
            mode: Mode::Normal,
            status: None,
            status_timer: None,
            output: None,
            loader: EnvelopeLoader::new(FileDecoder),
            screen: Rect::default(),
        }
    }

    pub fn attach_output(&mut self, output: AudioOutput) {
        self.output = Some(output);
    }

    pub fn pending_loads(&self) -> usize {
        self.loader.pending()
    }

    pub fn is_playing(&self) -> bool {
        self.coordinator.is_running()
    }

    pub fn selected_id(&self) -> Option<TrackId> {
        self.coordinator.tracks().get(self.selected).map(|t| t.id())
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
        self.status_timer = Some(Instant::now());
    }

    fn expire_status(&mut self) {
        if let Some(timer) = self.status_timer
            && timer.elapsed() > STATUS_TIMEOUT
        {
            self.status = None;
            self.status_timer.take();
        }
    }

    pub fn request_load(&mut self, path: PathBuf) {
        self.set_status(format!("Loading {}...", path.display()));
        self.loader.request(path);
    }

    /// Turn finished loads into tracks
    pub fn poll_loads(&mut self) {
        for outcome in self.loader.poll() {
            self.handle_load(outcome);
        }
    }

    fn handle_load(&mut self, outcome: LoadOutcome) {
        let loaded = match outcome.result {
            Ok(loaded) => loaded,
            Err(e) => {
                self.set_status(format!("Could not load {}: {e}", outcome.path.display()));
                return;
            }
        };
        let Some(output) = &self.output else {
            self.set_status("No audio output available");
            return;
        };

        let handle = output.handle(loaded.audio, self.config.default_volume);
        let body = self.lane_bodies(self.coordinator.tracks().len() + 1);
        let (cols, rows) = body
            .last()
            .map(|r| (r.width, r.height))
            .unwrap_or((0, 0));
        let name = loaded.name.clone();
        self.coordinator
            .add_track(loaded.name, handle, LaneSurface::new(cols, rows), loaded.envelope);
        // Lanes above the new one may have shrunk
        self.fit_lanes();
        self.set_status(format!("Added {name}"));
    }

    fn lane_bodies(&self, count: usize) -> Vec<Rect> {
        let screen = ui::screen_layout(self.screen);
        ui::lane_slots(screen.lanes, count)
            .into_iter()
            .map(|slot| slot.body)
            .collect()
    }

    /// Record the terminal size and resize lanes to match
    pub fn set_screen(&mut self, screen: Rect) {
        if self.screen != screen {
            self.screen = screen;
            self.fit_lanes();
        }
    }

    /// Size every lane surface to its slot; repaint if anything changed
    fn fit_lanes(&mut self) {
        let bodies = self.lane_bodies(self.coordinator.tracks().len());
        let mut changed = false;
        for (track, body) in self.coordinator.tracks_mut().zip(bodies) {
            changed |= track.surface.fit(body.width, body.height);
        }
        // Layout repaint of the resized lanes, not a loop frame; a running
        // loop repaints on its next frame anyway
        if changed && !self.coordinator.is_running() {
            self.coordinator.refresh();
        }
    }

    /// Deliver the pending frame if it is due
    pub fn tick(&mut self, now: Instant) {
        if let Some(token) = self.coordinator.scheduler_mut().take_due(now) {
            self.coordinator.on_frame(token);
        }
    }

    /// How long the event loop may block waiting for input
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        self.coordinator
            .scheduler()
            .time_until_due(now)
            .unwrap_or(IDLE_POLL)
            .min(IDLE_POLL)
    }

    pub fn toggle_playback(&mut self) {
        if self.coordinator.tracks().is_empty() {
            return;
        }
        if self.coordinator.is_running() {
            self.coordinator.pause_all();
            info!("Paused");
        } else {
            self.coordinator.play_all();
            info!("Playing {} tracks", self.coordinator.tracks().len());
        }
    }

    pub fn seek_by(&mut self, delta: f64) {
        let Some(track) = self.coordinator.tracks().get(self.selected) else {
            return;
        };
        let ratio = track.playback_ratio() + delta;
        self.coordinator.seek(ratio);
    }

    pub fn select_next(&mut self) {
        let count = self.coordinator.tracks().len();
        if count > 0 {
            self.selected = (self.selected + 1) % count;
        }
    }

    pub fn select_previous(&mut self) {
        let count = self.coordinator.tracks().len();
        if count > 0 {
            self.selected = (self.selected + count - 1) % count;
        }
    }

    pub fn remove_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        match self.coordinator.remove_track(id) {
            Ok(track) => {
                self.set_status(format!("Removed {}", track.name));
                let count = self.coordinator.tracks().len();
                if self.selected >= count {
                    self.selected = count.saturating_sub(1);
                }
                self.fit_lanes();
            }
            Err(e) => log_stale(e),
        }
    }

    pub fn adjust_volume(&mut self, delta: f32) {
        let Some(id) = self.selected_id() else {
            return;
        };
        if let Err(e) = self.coordinator.adjust_volume(id, delta) {
            log_stale(e);
        }
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        self.coordinator.set_palette(self.theme.palette());
        // Repaint in the new colors at the current position; no frame is scheduled
        if !self.coordinator.is_running() {
            self.coordinator.refresh();
        }
    }

    pub fn start_rename(&mut self) {
        if let Some(track) = self.coordinator.tracks().get(self.selected) {
            self.mode = Mode::Rename {
                id: track.id(),
                buffer: track.name.clone(),
            };
        }
    }

    pub fn finish_rename(&mut self) {
        if let Mode::Rename { id, buffer } = std::mem::replace(&mut self.mode, Mode::Normal) {
            let name = buffer.trim().to_string();
            if name.is_empty() {
                return;
            }
            if let Err(e) = self.coordinator.rename_track(id, name) {
                log_stale(e);
            }
        }
    }

    pub fn open_browser(&mut self) {
        let root = self.config.scan_path();
        if let Err(e) = self.browser.open(&root) {
            self.set_status(format!("Cannot browse {}: {e}", root.display()));
        }
    }

    /// Seek all tracks from a left click inside a lane body
    pub fn click(&mut self, column: u16, row: u16) {
        let bodies = self.lane_bodies(self.coordinator.tracks().len());
        let hit = bodies.iter().enumerate().find(|(_, body)| {
            column >= body.x
                && column < body.x + body.width
                && row >= body.y
                && row < body.y + body.height
        });
        let Some((index, body)) = hit else {
            return;
        };
        let Some(id) = self.coordinator.tracks().get(index).map(|t| t.id()) else {
            return;
        };
        self.selected = index;
        // Click the middle of the cell so the last column reaches the end
        let offset = (column - body.x) as f64 + 0.5;
        if let Err(e) = self.coordinator.seek_from_click(id, offset) {
            log_stale(e);
        }
    }
}

fn log_stale(e: TrackError) {
    log::debug!("Ignoring operation on removed track: {e}");
}

pub fn run(files: &[PathBuf]) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    init_logging(&config)?;
    info!("Starting tracklane player");

    let mut app = App::new(config);
    app.attach_output(AudioOutput::open_default()?);
    for file in files {
        app.request_load(file.clone());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = &res {
        eprintln!("Error: {e}");
    }
    res
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    loop {
        let size = terminal.size()?;
        app.set_screen(Rect::new(0, 0, size.width, size.height));
        app.poll_loads();
        app.tick(Instant::now());
        app.expire_status();

        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(app.poll_timeout(Instant::now()))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key_event(app, key)?
                }
                Event::Mouse(mouse) => handle_mouse_event(app, mouse),
                _ => {}
            }
        }

        if app.should_quit {
            app.coordinator.pause_all();
            return Ok(());
        }
    }
}

fn handle_key_event(app: &mut App, key: event::KeyEvent) -> Result<(), Box<dyn Error>> {
    if app.browser.is_active {
        handle_browser_keys(app, key);
    } else if matches!(app.mode, Mode::Rename { .. }) {
        handle_rename_keys(app, key);
    } else {
        handle_player_keys(app, key);
    }
    Ok(())
}

fn handle_browser_keys(app: &mut App, key: event::KeyEvent) {
    match key.code {
        KeyCode::Esc => app.browser.close(),
        KeyCode::Up => app.browser.select_previous(),
        KeyCode::Down => app.browser.select_next(),
        KeyCode::Enter => {
            if let Some(path) = app.browser.selected_path().map(|p| p.to_path_buf()) {
                app.browser.close();
                app.request_load(path);
            }
        }
        KeyCode::Backspace => app.browser.pop_char(),
        KeyCode::Char('u') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
            app.browser.clear_query();
        }
        KeyCode::Char(c) => app.browser.push_char(c),
        _ => {}
    }
}

fn handle_rename_keys(app: &mut App, key: event::KeyEvent) {
    match key.code {
        KeyCode::Esc => app.mode = Mode::Normal,
        KeyCode::Enter => app.finish_rename(),
        KeyCode::Backspace => {
            if let Mode::Rename { buffer, .. } = &mut app.mode {
                buffer.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Mode::Rename { buffer, .. } = &mut app.mode {
                buffer.push(c);
            }
        }
        _ => {}
    }
}

fn handle_player_keys(app: &mut App, key: event::KeyEvent) {
    let seek_step = app.config.seek_step as f64;
    let volume_step = app.config.volume_step;
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char(' ') | KeyCode::Char('p') => app.toggle_playback(),
        KeyCode::Char('a') | KeyCode::Char('/') => app.open_browser(),
        KeyCode::Char('x') | KeyCode::Delete => app.remove_selected(),
        KeyCode::Char('r') => app.start_rename(),
        KeyCode::Char('d') => app.toggle_theme(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_volume(volume_step),
        KeyCode::Char('-') => app.adjust_volume(-volume_step),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Left => app.seek_by(-seek_step),
        KeyCode::Right => app.seek_by(seek_step),
        KeyCode::Home => app.coordinator.seek(0.0),
        _ => {}
    }
}

fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    if app.browser.is_active || !matches!(app.mode, Mode::Normal) {
        return;
    }
    if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
        app.click(mouse.column, mouse.row);
    }
}

fn init_logging(config: &Config) -> Result<(), Box<dyn Error>> {
    use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
    use std::fs::File;

    let log_path = config.log_path();
    WriteLogger::init(
        LevelFilter::Debug,
        ConfigBuilder::new()
            .add_filter_allow_str("tracklane")
            .build(),
        File::create(&log_path)?,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new(Config::new())
    }

    #[test]
    fn test_new_app_initial_state() {
        let app = app();

        assert!(!app.should_quit);
        assert!(!app.is_playing());
        assert!(app.coordinator.tracks().is_empty());
        assert_eq!(app.selected, 0);
        assert_eq!(app.mode, Mode::Normal);
        assert!(app.status.is_none());
        assert!(!app.browser.is_active);
        assert_eq!(app.theme, Theme::Light);
        assert_eq!(app.pending_loads(), 0);
    }

    #[test]
    fn test_toggle_playback_without_tracks_stays_idle() {
        let mut app = app();
        app.toggle_playback();
        assert!(!app.is_playing());
        assert!(!app.coordinator.scheduler().is_pending());
    }

    #[test]
    fn test_selection_without_tracks() {
        let mut app = app();
        app.select_next();
        app.select_previous();
        assert_eq!(app.selected, 0);
        assert!(app.selected_id().is_none());
        // Operations on nothing are no-ops
        app.remove_selected();
        app.adjust_volume(0.1);
        app.start_rename();
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn test_toggle_theme_switches_palette() {
        let mut app = app();
        app.toggle_theme();
        assert_eq!(app.theme, Theme::Dark);
        assert_eq!(*app.coordinator.palette(), Theme::Dark.palette());
        app.toggle_theme();
        assert_eq!(app.theme, Theme::Light);
    }

    #[test]
    fn test_failed_load_sets_status() {
        let mut app = app();
        app.handle_load(LoadOutcome {
            path: PathBuf::from("broken.wav"),
            result: Err(TrackError::Decode("bad header".to_string())),
        });
        assert!(app.coordinator.tracks().is_empty());
        let status = app.status.clone().unwrap();
        assert!(status.contains("broken.wav"));
        assert!(status.contains("bad header"));
    }

    #[test]
    fn test_poll_timeout_when_idle() {
        let app = app();
        assert_eq!(app.poll_timeout(Instant::now()), IDLE_POLL);
    }

    #[test]
    fn test_rename_keys_edit_buffer() {
        let mut app = app();
        app.mode = Mode::Rename {
            id: TrackId::from_u64(42),
            buffer: "ab".to_string(),
        };
        handle_rename_keys(&mut app, event::KeyEvent::from(KeyCode::Backspace));
        handle_rename_keys(&mut app, event::KeyEvent::from(KeyCode::Char('z')));
        assert!(matches!(&app.mode, Mode::Rename { buffer, .. } if buffer == "az"));

        // Renaming a track that no longer exists just leaves rename mode
        handle_rename_keys(&mut app, event::KeyEvent::from(KeyCode::Enter));
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn test_quit_key() {
        let mut app = app();
        handle_player_keys(&mut app, event::KeyEvent::from(KeyCode::Char('q')));
        assert!(app.should_quit);
    }
}
