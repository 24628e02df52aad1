mod ui;

use std::{
    cell::Cell,
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    rc::Rc,
    sync::mpsc,
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Position, Rect},
    Terminal,
};
use reflex::{
    app_dirs::AppDirs,
    celebration::Celebration,
    clock::{Clock, SystemClock},
    config::{Config, ConfigStore, FileConfigStore},
    feedback::TerminalFeedback,
    history::HistoryLog,
    records::Records,
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    store::{KvStore, MemoryStore, SqliteStore},
    summary::SessionSummary,
    Difficulty, Engine, EngineEvent,
};

/// reaction-time trainer: wait for green, then click
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A reaction-time trainer for the terminal. Wait for the panel to turn green, then press space or click it. Timed sessions, three difficulty levels, best-time tracking and a local leaderboard."
)]
pub struct Cli {
    /// length of a session in seconds
    #[clap(short = 's', long)]
    secs: Option<u32>,

    /// how long and how unpredictable the wait before green is
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// disable the terminal bell cues
    #[clap(short = 'm', long)]
    mute: bool,

    /// name recorded when saving to the leaderboard
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// remember these settings as the new defaults
    #[clap(long)]
    save: bool,
}

impl Cli {
    /// Layers the command line over the stored configuration
    fn apply(&self, config: &mut Config) {
        if let Some(secs) = self.secs {
            config.duration_secs = secs.max(1);
        }
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if self.mute {
            config.muted = true;
        }
        if let Some(name) = &self.name {
            config.player_name = Some(name.clone());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App<C: Clock> {
    pub engine: Engine<C>,
    pub records: Records,
    pub history: Option<HistoryLog>,
    pub config: Config,
    pub celebration: Celebration,
    pub last_summary: Option<SessionSummary>,
    pub area: Rect,
    events: mpsc::Receiver<EngineEvent>,
    celebration_requests: Rc<Cell<u32>>,
    celebrations_seen: u32,
}

impl<C: Clock> App<C> {
    pub fn new(
        config: Config,
        clock: C,
        store: Box<dyn KvStore>,
        history: Option<HistoryLog>,
    ) -> Self {
        let mut engine = Engine::new(config.engine_config(), clock);

        let feedback = TerminalFeedback::new();
        let celebration_requests = feedback.celebrations();
        engine.set_feedback(Box::new(feedback));
        engine.set_muted(config.muted);

        let records = Records::load(store);
        engine.set_best_time(records.best_time());

        let (tx, events) = mpsc::channel();
        engine.subscribe(move |ev| {
            let _ = tx.send(ev.clone());
        });

        Self {
            engine,
            records,
            history,
            config,
            celebration: Celebration::new(),
            last_summary: None,
            area: Rect::new(0, 0, 80, 24),
            events,
            celebration_requests,
            celebrations_seen: 0,
        }
    }

    /// "Start" when no session is running, "Next" otherwise
    pub fn start_or_next(&mut self) {
        if self.engine.session_active() {
            self.engine.start_round();
        } else {
            self.last_summary = None;
            self.engine.start_session(self.config.session_config());
        }
        self.drain_events();
    }

    pub fn click(&mut self) {
        self.engine.on_click();
        self.drain_events();
    }

    pub fn tick(&mut self) {
        self.engine.tick();
        self.drain_events();
        self.celebration.update();
    }

    pub fn reset(&mut self) {
        self.engine.reset();
        self.last_summary = None;
        self.drain_events();
    }

    pub fn cycle_difficulty(&mut self) {
        let next = self.engine.difficulty().next();
        self.engine.set_difficulty(next);
        self.config.difficulty = next;
    }

    pub fn toggle_mute(&mut self) {
        self.config.muted = !self.config.muted;
        self.engine.set_muted(self.config.muted);
    }

    pub fn save_best(&mut self) {
        let entry = self.records.save_best(self.config.player_name.as_deref());
        log::info!("saved {} ms for {}", entry.score, entry.name);
    }

    /// Routes engine events to the records, the history log and the UI.
    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.records.observe(&event);
            match &event {
                EngineEvent::RoundResolved(result) => {
                    if let Some(history) = &self.history {
                        if let Err(e) = history.append(result) {
                            log::warn!("could not append history: {}", e);
                        }
                    }
                }
                EngineEvent::SessionEnded(summary) => {
                    self.last_summary = Some(summary.clone());
                }
                _ => {}
            }
        }

        let requested = self.celebration_requests.get();
        if requested != self.celebrations_seen {
            self.celebrations_seen = requested;
            if let Some(best) = self.engine.best_time() {
                self.celebration
                    .start(self.area.width, self.area.height, best);
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Char(' ') | KeyCode::Enter => self.click(),
            KeyCode::Char('s') => self.start_or_next(),
            KeyCode::Char('r') => self.reset(),
            KeyCode::Char('p') => {
                self.engine.toggle_pause();
                self.drain_events();
            }
            KeyCode::Char('d') => self.cycle_difficulty(),
            KeyCode::Char('m') => self.toggle_mute(),
            KeyCode::Char('b') => self.save_best(),
            KeyCode::Char('c') => self.records.clear_leaderboard(),
            _ => {}
        }
        Flow::Continue
    }

    pub fn handle_click(&mut self, column: u16, row: u16) {
        if ui::panel_rect(self.area).contains(Position::new(column, row)) {
            self.click();
        }
    }

    pub fn shutdown(self) {
        self.engine.destroy();
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .target(env_logger::Target::Pipe(Box::new(file)))
            .try_init();
    }
}

fn open_store() -> Box<dyn KvStore> {
    match SqliteStore::new() {
        Ok(store) => Box::new(store),
        Err(e) => {
            log::warn!("records store unavailable, keeping scores in memory: {}", e);
            Box::new(MemoryStore::new())
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    cli.apply(&mut config);
    if cli.save {
        config_store.save(&config)?;
    }
    log::info!("starting with {:?}", config);

    let mut app = App::new(
        config,
        SystemClock::new(),
        open_store(),
        Some(HistoryLog::new()),
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    app.shutdown();
    result
}

fn run<B: Backend, C: Clock>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    loop {
        let size = terminal.size()?;
        app.area = Rect::new(0, 0, size.width, size.height);
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            GameEvent::Tick | GameEvent::Resize => app.tick(),
            GameEvent::Click(column, row) => app.handle_click(column, row),
            GameEvent::Key(key) => {
                if app.handle_key(key) == Flow::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}
