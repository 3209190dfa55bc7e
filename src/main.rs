mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use keyball_tutor::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, StoreBackend},
    keys::{KeyCode, KeyEvent, Timestamp},
    lesson::LessonTable,
    presenter::Notification,
    quotes::QuoteTable,
    runtime::{Clock, CrosstermEventSource, FixedTicker, Runner, SystemClock, TutorEvent},
    store::{self, JsonFileStore, MemoryStore, SqliteStore, StatsStore},
    tutor::{Activity, LessonStart, Tutor},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin, Write},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::ui::keyboard::KeyFeedback;

const TICK_RATE_MS: u64 = 100;

/// typing tutor for the keyball44 miryoku layout
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A typing tutor for the keyball44 running Miryoku: graded lessons for every layer, quote typing tests, a live layer-aware keyboard, and an error heatmap of your weak keys."
)]
pub struct Cli {
    /// start directly in the given lesson
    #[clap(short = 'l', long)]
    lesson: Option<u32>,

    /// start a typing test with texts from this category
    #[clap(short = 'c', long)]
    category: Option<String>,

    /// milliseconds before an inferred layer falls back to BASE
    #[clap(long)]
    timeout_ms: Option<u64>,

    /// where statistics are stored
    #[clap(long, value_enum)]
    store: Option<StoreBackend>,

    /// keep statistics in memory only
    #[clap(long)]
    no_save: bool,

    /// print the lesson table and exit
    #[clap(long)]
    list_lessons: bool,

    /// print the typing test categories and exit
    #[clap(long)]
    list_categories: bool,

    /// write the session history to a CSV file and exit
    #[clap(long, value_name = "CSV")]
    export_history: Option<PathBuf>,

    /// log filter used when RUST_LOG is unset
    #[clap(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Command line flags override the config file
    fn apply(&self, mut config: Config) -> Config {
        if let Some(timeout_ms) = self.timeout_ms {
            config.layer_timeout_ms = timeout_ms;
        }
        if let Some(store) = self.store {
            config.store = store;
        }
        if let Some(category) = &self.category {
            config.default_category = category.clone();
        }
        config
    }

    fn open_store(&self, config: &Config) -> Result<Box<dyn StatsStore>, Box<dyn Error>> {
        if self.no_save {
            return Ok(Box::new(MemoryStore::new()));
        }
        Ok(match config.store {
            StoreBackend::Json => Box::new(JsonFileStore::new()),
            StoreBackend::Sqlite => Box::new(SqliteStore::open_default()?),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Home,
    Practice,
    Theory,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum HomeTab {
    Lessons,
    #[strum(serialize = "Typing Test")]
    TypingTest,
    Statistics,
}

impl HomeTab {
    pub const ALL: [HomeTab; 3] = [HomeTab::Lessons, HomeTab::TypingTest, HomeTab::Statistics];

    fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub type AppTutor = Tutor<Box<dyn StatsStore>, Vec<Notification>>;

pub struct App {
    pub tutor: AppTutor,
    pub state: AppState,
    pub tab: HomeTab,
    pub lesson_idx: usize,
    pub category_idx: usize,
    pub feedback: KeyFeedback,
    pub confirm_reset: bool,
    pub notice: Option<String>,
    pub now: Timestamp,
}

impl App {
    pub fn new(tutor: AppTutor, config: &Config) -> Self {
        let category_idx = tutor
            .quotes()
            .categories()
            .iter()
            .position(|c| c.id == config.default_category)
            .unwrap_or(0);
        Self {
            tutor,
            state: AppState::Home,
            tab: HomeTab::Lessons,
            lesson_idx: 0,
            category_idx,
            feedback: KeyFeedback::new(config.key_feedback_ms),
            confirm_reset: false,
            notice: None,
            now: 0,
        }
    }

    pub fn start_lesson(&mut self, id: u32) {
        match self.tutor.start_lesson(id) {
            Ok(start) => {
                self.state = match start {
                    LessonStart::Practice => AppState::Practice,
                    LessonStart::Theory => AppState::Theory,
                };
                if let Some(idx) = self.tutor.lessons().ids().position(|l| l == id) {
                    self.lesson_idx = idx;
                }
                self.notice = None;
            }
            Err(e) => self.back_home(Some(e.to_string())),
        }
        self.drain_notifications();
    }

    pub fn start_typing_test(&mut self, category: &str) {
        match self.tutor.start_typing_test(category) {
            Ok(()) => {
                self.state = AppState::Practice;
                self.notice = None;
            }
            Err(e) => self.back_home(Some(e.to_string())),
        }
        self.drain_notifications();
    }

    fn back_home(&mut self, notice: Option<String>) {
        self.tutor.quit();
        self.feedback.clear();
        self.state = AppState::Home;
        self.notice = notice;
    }

    pub fn handle_event(&mut self, event: TutorEvent, now: Timestamp) -> Flow {
        self.now = now;
        let flow = match event {
            TutorEvent::Interrupt => {
                self.tutor.quit();
                Flow::Exit
            }
            TutorEvent::Tick => {
                self.tutor.tick(now);
                Flow::Continue
            }
            TutorEvent::Resize => Flow::Continue,
            TutorEvent::Press(key) if !key.is_repeat || self.state == AppState::Practice => {
                self.on_press(key)
            }
            TutorEvent::Press(_) => Flow::Continue,
            TutorEvent::Release(key) => {
                if self.state == AppState::Practice {
                    self.tutor.key_up(&key);
                }
                Flow::Continue
            }
        };
        self.drain_notifications();
        self.feedback.prune(now);
        flow
    }

    fn on_press(&mut self, key: KeyEvent) -> Flow {
        match self.state {
            AppState::Home => return self.on_home_key(key),
            AppState::Practice => {
                if key.code == KeyCode::Escape {
                    self.back_home(None);
                } else {
                    self.tutor.key_down(&key);
                }
            }
            AppState::Theory => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => match self.tutor.acknowledge_theory() {
                    Ok(id) => {
                        self.state = AppState::Home;
                        self.notice = Some(format!("lesson {id} completed"));
                        self.select_next_lesson();
                    }
                    Err(e) => self.back_home(Some(e.to_string())),
                },
                KeyCode::Escape => self.back_home(None),
                _ => {}
            },
            AppState::Results => match key.code {
                KeyCode::Char('r') => self.retry(),
                KeyCode::Char('n') => self.next(),
                KeyCode::Escape | KeyCode::Enter => self.back_home(None),
                _ => {}
            },
        }
        Flow::Continue
    }

    fn on_home_key(&mut self, key: KeyEvent) -> Flow {
        if self.confirm_reset {
            self.confirm_reset = false;
            if key.code == KeyCode::Char('y') {
                self.notice = Some(match self.tutor.reset_statistics() {
                    Ok(()) => "statistics reset".to_string(),
                    Err(e) => format!("could not reset statistics: {e}"),
                });
            }
            return Flow::Continue;
        }

        match key.code {
            KeyCode::Escape | KeyCode::Char('q') => return Flow::Exit,
            KeyCode::Tab | KeyCode::Right => self.tab = self.tab.next(),
            KeyCode::Left => self.tab = self.tab.prev(),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Char('x') if self.tab == HomeTab::Statistics => self.confirm_reset = true,
            KeyCode::Enter => match self.tab {
                HomeTab::Lessons => {
                    let id = self.tutor.lessons().ids().nth(self.lesson_idx);
                    if let Some(id) = id {
                        self.start_lesson(id);
                    }
                }
                HomeTab::TypingTest => {
                    if let Some(category) = self.selected_category() {
                        self.start_typing_test(&category);
                    }
                }
                HomeTab::Statistics => {}
            },
            _ => {}
        }
        Flow::Continue
    }

    fn move_selection(&mut self, delta: isize) {
        let (idx, len) = match self.tab {
            HomeTab::Lessons => (&mut self.lesson_idx, self.tutor.lessons().len()),
            HomeTab::TypingTest => (
                &mut self.category_idx,
                self.tutor.quotes().categories().len(),
            ),
            HomeTab::Statistics => return,
        };
        if len > 0 {
            *idx = (*idx as isize + delta).rem_euclid(len as isize) as usize;
        }
    }

    fn select_next_lesson(&mut self) {
        let len = self.tutor.lessons().len();
        if self.lesson_idx + 1 < len {
            self.lesson_idx += 1;
        }
    }

    pub fn selected_category(&self) -> Option<String> {
        self.tutor
            .quotes()
            .categories()
            .get(self.category_idx)
            .map(|c| c.id.clone())
    }

    /// Lesson id and category of the session on the results screen
    fn finished(&self) -> Option<(Option<u32>, String)> {
        match self.tutor.activity() {
            Activity::Finished(done) => Some((done.lesson_id, done.category.clone())),
            _ => None,
        }
    }

    fn retry(&mut self) {
        match self.finished() {
            Some((Some(id), _)) => self.start_lesson(id),
            Some((None, category)) => self.start_typing_test(&category),
            None => {}
        }
    }

    fn next(&mut self) {
        match self.finished() {
            Some((Some(_), _)) => {
                match self.tutor.start_next_lesson() {
                    Ok(start) => {
                        self.state = match start {
                            LessonStart::Practice => AppState::Practice,
                            LessonStart::Theory => AppState::Theory,
                        };
                        self.select_next_lesson();
                    }
                    Err(e) => self.back_home(Some(e.to_string())),
                }
                self.drain_notifications();
            }
            Some((None, category)) => self.start_typing_test(&category),
            None => {}
        }
    }

    fn drain_notifications(&mut self) {
        for notification in std::mem::take(self.tutor.presenter_mut()) {
            match notification {
                Notification::KeyPositionPressed(pos) => self.feedback.press(pos),
                Notification::KeyPositionReleased(pos) => self.feedback.release(pos, self.now),
                Notification::SessionComplete { .. } => {
                    self.feedback.clear();
                    self.state = AppState::Results;
                }
                _ => {}
            }
        }
    }
}

fn init_logging(level: &str) -> Result<(), Box<dyn Error>> {
    let path = AppDirs::log_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(filter)
        .try_init()?;
    Ok(())
}

/// Commands that print and exit without taking over the terminal
fn run_batch(cli: &Cli, config: &Config) -> Result<bool, Box<dyn Error>> {
    let mut out = io::stdout().lock();
    if cli.list_lessons {
        let lessons = LessonTable::embedded()?;
        let stats = cli.open_store(config)?.load();
        for lesson in lessons.iter() {
            let kind = if lesson.is_theory() { "theory" } else { "practice" };
            let stars = match stats.stars_for(lesson.id) {
                0 if stats.is_completed(lesson.id) => "done".to_string(),
                0 => String::new(),
                n => "★".repeat(n as usize),
            };
            writeln!(
                out,
                "{:>3}  {:<40} {:<8} {:<5} {}",
                lesson.id,
                lesson.name,
                kind,
                lesson.layer(),
                stars
            )?;
        }
        return Ok(true);
    }
    if cli.list_categories {
        for category in QuoteTable::embedded()?.categories() {
            writeln!(
                out,
                "{:<12} {:<16} {} texts",
                category.id,
                category.name,
                category.texts.len()
            )?;
        }
        return Ok(true);
    }
    if let Some(path) = &cli.export_history {
        let stats = cli.open_store(config)?.load();
        let rows = store::export_history_csv(&stats, path)?;
        writeln!(out, "exported {rows} sessions to {}", path.display())?;
        return Ok(true);
    }
    Ok(false)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = cli.apply(FileConfigStore::new().load());

    if run_batch(&cli, &config)? {
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    // the terminal belongs to the UI, so logs go to a file or nowhere
    let _ = init_logging(&cli.log_level);
    info!(?config, "starting");

    let tutor = Tutor::new(&config, cli.open_store(&config)?, Vec::new())?;
    let mut app = App::new(tutor, &config);
    if let Some(id) = cli.lesson {
        app.start_lesson(id);
    } else if let Some(category) = &cli.category {
        app.start_typing_test(category);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let reports_release = matches!(supports_keyboard_enhancement(), Ok(true));
    if reports_release {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                    | KeyboardEnhancementFlags::REPORT_ALTERNATE_KEYS
            )
        )?;
    }
    info!(reports_release, "terminal ready");

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let clock = SystemClock::new();
    let result = start_tui(&mut terminal, &mut app, clock, reports_release);
    if let Err(e) = &result {
        error!(error = %e, "ui loop failed");
    }

    if reports_release {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    clock: SystemClock,
    reports_release: bool,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(clock, reports_release),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        let event = runner.step();
        if app.handle_event(event, clock.now()) == Flow::Exit {
            break;
        }
    }
    info!("exiting");
    Ok(())
}
