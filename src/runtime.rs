use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event as CtEvent, KeyCode as CtKeyCode, KeyEvent as CtKeyEvent, KeyEventKind,
    KeyModifiers, MediaKeyCode, ModifierKeyCode,
};

use crate::keys::{KeyCode, KeyEvent, MediaKey, Modifier, Timestamp};
use crate::layer::{classify, Classification};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug, PartialEq)]
pub enum TutorEvent {
    Press(KeyEvent),
    Release(KeyEvent),
    /// Ctrl+C
    Interrupt,
    Resize,
    Tick,
}

/// Millisecond time source for key event timestamps
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Timestamp;
}

/// Milliseconds since the clock was created
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        self.origin.elapsed().as_millis() as Timestamp
    }
}

#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn advance(&self, ms: u64) -> Timestamp {
        self.now.fetch_add(ms, Ordering::SeqCst) + ms
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait TutorEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<TutorEvent, RecvTimeoutError>;
}

fn convert_code(code: CtKeyCode, modifiers: KeyModifiers) -> Option<KeyCode> {
    let code = match code {
        CtKeyCode::Char(c) if modifiers.contains(KeyModifiers::SHIFT) && c.is_ascii_lowercase() => {
            KeyCode::Char(c.to_ascii_uppercase())
        }
        CtKeyCode::Char(c) => KeyCode::Char(c),
        CtKeyCode::Enter => KeyCode::Enter,
        CtKeyCode::Tab | CtKeyCode::BackTab => KeyCode::Tab,
        CtKeyCode::Backspace => KeyCode::Backspace,
        CtKeyCode::Delete => KeyCode::Delete,
        CtKeyCode::Esc => KeyCode::Escape,
        CtKeyCode::Left => KeyCode::Left,
        CtKeyCode::Right => KeyCode::Right,
        CtKeyCode::Up => KeyCode::Up,
        CtKeyCode::Down => KeyCode::Down,
        CtKeyCode::Home => KeyCode::Home,
        CtKeyCode::End => KeyCode::End,
        CtKeyCode::PageUp => KeyCode::PageUp,
        CtKeyCode::PageDown => KeyCode::PageDown,
        CtKeyCode::Insert => KeyCode::Insert,
        CtKeyCode::F(n) => KeyCode::F(n),
        CtKeyCode::CapsLock => KeyCode::CapsLock,
        CtKeyCode::ScrollLock => KeyCode::ScrollLock,
        CtKeyCode::PrintScreen => KeyCode::PrintScreen,
        CtKeyCode::Pause => KeyCode::Pause,
        CtKeyCode::Menu => KeyCode::Menu,
        CtKeyCode::Media(media) => KeyCode::Media(match media {
            MediaKeyCode::Play | MediaKeyCode::Pause | MediaKeyCode::PlayPause => {
                MediaKey::PlayPause
            }
            MediaKeyCode::Stop => MediaKey::Stop,
            MediaKeyCode::TrackNext | MediaKeyCode::FastForward => MediaKey::TrackNext,
            MediaKeyCode::TrackPrevious | MediaKeyCode::Rewind | MediaKeyCode::Reverse => {
                MediaKey::TrackPrevious
            }
            MediaKeyCode::RaiseVolume => MediaKey::VolumeUp,
            MediaKeyCode::LowerVolume => MediaKey::VolumeDown,
            MediaKeyCode::MuteVolume => MediaKey::Mute,
            MediaKeyCode::Record => return None,
        }),
        CtKeyCode::Modifier(modifier) => KeyCode::Modifier(match modifier {
            ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => Modifier::Shift,
            ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => Modifier::Control,
            ModifierKeyCode::LeftAlt
            | ModifierKeyCode::RightAlt
            | ModifierKeyCode::IsoLevel3Shift
            | ModifierKeyCode::IsoLevel5Shift => Modifier::Alt,
            ModifierKeyCode::LeftSuper
            | ModifierKeyCode::RightSuper
            | ModifierKeyCode::LeftHyper
            | ModifierKeyCode::RightHyper
            | ModifierKeyCode::LeftMeta
            | ModifierKeyCode::RightMeta => Modifier::Meta,
        }),
        _ => return None,
    };
    Some(code)
}

/// Translate one crossterm key event.
///
/// Terminals without release reporting only ever deliver presses, so when
/// `reports_release` is false every press except a layer signal is followed
/// by a synthetic release at the same timestamp. Signal layers then end when
/// the next base-layer character arrives.
pub fn translate_key(key: &CtKeyEvent, timestamp: Timestamp, reports_release: bool) -> Vec<TutorEvent> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == CtKeyCode::Char('c') {
        return if key.kind == KeyEventKind::Release {
            vec![]
        } else {
            vec![TutorEvent::Interrupt]
        };
    }
    let Some(code) = convert_code(key.code, key.modifiers) else {
        return vec![];
    };
    let event = KeyEvent::new(code, timestamp);
    match key.kind {
        KeyEventKind::Press => {
            if reports_release || matches!(classify(code), Classification::Signal(_)) {
                vec![TutorEvent::Press(event)]
            } else {
                vec![TutorEvent::Press(event), TutorEvent::Release(event)]
            }
        }
        KeyEventKind::Repeat => vec![TutorEvent::Press(event.repeated())],
        KeyEventKind::Release => vec![TutorEvent::Release(event)],
    }
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<TutorEvent>,
}

impl CrosstermEventSource {
    pub fn new<C: Clock>(clock: C, reports_release: bool) -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let events = match event::read() {
                Ok(CtEvent::Key(key)) => translate_key(&key, clock.now(), reports_release),
                Ok(CtEvent::Resize(_, _)) => vec![TutorEvent::Resize],
                Ok(_) => vec![],
                Err(_) => break,
            };
            if events.into_iter().any(|ev| tx.send(ev).is_err()) {
                break;
            }
        });

        Self { rx }
    }
}

impl TutorEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TutorEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<TutorEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<TutorEvent>) -> Self {
        Self { rx }
    }
}

impl TutorEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TutorEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: TutorEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: TutorEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> TutorEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                TutorEvent::Tick
            }
        }
    }
}
