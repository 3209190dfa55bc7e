use std::fmt;

/// Milliseconds. Only differences between two timestamps are meaningful.
pub type Timestamp = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Modifier {
    Shift,
    Control,
    Alt,
    Meta,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKey {
    PlayPause,
    Stop,
    TrackNext,
    TrackPrevious,
    VolumeUp,
    VolumeDown,
    Mute,
}

/// Physical key identity as reported by the input source
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Escape,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    F(u8),
    PrintScreen,
    ScrollLock,
    Pause,
    CapsLock,
    Menu,
    Media(MediaKey),
    Modifier(Modifier),
}

impl KeyCode {
    /// Character produced by this key, if it produces one at all
    pub fn character(&self) -> Option<char> {
        match self {
            KeyCode::Char(c) => Some(*c),
            KeyCode::Enter => Some('\n'),
            KeyCode::Tab => Some('\t'),
            _ => None,
        }
    }

    /// Keys that never count as keystrokes in a practice session: pure
    /// modifiers, caps lock, tab, escape and the layer-signal range F13-F20.
    pub fn is_typing_ignored(&self) -> bool {
        matches!(
            self,
            KeyCode::Modifier(_)
                | KeyCode::CapsLock
                | KeyCode::Tab
                | KeyCode::Escape
                | KeyCode::F(13..=20)
        )
    }

    /// Short label used on the virtual keyboard
    pub fn label(&self) -> String {
        match self {
            KeyCode::Char(' ') => "SPC".to_string(),
            KeyCode::Char(c) => c.to_uppercase().to_string(),
            KeyCode::Enter => "ENT".to_string(),
            KeyCode::Tab => "TAB".to_string(),
            KeyCode::Backspace => "BSPC".to_string(),
            KeyCode::Delete => "DEL".to_string(),
            KeyCode::Escape => "ESC".to_string(),
            KeyCode::Left => "←".to_string(),
            KeyCode::Right => "→".to_string(),
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::Home => "HOME".to_string(),
            KeyCode::End => "END".to_string(),
            KeyCode::PageUp => "PGUP".to_string(),
            KeyCode::PageDown => "PGDN".to_string(),
            KeyCode::Insert => "INS".to_string(),
            KeyCode::F(n) => format!("F{n}"),
            KeyCode::PrintScreen => "PSCR".to_string(),
            KeyCode::ScrollLock => "SCRL".to_string(),
            KeyCode::Pause => "PAUS".to_string(),
            KeyCode::CapsLock => "CAPS".to_string(),
            KeyCode::Menu => "APP".to_string(),
            KeyCode::Media(m) => match m {
                MediaKey::PlayPause => "PLAY",
                MediaKey::Stop => "STOP",
                MediaKey::TrackNext => "NEXT",
                MediaKey::TrackPrevious => "PREV",
                MediaKey::VolumeUp => "VOL+",
                MediaKey::VolumeDown => "VOL-",
                MediaKey::Mute => "MUTE",
            }
            .to_string(),
            KeyCode::Modifier(m) => match m {
                Modifier::Shift => "SFT",
                Modifier::Control => "CTL",
                Modifier::Alt => "ALT",
                Modifier::Meta => "GUI",
            }
            .to_string(),
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single press or release coming from the keyboard
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub character: Option<char>,
    pub is_repeat: bool,
    pub timestamp: Timestamp,
}

impl KeyEvent {
    pub fn new(code: KeyCode, timestamp: Timestamp) -> Self {
        Self {
            code,
            character: code.character(),
            is_repeat: false,
            timestamp,
        }
    }

    pub fn char(c: char, timestamp: Timestamp) -> Self {
        Self::new(KeyCode::Char(c), timestamp)
    }

    pub fn repeated(mut self) -> Self {
        self.is_repeat = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_for_keys() {
        assert_eq!(KeyCode::Char('a').character(), Some('a'));
        assert_eq!(KeyCode::Enter.character(), Some('\n'));
        assert_eq!(KeyCode::Left.character(), None);
        assert_eq!(KeyCode::F(13).character(), None);
    }

    #[test]
    fn test_typing_ignored_set() {
        assert!(KeyCode::Modifier(Modifier::Shift).is_typing_ignored());
        assert!(KeyCode::CapsLock.is_typing_ignored());
        assert!(KeyCode::Escape.is_typing_ignored());
        assert!(KeyCode::F(13).is_typing_ignored());
        assert!(KeyCode::F(20).is_typing_ignored());
        assert!(!KeyCode::F(12).is_typing_ignored());
        assert!(!KeyCode::Char('a').is_typing_ignored());
        assert!(!KeyCode::Backspace.is_typing_ignored());
    }

    #[test]
    fn test_labels() {
        assert_eq!(KeyCode::Char('q').label(), "Q");
        assert_eq!(KeyCode::Char(' ').label(), "SPC");
        assert_eq!(KeyCode::F(7).label(), "F7");
        assert_eq!(KeyCode::Media(MediaKey::VolumeUp).to_string(), "VOL+");
    }

    #[test]
    fn test_event_constructors() {
        let ev = KeyEvent::char('x', 42);
        assert_eq!(ev.character, Some('x'));
        assert!(!ev.is_repeat);
        assert_eq!(ev.timestamp, 42);

        let rep = ev.repeated();
        assert!(rep.is_repeat);
        assert_eq!(rep.code, KeyCode::Char('x'));
    }
}
