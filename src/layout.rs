//! Keyball44 position table for the Miryoku layout.
//!
//! The grid is three rows of twelve columns (positions 0-35) followed by the
//! thumb cluster (36-40 left, 41-43 right). Every layer labels the same
//! positions; a position without a slot on a layer is unlabeled.

use crate::keys::{KeyCode, MediaKey, Modifier};
use serde::{Deserialize, Serialize};

pub const COLUMNS: u8 = 12;
pub const ROWS: u8 = 3;
pub const THUMB_START: u8 = 36;
pub const POSITION_COUNT: u8 = 44;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum LayerId {
    #[default]
    #[strum(serialize = "BASE")]
    Base = 0,
    #[strum(serialize = "NAV")]
    Nav = 1,
    #[strum(serialize = "MOUSE")]
    Mouse = 2,
    #[strum(serialize = "MEDIA")]
    Media = 3,
    #[strum(serialize = "NUM")]
    Num = 4,
    #[strum(serialize = "SYM")]
    Sym = 5,
    #[strum(serialize = "FUN")]
    Fun = 6,
}

impl LayerId {
    pub const ALL: [LayerId; 7] = [
        LayerId::Base,
        LayerId::Nav,
        LayerId::Mouse,
        LayerId::Media,
        LayerId::Num,
        LayerId::Sym,
        LayerId::Fun,
    ];
}

impl TryFrom<u8> for LayerId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        LayerId::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| format!("unknown layer id {value}"))
    }
}

impl From<LayerId> for u8 {
    fn from(layer: LayerId) -> Self {
        layer as u8
    }
}

/// Fixed physical slot on the keyboard grid, stable across layers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position(pub u8);

impl Position {
    pub fn is_thumb(&self) -> bool {
        self.0 >= THUMB_START
    }

    /// (row, column) on the main grid, None for thumb keys
    pub fn grid(&self) -> Option<(u8, u8)> {
        if self.is_thumb() {
            None
        } else {
            Some((self.0 / COLUMNS, self.0 % COLUMNS))
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hold {
    Modifier(Modifier),
    Layer(LayerId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    pub position: Position,
    pub key: Option<KeyCode>,
    pub text: Option<&'static str>,
    pub hold: Option<Hold>,
}

impl Slot {
    const fn key(position: u8, code: KeyCode) -> Self {
        Self {
            position: Position(position),
            key: Some(code),
            text: None,
            hold: None,
        }
    }

    const fn text(position: u8, text: &'static str) -> Self {
        Self {
            position: Position(position),
            key: None,
            text: Some(text),
            hold: None,
        }
    }

    /// The thumb key currently held to reach this layer
    const fn held(position: u8) -> Self {
        Self::text(position, "▓")
    }

    const fn hold(self, hold: Hold) -> Self {
        Self {
            hold: Some(hold),
            ..self
        }
    }

    pub fn is_held_activator(&self) -> bool {
        self.text == Some("▓")
    }

    pub fn tap_label(&self) -> String {
        match (self.text, self.key) {
            (Some(t), _) => t.to_string(),
            (None, Some(k)) => k.label(),
            (None, None) => String::new(),
        }
    }

    pub fn hold_label(&self) -> Option<String> {
        self.hold.map(|h| match h {
            Hold::Modifier(m) => KeyCode::Modifier(m).label(),
            Hold::Layer(l) => l.to_string(),
        })
    }
}

const fn c(position: u8, ch: char) -> Slot {
    Slot::key(position, KeyCode::Char(ch))
}

const fn m(position: u8, modifier: Modifier) -> Slot {
    Slot::key(position, KeyCode::Modifier(modifier))
}

const fn hm(position: u8, ch: char, modifier: Modifier) -> Slot {
    c(position, ch).hold(Hold::Modifier(modifier))
}

const fn thumb(position: u8, code: KeyCode, layer: LayerId) -> Slot {
    Slot::key(position, code).hold(Hold::Layer(layer))
}

const BASE: &[Slot] = &[
    c(1, 'q'),
    c(2, 'w'),
    c(3, 'e'),
    c(4, 'r'),
    c(5, 't'),
    c(6, 'y'),
    c(7, 'u'),
    c(8, 'i'),
    c(9, 'o'),
    c(10, 'p'),
    hm(13, 'a', Modifier::Meta),
    hm(14, 's', Modifier::Alt),
    hm(15, 'd', Modifier::Control),
    hm(16, 'f', Modifier::Shift),
    c(17, 'g'),
    c(18, 'h'),
    hm(19, 'j', Modifier::Shift),
    hm(20, 'k', Modifier::Control),
    hm(21, 'l', Modifier::Alt),
    hm(22, '\'', Modifier::Meta),
    c(25, 'z'),
    c(26, 'x'),
    c(27, 'c'),
    c(28, 'v'),
    c(29, 'b'),
    c(30, 'n'),
    c(31, 'm'),
    c(32, ','),
    c(33, '.'),
    c(34, '/'),
    thumb(38, KeyCode::Escape, LayerId::Media),
    thumb(39, KeyCode::Char(' '), LayerId::Nav),
    thumb(40, KeyCode::Tab, LayerId::Mouse),
    thumb(41, KeyCode::Enter, LayerId::Sym),
    thumb(42, KeyCode::Backspace, LayerId::Num),
    thumb(43, KeyCode::Delete, LayerId::Fun),
];

const NAV: &[Slot] = &[
    Slot::text(6, "REDO"),
    Slot::text(7, "PSTE"),
    Slot::text(8, "COPY"),
    Slot::text(9, "CUT"),
    Slot::text(10, "UNDO"),
    m(13, Modifier::Meta),
    m(14, Modifier::Alt),
    m(15, Modifier::Control),
    m(16, Modifier::Shift),
    Slot::key(18, KeyCode::Left),
    Slot::key(19, KeyCode::Down),
    Slot::key(20, KeyCode::Up),
    Slot::key(21, KeyCode::Right),
    Slot::key(22, KeyCode::CapsLock),
    Slot::key(30, KeyCode::Home),
    Slot::key(31, KeyCode::PageDown),
    Slot::key(32, KeyCode::PageUp),
    Slot::key(33, KeyCode::End),
    Slot::key(34, KeyCode::Insert),
    Slot::held(39),
    Slot::key(41, KeyCode::Enter),
    Slot::key(42, KeyCode::Backspace),
    Slot::key(43, KeyCode::Delete),
];

const MOUSE: &[Slot] = &[
    m(13, Modifier::Meta),
    m(14, Modifier::Alt),
    m(15, Modifier::Control),
    m(16, Modifier::Shift),
    Slot::text(18, "M←"),
    Slot::text(19, "M↓"),
    Slot::text(20, "M↑"),
    Slot::text(21, "M→"),
    Slot::text(30, "W←"),
    Slot::text(31, "W↓"),
    Slot::text(32, "W↑"),
    Slot::text(33, "W→"),
    Slot::held(40),
    Slot::text(41, "BTN2"),
    Slot::text(42, "BTN1"),
    Slot::text(43, "BTN3"),
];

const MEDIA: &[Slot] = &[
    m(13, Modifier::Meta),
    m(14, Modifier::Alt),
    m(15, Modifier::Control),
    m(16, Modifier::Shift),
    Slot::key(18, KeyCode::Media(MediaKey::TrackPrevious)),
    Slot::key(19, KeyCode::Media(MediaKey::VolumeDown)),
    Slot::key(20, KeyCode::Media(MediaKey::VolumeUp)),
    Slot::key(21, KeyCode::Media(MediaKey::TrackNext)),
    Slot::held(38),
    Slot::key(41, KeyCode::Media(MediaKey::Stop)),
    Slot::key(42, KeyCode::Media(MediaKey::PlayPause)),
    Slot::key(43, KeyCode::Media(MediaKey::Mute)),
];

const NUM: &[Slot] = &[
    c(1, '['),
    c(2, '7'),
    c(3, '8'),
    c(4, '9'),
    c(5, ']'),
    c(13, ';'),
    c(14, '4'),
    c(15, '5'),
    c(16, '6'),
    c(17, '='),
    m(19, Modifier::Shift),
    m(20, Modifier::Control),
    m(21, Modifier::Alt),
    m(22, Modifier::Meta),
    c(25, '`'),
    c(26, '1'),
    c(27, '2'),
    c(28, '3'),
    c(29, '\\'),
    c(38, '.'),
    c(39, '0'),
    c(40, '-'),
    Slot::held(42),
];

const SYM: &[Slot] = &[
    c(1, '{'),
    c(2, '&'),
    c(3, '*'),
    c(4, '('),
    c(5, '}'),
    c(13, ':'),
    c(14, '$'),
    c(15, '%'),
    c(16, '^'),
    c(17, '+'),
    m(19, Modifier::Shift),
    m(20, Modifier::Control),
    m(21, Modifier::Alt),
    m(22, Modifier::Meta),
    c(25, '~'),
    c(26, '!'),
    c(27, '@'),
    c(28, '#'),
    c(29, '|'),
    c(38, '('),
    c(39, ')'),
    c(40, '_'),
    Slot::held(41),
];

const FUN: &[Slot] = &[
    Slot::key(1, KeyCode::F(12)),
    Slot::key(2, KeyCode::F(7)),
    Slot::key(3, KeyCode::F(8)),
    Slot::key(4, KeyCode::F(9)),
    Slot::key(5, KeyCode::PrintScreen),
    Slot::key(13, KeyCode::F(11)),
    Slot::key(14, KeyCode::F(4)),
    Slot::key(15, KeyCode::F(5)),
    Slot::key(16, KeyCode::F(6)),
    Slot::key(17, KeyCode::ScrollLock),
    m(19, Modifier::Shift),
    m(20, Modifier::Control),
    m(21, Modifier::Alt),
    m(22, Modifier::Meta),
    Slot::key(25, KeyCode::F(10)),
    Slot::key(26, KeyCode::F(1)),
    Slot::key(27, KeyCode::F(2)),
    Slot::key(28, KeyCode::F(3)),
    Slot::key(29, KeyCode::Pause),
    Slot::key(38, KeyCode::Menu),
    Slot::key(39, KeyCode::Char(' ')),
    Slot::key(40, KeyCode::Tab),
    Slot::held(43),
];

pub fn slots(layer: LayerId) -> &'static [Slot] {
    match layer {
        LayerId::Base => BASE,
        LayerId::Nav => NAV,
        LayerId::Mouse => MOUSE,
        LayerId::Media => MEDIA,
        LayerId::Num => NUM,
        LayerId::Sym => SYM,
        LayerId::Fun => FUN,
    }
}

pub fn slot(layer: LayerId, position: Position) -> Option<&'static Slot> {
    slots(layer).iter().find(|s| s.position == position)
}

/// Fold shifted characters onto the key that produces them
pub fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(ch) => KeyCode::Char(match ch {
            '?' => '/',
            '"' => '\'',
            '<' => ',',
            '>' => '.',
            other => other.to_lowercase().next().unwrap_or(other),
        }),
        other => other,
    }
}

fn matches_slot(slot: &Slot, code: KeyCode) -> bool {
    if slot.key == Some(code) {
        return true;
    }
    match (slot.hold, code) {
        (Some(Hold::Modifier(held)), KeyCode::Modifier(pressed)) => held == pressed,
        _ => false,
    }
}

pub fn position_in(layer: LayerId, code: KeyCode) -> Option<Position> {
    let code = normalize(code);
    slots(layer)
        .iter()
        .find(|s| matches_slot(s, code))
        .map(|s| s.position)
}

/// Find where a key lives, preferring `layer`, then BASE, then every other
/// layer in id order.
pub fn position_of(code: KeyCode, layer: LayerId) -> Option<Position> {
    std::iter::once(layer)
        .chain(std::iter::once(LayerId::Base))
        .chain(LayerId::ALL)
        .find_map(|l| position_in(l, code))
}

/// True for characters and thumb taps that live on the base layer
pub fn is_base_tap(code: KeyCode) -> bool {
    let code = normalize(code);
    BASE.iter().any(|s| s.key == Some(code))
}

/// Inferred-layer categories: keys that only exist on one layer and carry no
/// explicit begin/end signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Navigation,
    Function,
    Media,
}

impl Category {
    pub fn contains(&self, code: KeyCode) -> bool {
        match self {
            Category::Navigation => matches!(
                code,
                KeyCode::Left
                    | KeyCode::Right
                    | KeyCode::Up
                    | KeyCode::Down
                    | KeyCode::Home
                    | KeyCode::End
                    | KeyCode::PageUp
                    | KeyCode::PageDown
                    | KeyCode::Insert
            ),
            Category::Function => matches!(
                code,
                KeyCode::F(1..=12) | KeyCode::PrintScreen | KeyCode::ScrollLock | KeyCode::Pause
            ),
            Category::Media => matches!(code, KeyCode::Media(_)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivationMode {
    /// The firmware emits this key on layer press and release
    Signal(KeyCode),
    Inferred(Category),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerActivation {
    pub position: Position,
    pub layer: LayerId,
    pub mode: ActivationMode,
}

pub const ACTIVATIONS: &[LayerActivation] = &[
    LayerActivation {
        position: Position(38),
        layer: LayerId::Media,
        mode: ActivationMode::Inferred(Category::Media),
    },
    LayerActivation {
        position: Position(39),
        layer: LayerId::Nav,
        mode: ActivationMode::Inferred(Category::Navigation),
    },
    LayerActivation {
        position: Position(40),
        layer: LayerId::Mouse,
        mode: ActivationMode::Signal(KeyCode::F(15)),
    },
    LayerActivation {
        position: Position(41),
        layer: LayerId::Sym,
        mode: ActivationMode::Signal(KeyCode::F(14)),
    },
    LayerActivation {
        position: Position(42),
        layer: LayerId::Num,
        mode: ActivationMode::Signal(KeyCode::F(13)),
    },
    LayerActivation {
        position: Position(43),
        layer: LayerId::Fun,
        mode: ActivationMode::Inferred(Category::Function),
    },
];

pub fn activation_for(layer: LayerId) -> Option<&'static LayerActivation> {
    ACTIVATIONS.iter().find(|a| a.layer == layer)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Finger {
    LeftPinky,
    LeftRing,
    LeftMiddle,
    LeftIndex,
    LeftThumb,
    RightThumb,
    RightIndex,
    RightMiddle,
    RightRing,
    RightPinky,
}

impl Finger {
    pub fn is_left(&self) -> bool {
        matches!(
            self,
            Finger::LeftPinky
                | Finger::LeftRing
                | Finger::LeftMiddle
                | Finger::LeftIndex
                | Finger::LeftThumb
        )
    }
}

/// Finger expected to press a position
pub fn finger_for(position: Position) -> Option<Finger> {
    if position.is_thumb() {
        return match position.0 {
            38..=40 => Some(Finger::LeftThumb),
            41..=43 => Some(Finger::RightThumb),
            _ => None,
        };
    }
    let (_, col) = position.grid()?;
    match col {
        1 => Some(Finger::LeftPinky),
        2 => Some(Finger::LeftRing),
        3 => Some(Finger::LeftMiddle),
        4 | 5 => Some(Finger::LeftIndex),
        6 | 7 => Some(Finger::RightIndex),
        8 => Some(Finger::RightMiddle),
        9 => Some(Finger::RightRing),
        10 => Some(Finger::RightPinky),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_slot_is_on_the_grid() {
        for layer in LayerId::ALL {
            for s in slots(layer) {
                assert!(s.position.0 < POSITION_COUNT, "{layer}: {:?}", s.position);
            }
        }
    }

    #[test]
    fn test_each_non_base_layer_marks_its_activator() {
        for activation in ACTIVATIONS {
            let held = slot(activation.layer, activation.position).unwrap();
            assert!(held.is_held_activator());
            let base = slot(LayerId::Base, activation.position).unwrap();
            assert_eq!(base.hold, Some(Hold::Layer(activation.layer)));
        }
    }

    #[test]
    fn test_layer_id_from_u8() {
        assert_eq!(LayerId::try_from(4).unwrap(), LayerId::Num);
        assert_eq!(LayerId::try_from(0).unwrap(), LayerId::Base);
        assert!(LayerId::try_from(7).is_err());
        assert_eq!(u8::from(LayerId::Sym), 5);
        assert_eq!(LayerId::Fun.to_string(), "FUN");
    }

    #[test]
    fn test_layer_id_serde() {
        let json = serde_json::to_string(&LayerId::Sym).unwrap();
        assert_eq!(json, "5");
        let back: LayerId = serde_json::from_str("1").unwrap();
        assert_eq!(back, LayerId::Nav);
        assert!(serde_json::from_str::<LayerId>("9").is_err());
    }

    #[test]
    fn test_position_grid() {
        assert_eq!(Position(0).grid(), Some((0, 0)));
        assert_eq!(Position(16).grid(), Some((1, 4)));
        assert_eq!(Position(34).grid(), Some((2, 10)));
        assert_eq!(Position(39).grid(), None);
        assert!(Position(36).is_thumb());
    }

    #[test]
    fn test_position_of_letters_and_shifted() {
        assert_eq!(position_of(KeyCode::Char('f'), LayerId::Base), Some(Position(16)));
        assert_eq!(position_of(KeyCode::Char('F'), LayerId::Base), Some(Position(16)));
        assert_eq!(position_of(KeyCode::Char('?'), LayerId::Base), Some(Position(34)));
        assert_eq!(position_of(KeyCode::Char('"'), LayerId::Base), Some(Position(22)));
        assert_eq!(position_of(KeyCode::Char(' '), LayerId::Base), Some(Position(39)));
    }

    #[test]
    fn test_position_of_prefers_current_layer() {
        // '(' lives on SYM twice; first match wins
        assert_eq!(position_of(KeyCode::Char('('), LayerId::Base), Some(Position(4)));
        // digits fall through to NUM even when BASE is preferred
        assert_eq!(position_of(KeyCode::Char('5'), LayerId::Base), Some(Position(15)));
        // Space is on BASE and FUN at the same slot
        assert_eq!(position_of(KeyCode::Char(' '), LayerId::Fun), Some(Position(39)));
        // Enter on NAV right thumb
        assert_eq!(position_of(KeyCode::Enter, LayerId::Nav), Some(Position(41)));
    }

    #[test]
    fn test_position_of_modifier_uses_home_row_hold() {
        let shift = KeyCode::Modifier(Modifier::Shift);
        assert_eq!(position_of(shift, LayerId::Base), Some(Position(16)));
        assert_eq!(position_of(shift, LayerId::Num), Some(Position(19)));
    }

    #[test]
    fn test_position_of_unmapped() {
        assert_eq!(position_of(KeyCode::Char('é'), LayerId::Base), None);
        assert_eq!(position_of(KeyCode::F(20), LayerId::Base), None);
    }

    #[test]
    fn test_base_taps() {
        assert!(is_base_tap(KeyCode::Char('a')));
        assert!(is_base_tap(KeyCode::Char('A')));
        assert!(is_base_tap(KeyCode::Char(' ')));
        assert!(is_base_tap(KeyCode::Backspace));
        assert!(is_base_tap(KeyCode::Escape));
        assert!(!is_base_tap(KeyCode::Char('5')));
        assert!(!is_base_tap(KeyCode::Char('$')));
        assert!(!is_base_tap(KeyCode::Left));
    }

    #[test]
    fn test_categories() {
        assert!(Category::Navigation.contains(KeyCode::Left));
        assert!(Category::Navigation.contains(KeyCode::PageDown));
        assert!(!Category::Navigation.contains(KeyCode::F(1)));
        assert!(Category::Function.contains(KeyCode::F(12)));
        assert!(!Category::Function.contains(KeyCode::F(13)));
        assert!(Category::Media.contains(KeyCode::Media(MediaKey::Mute)));
    }

    #[test]
    fn test_slot_labels() {
        let a = slot(LayerId::Base, Position(13)).unwrap();
        assert_eq!(a.tap_label(), "A");
        assert_eq!(a.hold_label().as_deref(), Some("GUI"));
        let space = slot(LayerId::Base, Position(39)).unwrap();
        assert_eq!(space.hold_label().as_deref(), Some("NAV"));
        assert!(slot(LayerId::Base, Position(0)).is_none());
        assert_eq!(slot(LayerId::Nav, Position(39)).unwrap().tap_label(), "▓");
    }

    #[test]
    fn test_finger_for() {
        assert_eq!(finger_for(Position(16)), Some(Finger::LeftIndex));
        assert_eq!(finger_for(Position(22)), Some(Finger::RightPinky));
        assert_eq!(finger_for(Position(39)), Some(Finger::LeftThumb));
        assert_eq!(finger_for(Position(0)), None);
        assert!(Finger::LeftRing.is_left());
        assert!(!Finger::RightThumb.is_left());
    }
}
