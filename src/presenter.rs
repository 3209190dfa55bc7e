use crate::layout::{LayerId, Position};
use std::sync::mpsc::Sender;

/// Everything the core tells the presentation side
#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    LayerChanged(LayerId),
    KeyPositionPressed(Position),
    KeyPositionReleased(Position),
    Keystroke {
        expected: char,
        typed: char,
        correct: bool,
    },
    SessionProgress {
        wpm: u32,
        accuracy: u32,
        error_count: u32,
        cursor: usize,
    },
    ExerciseAdvanced {
        index: usize,
        total: usize,
    },
    SessionComplete {
        wpm: u32,
        accuracy: u32,
        stars: Option<u8>,
    },
}

/// Sink for core notifications
pub trait Presenter {
    fn notify(&mut self, notification: Notification);
}

impl Presenter for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

impl Presenter for Sender<Notification> {
    fn notify(&mut self, notification: Notification) {
        // a dropped receiver means nobody is rendering anymore
        let _ = self.send(notification);
    }
}

/// Drops every notification
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl Presenter for Discard {
    fn notify(&mut self, _notification: Notification) {}
}
