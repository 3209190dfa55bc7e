//! Layer detection.
//!
//! The keyboard never reports which layer is active. Signal layers bracket
//! themselves with a dedicated key (F13-F15) on press and release; the other
//! layers are guessed from the category of keys arriving and fall back to
//! BASE once nothing layer-relevant has been seen for `timeout_ms`.

use crate::keys::{KeyCode, KeyEvent, Timestamp};
use crate::layout::{self, ActivationMode, LayerId, Position, ACTIVATIONS};
use crate::presenter::{Notification, Presenter};
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_TIMEOUT_MS: u64 = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Signal(LayerId),
    Inferred(LayerId),
    /// Base-layer character or a thumb key's own tap
    Base,
    /// No layer semantics (modifiers, digits, unmapped keys)
    Neutral,
}

/// Pure event classification over the activation table
pub fn classify(code: KeyCode) -> Classification {
    for activation in ACTIVATIONS {
        match activation.mode {
            ActivationMode::Signal(signal) if signal == code => {
                return Classification::Signal(activation.layer)
            }
            ActivationMode::Inferred(category) if category.contains(code) => {
                return Classification::Inferred(activation.layer)
            }
            _ => {}
        }
    }
    if layout::is_base_tap(code) {
        Classification::Base
    } else {
        Classification::Neutral
    }
}

#[derive(Debug)]
pub struct LayerTracker {
    current: LayerId,
    deadline: Option<Timestamp>,
    timeout_ms: u64,
    pressed: HashMap<KeyCode, Position>,
}

impl Default for LayerTracker {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_MS)
    }
}

impl LayerTracker {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            current: LayerId::Base,
            deadline: None,
            timeout_ms,
            pressed: HashMap::new(),
        }
    }

    pub fn current(&self) -> LayerId {
        self.current
    }

    /// When the pending inferred-layer timeout fires, if one is armed
    pub fn deadline(&self) -> Option<Timestamp> {
        self.deadline
    }

    pub fn key_down<P: Presenter>(&mut self, event: &KeyEvent, out: &mut P) {
        if event.is_repeat {
            return;
        }
        self.expire(event.timestamp, out);

        let class = classify(event.code);
        debug!(code = %event.code, ?class, layer = %self.current, "key down");
        match class {
            Classification::Signal(layer) => {
                self.deadline = None;
                self.switch(layer, out);
            }
            Classification::Inferred(layer) => {
                self.switch(layer, out);
                // switching and debouncing both leave exactly one deadline
                self.deadline = Some(event.timestamp + self.timeout_ms);
            }
            // a held signal layer keeps the keys it shares with BASE
            Classification::Base if self.holds_signal_layer_key(event.code) => {}
            Classification::Base => {
                if self.current != LayerId::Base {
                    self.deadline = None;
                    self.switch(LayerId::Base, out);
                }
            }
            Classification::Neutral => {}
        }

        if let Some(position) = self.position_for(event.code) {
            self.pressed.insert(layout::normalize(event.code), position);
            out.notify(Notification::KeyPositionPressed(position));
        }
    }

    pub fn key_up<P: Presenter>(&mut self, event: &KeyEvent, out: &mut P) {
        if event.is_repeat {
            return;
        }
        self.expire(event.timestamp, out);

        if let Classification::Signal(_) = classify(event.code) {
            self.deadline = None;
            self.switch(LayerId::Base, out);
        }

        let position = self
            .pressed
            .remove(&layout::normalize(event.code))
            .or_else(|| self.position_for(event.code));
        if let Some(position) = position {
            out.notify(Notification::KeyPositionReleased(position));
        }
    }

    /// Timer callback: fires the inferred-layer timeout once it is due
    pub fn tick<P: Presenter>(&mut self, now: Timestamp, out: &mut P) {
        self.expire(now, out);
    }

    /// Force a layer, e.g. the layer a lesson is written for
    pub fn set_layer<P: Presenter>(&mut self, layer: LayerId, out: &mut P) {
        self.deadline = None;
        self.switch(layer, out);
    }

    /// Cancel any pending timeout, forget held keys, and return to BASE
    pub fn reset<P: Presenter>(&mut self, out: &mut P) {
        self.deadline = None;
        self.pressed.clear();
        self.switch(LayerId::Base, out);
    }

    fn expire<P: Presenter>(&mut self, now: Timestamp, out: &mut P) {
        if let Some(deadline) = self.deadline {
            if now >= deadline {
                self.deadline = None;
                debug!(layer = %self.current, deadline, now, "layer timeout");
                self.switch(LayerId::Base, out);
            }
        }
    }

    fn switch<P: Presenter>(&mut self, layer: LayerId, out: &mut P) {
        if layer == self.current {
            return;
        }
        debug!(from = %self.current, to = %layer, "layer changed");
        self.current = layer;
        out.notify(Notification::LayerChanged(layer));
    }

    fn holds_signal_layer_key(&self, code: KeyCode) -> bool {
        let signalled = layout::activation_for(self.current)
            .is_some_and(|a| matches!(a.mode, ActivationMode::Signal(_)));
        signalled && layout::position_in(self.current, code).is_some()
    }

    fn position_for(&self, code: KeyCode) -> Option<Position> {
        match classify(code) {
            Classification::Signal(layer) => layout::activation_for(layer).map(|a| a.position),
            _ => layout::position_of(code, self.current),
        }
    }
}
