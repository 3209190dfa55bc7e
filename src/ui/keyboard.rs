use std::collections::HashMap;

use keyball_tutor::{
    keys::Timestamp,
    layout::{self, LayerId, Position, COLUMNS, ROWS, THUMB_START},
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

const KEY_WIDTH: usize = 5;
const SPLIT_GAP: &str = "     ";

/// Pressed-key highlights that stay visible for a minimum duration
#[derive(Debug)]
pub struct KeyFeedback {
    min_ms: u64,
    /// None while the key is still down, otherwise when the highlight ends
    held: HashMap<Position, Option<Timestamp>>,
}

impl KeyFeedback {
    pub fn new(min_ms: u64) -> Self {
        Self {
            min_ms,
            held: HashMap::new(),
        }
    }

    pub fn press(&mut self, position: Position) {
        self.held.insert(position, None);
    }

    pub fn release(&mut self, position: Position, now: Timestamp) {
        self.held.insert(position, Some(now + self.min_ms));
    }

    pub fn prune(&mut self, now: Timestamp) {
        self.held
            .retain(|_, until| until.map_or(true, |until| now < until));
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }

    pub fn is_lit(&self, position: Position) -> bool {
        self.held.contains_key(&position)
    }
}

/// Split keyboard showing the labels of one layer
pub struct KeyboardView<'a> {
    pub layer: LayerId,
    pub feedback: &'a KeyFeedback,
    pub next: Option<Position>,
}

impl KeyboardView<'_> {
    fn key_span(&self, position: Position) -> Span<'static> {
        let slot = layout::slot(self.layer, position);
        let label = slot.map(|s| s.tap_label()).unwrap_or_default();
        let label = fit(&label, KEY_WIDTH - 2);
        let text = format!("[{label}]");

        let style = if self.feedback.is_lit(position) {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD)
        } else if self.next == Some(position) {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else if slot.is_some_and(|s| s.is_held_activator()) {
            Style::default().fg(Color::Magenta)
        } else if slot.is_none() {
            Style::default().add_modifier(Modifier::DIM)
        } else {
            Style::default()
        };
        Span::styled(text, style)
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for row in 0..ROWS {
            let mut spans = Vec::new();
            for col in 0..COLUMNS {
                if col == COLUMNS / 2 {
                    spans.push(Span::raw(SPLIT_GAP));
                }
                spans.push(self.key_span(Position(row * COLUMNS + col)));
            }
            lines.push(Line::from(spans));
        }

        // five left thumbs under the inner columns, three on the right
        let mut thumbs = vec![Span::raw(" ".repeat(KEY_WIDTH))];
        for pos in THUMB_START..THUMB_START + 5 {
            thumbs.push(self.key_span(Position(pos)));
        }
        thumbs.push(Span::raw(SPLIT_GAP));
        for pos in THUMB_START + 5..THUMB_START + 8 {
            thumbs.push(self.key_span(Position(pos)));
        }
        thumbs.push(Span::raw(" ".repeat(KEY_WIDTH * 3)));
        lines.push(Line::from(thumbs));
        lines
    }
}

impl Widget for KeyboardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.lines())
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

/// Center `label` in `width` columns, truncating wide labels
fn fit(label: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in label.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    let pad = width - used;
    format!("{}{}{}", " ".repeat(pad / 2), out, " ".repeat(pad - pad / 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_holds_for_minimum_duration() {
        let mut feedback = KeyFeedback::new(150);
        feedback.press(Position(14));
        feedback.prune(10_000);
        assert!(feedback.is_lit(Position(14)));

        feedback.release(Position(14), 1_000);
        feedback.prune(1_149);
        assert!(feedback.is_lit(Position(14)));
        feedback.prune(1_150);
        assert!(!feedback.is_lit(Position(14)));
    }

    #[test]
    fn fit_pads_and_truncates() {
        assert_eq!(fit("a", 3), " a ");
        assert_eq!(fit("PGUP", 3), "PGU");
        assert_eq!(fit("", 3), "   ");
    }

    #[test]
    fn renders_base_layer_labels() {
        let feedback = KeyFeedback::new(150);
        let view = KeyboardView {
            layer: LayerId::Base,
            feedback: &feedback,
            next: None,
        };
        let area = Rect::new(0, 0, 100, 4);
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);
        let rendered: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(rendered.contains("[ Q ]"));
        assert!(rendered.contains("[ F ]"));
    }
}
