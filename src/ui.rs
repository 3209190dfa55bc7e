pub mod charting;
pub mod keyboard;
pub mod screen;
pub mod stats_dashboard;

use keyball_tutor::{
    keys::KeyCode,
    layout::{self, Finger, LayerId},
    lesson::LessonState,
    session::{Outcome, PracticeSession},
    tutor::Activity,
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget, Tabs, Widget, Wrap},
};

use crate::{
    ui::{
        keyboard::KeyboardView,
        stats_dashboard::StatsDashboard,
    },
    App, HomeTab,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;
const KEYBOARD_HEIGHT: u16 = 4;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        screen::current_screen(&self.state).render(self, area, buf);
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

/// Filled and empty stars out of five
pub fn star_string(stars: u8) -> String {
    let filled = stars.min(5) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

pub fn finger_label(finger: Finger) -> &'static str {
    match finger {
        Finger::LeftPinky => "left pinky",
        Finger::LeftRing => "left ring",
        Finger::LeftMiddle => "left middle",
        Finger::LeftIndex => "left index",
        Finger::LeftThumb => "left thumb",
        Finger::RightThumb => "right thumb",
        Finger::RightIndex => "right index",
        Finger::RightMiddle => "right middle",
        Finger::RightRing => "right ring",
        Finger::RightPinky => "right pinky",
    }
}

/// How to reach `layer` from BASE
pub fn layer_hint(layer: LayerId) -> Option<String> {
    let activation = layout::activation_for(layer)?;
    let thumb = layout::slot(LayerId::Base, activation.position)?;
    Some(format!("hold {} for {layer}", thumb.tap_label()))
}

fn visible(c: char) -> String {
    match c {
        ' ' => "·".to_owned(),
        '\n' => "⏎".to_owned(),
        c => c.to_string(),
    }
}

/// The exercise text: typed characters green (yellow when corrected), the
/// cursor underlined (red after a miss) and the remainder dimmed
pub fn text_spans(session: &PracticeSession) -> Vec<Span<'static>> {
    let green = bold().fg(Color::Green);
    let corrected = bold().fg(Color::Yellow);
    let dim = bold().add_modifier(Modifier::DIM);

    let mut spans: Vec<Span> = session.expected_text[..session.cursor.min(session.expected_text.len())]
        .iter()
        .enumerate()
        .map(|(idx, &c)| {
            let style = if session.first_try_correct(idx) {
                green
            } else {
                corrected
            };
            Span::styled(c.to_string(), style)
        })
        .collect();

    if let Some(expected) = session.expected_char() {
        let missed = session
            .history
            .last()
            .is_some_and(|r| r.outcome == Outcome::Incorrect);
        let style = if missed {
            bold().fg(Color::White).bg(Color::Red)
        } else {
            dim.add_modifier(Modifier::UNDERLINED)
        };
        let shown = if missed {
            visible(expected)
        } else {
            expected.to_string()
        };
        spans.push(Span::styled(shown, style));

        let rest: String = session.expected_text[session.cursor + 1..].iter().collect();
        spans.push(Span::styled(rest, dim));
    }
    spans
}

fn render_legend(app: &App, text: &str, area: Rect, buf: &mut Buffer) {
    let line = match &app.notice {
        Some(notice) => Line::from(vec![
            Span::styled(notice.clone(), bold().fg(Color::Cyan)),
            Span::raw("   "),
            Span::styled(text.to_owned(), italic()),
        ]),
        None => Line::from(Span::styled(text.to_owned(), italic())),
    };
    Paragraph::new(line).render(area, buf);
}

pub(crate) fn render_home(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(area);

    let titles: Vec<Line> = HomeTab::ALL
        .iter()
        .map(|t| Line::from(t.to_string()))
        .collect();
    let selected = HomeTab::ALL.iter().position(|t| *t == app.tab).unwrap_or(0);
    Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("keyball44 tutor"))
        .select(selected)
        .highlight_style(bold().fg(Color::Magenta))
        .render(chunks[0], buf);

    match app.tab {
        HomeTab::Lessons => {
            render_lessons(app, chunks[1], buf);
            render_legend(
                app,
                "(enter) start / (↑↓) select / (tab) switch / (esc)ape",
                chunks[2],
                buf,
            );
        }
        HomeTab::TypingTest => {
            render_categories(app, chunks[1], buf);
            render_legend(
                app,
                "(enter) start / (↑↓) select / (tab) switch / (esc)ape",
                chunks[2],
                buf,
            );
        }
        HomeTab::Statistics => {
            let stats_area = Rect {
                height: chunks[1].height + chunks[2].height,
                ..chunks[1]
            };
            StatsDashboard {
                stats: app.tutor.statistics(),
                lesson_count: app.tutor.lessons().len(),
                confirm_reset: app.confirm_reset,
            }
            .render(stats_area, buf);
        }
    }
}

fn render_lessons(app: &App, area: Rect, buf: &mut Buffer) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let stats = app.tutor.statistics();
    let items: Vec<ListItem> = app
        .tutor
        .lessons()
        .iter()
        .map(|lesson| {
            let mark = if lesson.is_theory() {
                if stats.is_completed(lesson.id) {
                    Span::styled("read ✓", Style::default().fg(Color::Green))
                } else {
                    Span::styled("theory", Style::default().add_modifier(Modifier::DIM))
                }
            } else if stats.is_completed(lesson.id) {
                Span::styled(
                    star_string(stats.stars_for(lesson.id)),
                    Style::default().fg(Color::Yellow),
                )
            } else {
                Span::styled(star_string(0), Style::default().add_modifier(Modifier::DIM))
            };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{:>2}. {:<34} ", lesson.id, lesson.name)),
                Span::styled(format!("{:<6}", lesson.layer()), Style::default().fg(Color::Cyan)),
                mark,
            ]))
        })
        .collect();

    let mut state = ListState::default().with_selected(Some(app.lesson_idx));
    StatefulWidget::render(
        List::new(items)
            .block(Block::default().borders(Borders::ALL).title("lessons"))
            .highlight_style(bold().bg(Color::DarkGray))
            .highlight_symbol("> "),
        halves[0],
        buf,
        &mut state,
    );

    let Some(lesson) = app.tutor.lessons().iter().nth(app.lesson_idx) else {
        return;
    };
    let mut lines = vec![
        Line::from(Span::styled(lesson.name.clone(), bold())),
        Line::from(""),
        Line::from(lesson.description.clone()),
        Line::from(""),
    ];
    if lesson.is_theory() {
        lines.push(Line::from(Span::styled("theory, read and acknowledge", italic())));
    } else {
        lines.push(Line::from(format!(
            "{} exercises, target {} wpm at {}% accuracy",
            lesson.exercises.len(),
            lesson.min_wpm,
            lesson.min_accuracy
        )));
    }
    if let Some(hint) = layer_hint(lesson.layer()) {
        lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::Magenta))));
    }
    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("details"))
        .render(halves[1], buf);
}

fn render_categories(app: &App, area: Rect, buf: &mut Buffer) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let categories = app.tutor.quotes().categories();
    let items: Vec<ListItem> = categories
        .iter()
        .map(|c| ListItem::new(format!("{:<16} {:>3} texts", c.name, c.texts.len())))
        .collect();
    let mut state = ListState::default().with_selected(Some(app.category_idx));
    StatefulWidget::render(
        List::new(items)
            .block(Block::default().borders(Borders::ALL).title("categories"))
            .highlight_style(bold().bg(Color::DarkGray))
            .highlight_symbol("> "),
        halves[0],
        buf,
        &mut state,
    );

    if let Some(category) = categories.get(app.category_idx) {
        let sample = category.texts.first().cloned().unwrap_or_default();
        Paragraph::new(vec![
            Line::from(Span::styled(category.name.clone(), bold())),
            Line::from(""),
            Line::from(Span::styled(sample, italic())),
        ])
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("sample"))
        .render(halves[1], buf);
    }
}

pub(crate) fn render_practice(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(session) = app.tutor.session() else {
        return;
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Length(1), // live figures
            Constraint::Min(3),    // text
            Constraint::Length(1), // next key
            Constraint::Length(KEYBOARD_HEIGHT),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let title = match app.tutor.activity() {
        Activity::Lesson(seq) => {
            let exercise = match seq.state() {
                LessonState::InExercise(i) => i + 1,
                _ => seq.total(),
            };
            format!(
                "Lesson {}: {}   exercise {}/{}",
                seq.lesson().id,
                seq.lesson().name,
                exercise,
                seq.total()
            )
        }
        Activity::TypingTest { category } => format!("Typing test: {category}"),
        _ => String::new(),
    };
    Paragraph::new(Span::styled(title, bold().fg(Color::Magenta)))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let layer = app.tutor.layer();
    let progress = app.tutor.progress(app.now).unwrap_or_default();
    let mut figures = vec![
        Span::styled(
            format!(
                "{} wpm   {}% acc   {} errors   ",
                progress.wpm, progress.accuracy, progress.error_count
            ),
            bold(),
        ),
        Span::styled(format!("layer {layer}"), bold().fg(Color::Cyan)),
    ];
    if let Some(deadline) = app.tutor.layer_deadline() {
        figures.push(Span::styled(
            format!(" ({}ms)", deadline.saturating_sub(app.now)),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }
    Paragraph::new(Line::from(figures))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Line::from(text_spans(session)))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .render(chunks[2], buf);

    let next = session
        .expected_char()
        .and_then(|c| layout::position_of(KeyCode::Char(c), layer));
    if let Some(expected) = session.expected_char() {
        let finger = next
            .and_then(layout::finger_for)
            .map(finger_label)
            .unwrap_or("?");
        Paragraph::new(Span::styled(
            format!("next: {}  ({finger})", visible(expected)),
            italic(),
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
    }

    KeyboardView {
        layer,
        feedback: &app.feedback,
        next,
    }
    .render(chunks[4], buf);

    render_legend(app, "(esc)ape", chunks[5], buf);
}

pub(crate) fn render_theory(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(lesson) = app.tutor.current_lesson() else {
        return;
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(4),
            Constraint::Length(KEYBOARD_HEIGHT),
            Constraint::Length(1),
        ])
        .split(area);

    let mut lines = vec![
        Line::from(Span::styled(
            format!("Lesson {}: {}", lesson.id, lesson.name),
            bold().fg(Color::Magenta),
        )),
        Line::from(""),
        Line::from(lesson.description.clone()),
    ];
    if let Some(hint) = layer_hint(lesson.layer()) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(hint, bold().fg(Color::Cyan))));
    }
    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("theory"))
        .render(chunks[0], buf);

    KeyboardView {
        layer: lesson.layer(),
        feedback: &app.feedback,
        next: None,
    }
    .render(chunks[1], buf);

    render_legend(app, "(enter) got it / (esc)ape", chunks[2], buf);
}

pub(crate) fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let Activity::Finished(done) = app.tutor.activity() else {
        return;
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1), // title
            Constraint::Length(1), // figures
            Constraint::Length(1), // stars
            Constraint::Length(1), // target
            Constraint::Min(1),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let lesson = done.lesson_id.and_then(|id| app.tutor.lessons().get(id));
    let title = match lesson {
        Some(lesson) => format!("Lesson {} complete: {}", lesson.id, lesson.name),
        None => format!("Typing test complete: {}", done.category),
    };
    Paragraph::new(Span::styled(title, bold().fg(Color::Magenta)))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} wpm   {}% acc   {}s",
            done.result.wpm, done.result.accuracy, done.result.duration_seconds
        ),
        bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    if let Some(stars) = done.stars {
        Paragraph::new(Span::styled(star_string(stars), bold().fg(Color::Yellow)))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }
    if let Some(lesson) = lesson {
        Paragraph::new(Span::styled(
            format!(
                "target {} wpm at {}% accuracy",
                lesson.min_wpm, lesson.min_accuracy
            ),
            italic(),
        ))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
    }

    let legend = if lesson.is_some() {
        "(r)etry / (n)ext lesson / (esc)ape"
    } else {
        "(r)etry / (n)ew text / (esc)ape"
    };
    render_legend(app, legend, chunks[6], buf);
}
