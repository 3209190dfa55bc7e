use chrono::Utc;
use keyball_tutor::stats::{SessionEntry, SessionKind, UserStatistics};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};
use time_humanize::{Accuracy, HumanTime, Tense};

use crate::ui::charting::{compute_chart_params, format_label, wpm_points, CHART_SESSIONS};

const RECENT_SESSIONS: usize = 8;
const PROBLEM_KEYS: usize = 5;

const HEATMAP_ROWS: [&[char]; 4] = [
    &['q', 'w', 'e', 'r', 't', 'y', 'u', 'i', 'o', 'p'],
    &['a', 's', 'd', 'f', 'g', 'h', 'j', 'k', 'l', '\''],
    &['z', 'x', 'c', 'v', 'b', 'n', 'm', ',', '.', '/'],
    &[' '],
];

pub struct StatsDashboard<'a> {
    pub stats: &'a UserStatistics,
    pub lesson_count: usize,
    pub confirm_reset: bool,
}

/// Share of the worst key's error count, 0.0..=1.0
pub fn heat_intensity(errors: u32, max_errors: u32) -> f64 {
    if max_errors == 0 {
        0.0
    } else {
        (errors as f64 / max_errors as f64).min(1.0)
    }
}

/// Green for clean keys through to red for the worst one
pub fn heat_color(intensity: f64) -> Color {
    if intensity <= 0.0 {
        return Color::Rgb(40, 60, 40);
    }
    let r = (60.0 + 195.0 * intensity) as u8;
    let g = (200.0 * (1.0 - intensity)) as u8;
    Color::Rgb(r, g, 40)
}

pub fn format_practice_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {}s", seconds % 60)
    } else {
        format!("{seconds}s")
    }
}

fn time_ago(entry: &SessionEntry) -> String {
    let elapsed = (Utc::now() - entry.date).to_std().unwrap_or_default();
    HumanTime::from(elapsed).to_text_en(Accuracy::Rough, Tense::Past)
}

fn session_label(entry: &SessionEntry) -> String {
    match entry.kind {
        SessionKind::Lesson => entry
            .category
            .strip_prefix("lesson-")
            .map(|id| format!("Lesson {id}"))
            .unwrap_or_else(|| entry.category.clone()),
        SessionKind::Typing => entry.category.clone(),
    }
}

impl StatsDashboard<'_> {
    fn render_overview(&self, area: Rect, buf: &mut Buffer) {
        let stats = self.stats;
        let trend = stats.wpm_trend();
        let trend_span = match trend {
            t if t > 0 => Span::styled(format!("↑{t}"), Style::default().fg(Color::Green)),
            t if t < 0 => Span::styled(format!("↓{}", -t), Style::default().fg(Color::Red)),
            _ => Span::styled("→", Style::default().add_modifier(Modifier::DIM)),
        };
        let cards = [
            ("best wpm", Span::raw(stats.best_wpm.to_string())),
            ("avg wpm", Span::raw(stats.average_wpm.to_string())),
            ("avg acc", Span::raw(format!("{}%", stats.average_accuracy))),
            ("sessions", Span::raw(stats.sessions_count.to_string())),
            ("practice", Span::raw(format_practice_time(stats.total_practice_time))),
            (
                "lessons",
                Span::raw(format!("{}/{}", stats.completed_count(), self.lesson_count)),
            ),
            ("trend", trend_span),
        ];

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, cards.len() as u32); cards.len()])
            .split(area);
        for ((title, value), chunk) in cards.into_iter().zip(chunks.iter()) {
            Paragraph::new(Line::from(value.patch_style(Style::default().add_modifier(Modifier::BOLD))))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(title))
                .render(*chunk, buf);
        }
    }

    fn render_chart(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("wpm, last {CHART_SESSIONS} sessions"));
        let points = wpm_points(self.stats, CHART_SESSIONS);
        if points.is_empty() {
            Paragraph::new("No sessions yet. Start practicing!")
                .alignment(Alignment::Center)
                .block(block)
                .render(area, buf);
            return;
        }

        let (sessions, ceiling) = compute_chart_params(&points);
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let datasets = vec![Dataset::default()
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(Color::Magenta))
            .graph_type(GraphType::Line)
            .data(&points)];

        Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .bounds([1.0, sessions])
                    .labels(vec![
                        Span::styled("1", bold_style),
                        Span::styled(format_label(sessions), bold_style),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .bounds([0.0, ceiling])
                    .labels(vec![
                        Span::styled("0", bold_style),
                        Span::styled(format_label(ceiling), bold_style),
                    ]),
            )
            .render(area, buf);
    }

    fn render_recent(&self, area: Rect, buf: &mut Buffer) {
        let lines: Vec<Line> = self
            .stats
            .recent_sessions(RECENT_SESSIONS)
            .into_iter()
            .map(|entry| {
                Line::from(vec![
                    Span::styled(format!("{:<12}", session_label(entry)), Style::default().fg(Color::Cyan)),
                    Span::raw(format!("{:>4} wpm {:>4}% ", entry.wpm, entry.accuracy)),
                    Span::styled(time_ago(entry), Style::default().add_modifier(Modifier::DIM)),
                ])
            })
            .collect();
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("recent"))
            .render(area, buf);
    }

    fn render_heatmap(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title("error heatmap");
        let max_errors = self.stats.max_errors();
        if max_errors == 0 {
            Paragraph::new("No error data yet.")
                .alignment(Alignment::Center)
                .block(block)
                .render(area, buf);
            return;
        }

        let lines: Vec<Line> = HEATMAP_ROWS
            .iter()
            .map(|row| {
                let spans: Vec<Span> = row
                    .iter()
                    .map(|&key| {
                        let intensity = heat_intensity(self.stats.errors_for(key), max_errors);
                        let label = match key {
                            ' ' => "    SPACE    ".to_string(),
                            k => format!(" {} ", k.to_ascii_uppercase()),
                        };
                        Span::styled(
                            label,
                            Style::default().fg(Color::White).bg(heat_color(intensity)),
                        )
                    })
                    .collect();
                Line::from(spans)
            })
            .collect();
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block)
            .render(area, buf);
    }

    fn render_problem_keys(&self, area: Rect, buf: &mut Buffer) {
        let lines: Vec<Line> = self
            .stats
            .top_problem_keys(PROBLEM_KEYS)
            .into_iter()
            .map(|p| {
                let key = match p.key {
                    ' ' => "SPACE".to_string(),
                    k => k.to_ascii_uppercase().to_string(),
                };
                Line::from(vec![
                    Span::styled(format!("{key:<6}"), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(format!("{:>4} errors", p.errors), Style::default().fg(Color::Red)),
                    Span::raw(format!(" {:>5.1}%", p.rate * 100.0)),
                ])
            })
            .collect();
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("problem keys"))
            .render(area, buf);
    }
}

impl Widget for StatsDashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // overview cards
                Constraint::Min(8),    // chart + recent
                Constraint::Length(6), // heatmap + problem keys
                Constraint::Length(1), // legend
            ])
            .split(area);

        self.render_overview(chunks[0], buf);

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);
        self.render_chart(middle[0], buf);
        self.render_recent(middle[1], buf);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(chunks[2]);
        self.render_heatmap(bottom[0], buf);
        self.render_problem_keys(bottom[1], buf);

        let legend = if self.confirm_reset {
            Span::styled(
                "reset all statistics? (y)es / any other key cancels",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(
                "(x) reset statistics / (tab) switch / (esc)ape",
                Style::default().add_modifier(Modifier::ITALIC),
            )
        };
        Paragraph::new(legend)
            .wrap(Wrap { trim: true })
            .render(chunks[3], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyball_tutor::metrics::SessionResult;

    fn rendered(stats: &UserStatistics, confirm_reset: bool) -> String {
        let area = Rect::new(0, 0, 120, 30);
        let mut buf = Buffer::empty(area);
        StatsDashboard {
            stats,
            lesson_count: 35,
            confirm_reset,
        }
        .render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn empty_dashboard() {
        let out = rendered(&UserStatistics::default(), false);
        assert!(out.contains("No sessions yet"));
        assert!(out.contains("No error data yet"));
        assert!(out.contains("0/35"));
    }

    #[test]
    fn populated_dashboard() {
        let mut stats = UserStatistics::default();
        stats.record_attempt('f');
        stats.record_attempt('f');
        stats.record_error('f');
        stats.finalize_session(
            &SessionResult {
                wpm: 42,
                accuracy: 96,
                duration_seconds: 30,
            },
            "lesson-3",
            SessionKind::Lesson,
            Utc::now(),
        );
        let out = rendered(&stats, false);
        assert!(out.contains("Lesson 3"));
        assert!(out.contains("errors"));
        assert!(out.contains("42"));
    }

    #[test]
    fn confirm_prompt() {
        assert!(rendered(&UserStatistics::default(), true).contains("reset all statistics?"));
    }

    #[test]
    fn heat_scale() {
        assert_eq!(heat_intensity(0, 0), 0.0);
        assert_eq!(heat_intensity(5, 10), 0.5);
        assert_eq!(heat_color(1.0), Color::Rgb(255, 0, 40));
        assert_eq!(heat_color(0.0), Color::Rgb(40, 60, 40));
    }

    #[test]
    fn practice_time() {
        assert_eq!(format_practice_time(42), "42s");
        assert_eq!(format_practice_time(125), "2m 5s");
        assert_eq!(format_practice_time(3_900), "1h 5m");
    }
}
