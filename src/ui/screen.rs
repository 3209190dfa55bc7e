use ratatui::{buffer::Buffer, layout::Rect};

use crate::{
    ui::{render_home, render_practice, render_results, render_theory},
    App, AppState,
};

/// A UI screen boundary, one per app state
pub trait Screen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

/// Tabs for lessons, typing tests and statistics
pub struct HomeScreen;

impl Screen for HomeScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_home(app, area, buf);
    }
}

/// Text to type, live figures and the keyboard
pub struct PracticeScreen;

impl Screen for PracticeScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_practice(app, area, buf);
    }
}

pub struct TheoryScreen;

impl Screen for TheoryScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_theory(app, area, buf);
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_results(app, area, buf);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Home => Box::new(HomeScreen),
        AppState::Practice => Box::new(PracticeScreen),
        AppState::Theory => Box::new(TheoryScreen),
        AppState::Results => Box::new(ResultsScreen),
    }
}
