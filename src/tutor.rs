//! The practice controller: one owner for the layer tracker, the running
//! session, lesson progress and the persisted statistics.

use crate::config::Config;
use crate::error::{StoreError, TableError, TutorError};
use crate::keys::{KeyEvent, Timestamp};
use crate::layer::LayerTracker;
use crate::layout::LayerId;
use crate::lesson::{Advance, Lesson, LessonSequencer, LessonTable};
use crate::metrics::{Progress, SessionResult};
use crate::presenter::{Notification, Presenter};
use crate::quotes::QuoteTable;
use crate::session::{Outcome, PracticeSession};
use crate::stats::{SessionKind, UserStatistics};
use crate::store::StatsStore;
use crate::typing_policy::{submit_keystroke, typed_character};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LessonStart {
    Practice,
    Theory,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    pub result: SessionResult,
    pub stars: Option<u8>,
    pub lesson_id: Option<u32>,
    pub category: String,
}

#[derive(Clone, Debug)]
pub enum Activity {
    Idle,
    TypingTest { category: String },
    Lesson(LessonSequencer),
    Theory(LessonSequencer),
    Finished(Completion),
}

pub struct Tutor<S: StatsStore, P: Presenter> {
    lessons: LessonTable,
    quotes: QuoteTable,
    quote_count: usize,
    layers: LayerTracker,
    session: Option<PracticeSession>,
    activity: Activity,
    stats: UserStatistics,
    store: S,
    presenter: P,
    rng: StdRng,
}

impl<S: StatsStore, P: Presenter> Tutor<S, P> {
    pub fn new(config: &Config, store: S, presenter: P) -> Result<Self, TableError> {
        Ok(Self::with_tables(
            config,
            LessonTable::embedded()?,
            QuoteTable::embedded()?,
            store,
            presenter,
        ))
    }

    pub fn with_tables(
        config: &Config,
        lessons: LessonTable,
        quotes: QuoteTable,
        store: S,
        presenter: P,
    ) -> Self {
        let stats = store.load();
        Self {
            lessons,
            quotes,
            quote_count: config.quote_count.max(1),
            layers: LayerTracker::new(config.layer_timeout_ms),
            session: None,
            activity: Activity::Idle,
            stats,
            store,
            presenter,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic typing-test texts
    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn key_down(&mut self, event: &KeyEvent) {
        self.layers.key_down(event, &mut self.presenter);

        let Some(typed) = typed_character(event) else {
            return;
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(stroke) = submit_keystroke(session, typed, event.timestamp) else {
            return;
        };

        self.stats.record_attempt(stroke.expected);
        let correct = stroke.outcome == Outcome::Correct;
        if !correct {
            self.stats.record_error(stroke.expected);
        }
        self.presenter.notify(Notification::Keystroke {
            expected: stroke.expected,
            typed: stroke.typed,
            correct,
        });
        let progress = session.progress(event.timestamp);
        self.presenter.notify(progress_notification(progress));

        if !correct {
            self.persist();
        }
        if stroke.completed {
            self.exercise_complete();
        }
    }

    pub fn key_up(&mut self, event: &KeyEvent) {
        self.layers.key_up(event, &mut self.presenter);
    }

    pub fn tick(&mut self, now: Timestamp) {
        self.layers.tick(now, &mut self.presenter);
        if let Some(session) = self.session.as_ref().filter(|s| s.has_started()) {
            self.presenter
                .notify(progress_notification(session.progress(now)));
        }
    }

    pub fn start_lesson(&mut self, id: u32) -> Result<LessonStart, TutorError> {
        let lesson = self
            .lessons
            .get(id)
            .cloned()
            .ok_or(TutorError::LessonNotFound(id))?;
        self.clear_session();
        self.layers.set_layer(lesson.layer(), &mut self.presenter);

        let mut sequencer = LessonSequencer::new(lesson);
        if sequencer.lesson().is_theory() {
            info!(lesson = id, "theory lesson opened");
            self.activity = Activity::Theory(sequencer);
            return Ok(LessonStart::Theory);
        }

        let text = sequencer.start().unwrap_or_default().to_string();
        info!(lesson = id, exercises = sequencer.total(), "lesson started");
        self.session = Some(PracticeSession::new(&text));
        self.activity = Activity::Lesson(sequencer);
        Ok(LessonStart::Practice)
    }

    /// Theory lessons count as completed once read
    pub fn acknowledge_theory(&mut self) -> Result<u32, TutorError> {
        let Activity::Theory(sequencer) = &mut self.activity else {
            return Err(TutorError::NoActiveTheory);
        };
        sequencer.complete();
        let id = sequencer.lesson().id;
        self.stats.record_lesson(id, None);
        self.persist();
        info!(lesson = id, "theory acknowledged");
        self.activity = Activity::Idle;
        self.layers.reset(&mut self.presenter);
        Ok(id)
    }

    pub fn start_typing_test(&mut self, category: &str) -> Result<(), TutorError> {
        let text = self
            .quotes
            .build_text(category, self.quote_count, &mut self.rng)
            .ok_or_else(|| TutorError::UnknownCategory(category.to_string()))?;
        self.clear_session();
        self.layers.reset(&mut self.presenter);
        info!(category, chars = text.chars().count(), "typing test started");
        self.session = Some(PracticeSession::new(&text));
        self.activity = Activity::TypingTest {
            category: category.to_string(),
        };
        Ok(())
    }

    /// The lesson after the current or last finished one, or the first lesson
    pub fn start_next_lesson(&mut self) -> Result<LessonStart, TutorError> {
        let next = self.current_lesson_id().map_or(1, |id| id + 1);
        self.start_lesson(next)
    }

    pub fn quit(&mut self) {
        self.clear_session();
        self.activity = Activity::Idle;
        self.layers.reset(&mut self.presenter);
        self.persist();
    }

    pub fn progress(&self, now: Timestamp) -> Option<Progress> {
        self.session.as_ref().map(|s| s.progress(now))
    }

    pub fn statistics(&self) -> &UserStatistics {
        &self.stats
    }

    pub fn reset_statistics(&mut self) -> Result<(), StoreError> {
        self.stats.reset();
        info!("statistics reset");
        self.store.save(&self.stats)
    }

    pub fn layer(&self) -> LayerId {
        self.layers.current()
    }

    pub fn layer_deadline(&self) -> Option<Timestamp> {
        self.layers.deadline()
    }

    pub fn session(&self) -> Option<&PracticeSession> {
        self.session.as_ref()
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// Lesson being practiced or read, or the one just finished
    pub fn current_lesson(&self) -> Option<&Lesson> {
        match &self.activity {
            Activity::Lesson(seq) | Activity::Theory(seq) => Some(seq.lesson()),
            Activity::Finished(Completion {
                lesson_id: Some(id),
                ..
            }) => self.lessons.get(*id),
            _ => None,
        }
    }

    pub fn current_lesson_id(&self) -> Option<u32> {
        self.current_lesson().map(|l| l.id)
    }

    pub fn lessons(&self) -> &LessonTable {
        &self.lessons
    }

    pub fn quotes(&self) -> &QuoteTable {
        &self.quotes
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    fn exercise_complete(&mut self) {
        let Some(result) = self.session.as_ref().map(PracticeSession::result) else {
            return;
        };
        match &mut self.activity {
            Activity::TypingTest { category } => {
                let category = category.clone();
                self.finish(result, category, SessionKind::Typing, None);
            }
            Activity::Lesson(sequencer) => match sequencer.advance() {
                Advance::Next { index, text } => {
                    let total = sequencer.total();
                    if let Some(session) = self.session.as_mut() {
                        session.next_exercise(&text);
                    }
                    self.presenter
                        .notify(Notification::ExerciseAdvanced { index, total });
                }
                Advance::Finished => {
                    let id = sequencer.lesson().id;
                    let stars = sequencer.star_rating(result.wpm, result.accuracy);
                    self.finish(
                        result,
                        format!("lesson-{id}"),
                        SessionKind::Lesson,
                        Some((id, stars)),
                    );
                }
            },
            _ => {}
        }
    }

    fn finish(
        &mut self,
        result: SessionResult,
        category: String,
        kind: SessionKind,
        lesson: Option<(u32, u8)>,
    ) {
        self.clear_session();
        if let Some((id, stars)) = lesson {
            self.stats.record_lesson(id, Some(stars));
        }
        self.stats
            .finalize_session(&result, &category, kind, Utc::now());
        self.persist();

        let stars = lesson.map(|(_, stars)| stars);
        self.presenter.notify(Notification::SessionComplete {
            wpm: result.wpm,
            accuracy: result.accuracy,
            stars,
        });
        self.activity = Activity::Finished(Completion {
            result,
            stars,
            lesson_id: lesson.map(|(id, _)| id),
            category,
        });
    }

    fn clear_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.finish();
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.stats) {
            warn!(error = %e, "failed to save statistics");
        }
    }
}

fn progress_notification(progress: Progress) -> Notification {
    Notification::SessionProgress {
        wpm: progress.wpm,
        accuracy: progress.accuracy,
        error_count: progress.error_count,
        cursor: progress.cursor,
    }
}
