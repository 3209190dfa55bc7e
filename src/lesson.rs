//! Lesson definitions and the walk through a lesson's exercises.

use crate::error::TableError;
use crate::layout::LayerId;
use include_dir::{include_dir, Dir};
use serde::Deserialize;

pub(crate) static DATA_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/data");

const LESSONS_FILE: &str = "lessons.json";

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Lesson {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub exercises: Vec<String>,
    #[serde(default)]
    pub min_wpm: u32,
    #[serde(default)]
    pub min_accuracy: u32,
    #[serde(default)]
    pub layer: Option<LayerId>,
    #[serde(default)]
    pub theory: bool,
}

impl Lesson {
    /// Theory lessons are read, not typed
    pub fn is_theory(&self) -> bool {
        self.theory || self.exercises.is_empty()
    }

    pub fn layer(&self) -> LayerId {
        self.layer.unwrap_or(LayerId::Base)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct LessonTable {
    lessons: Vec<Lesson>,
}

impl LessonTable {
    pub fn embedded() -> Result<Self, TableError> {
        let file = DATA_DIR
            .get_file(LESSONS_FILE)
            .ok_or(TableError::Missing(LESSONS_FILE))?;
        Self::from_json(file.contents_utf8().unwrap_or_default())
    }

    pub fn from_json(data: &str) -> Result<Self, TableError> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn get(&self, id: u32) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.lessons.iter().map(|l| l.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lesson> {
        self.lessons.iter()
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }
}

/// Star rating for a finished lesson.
///
/// Each tier is checked against the lesson's own thresholds and the highest
/// tier satisfied wins; finishing at all is worth one star.
pub fn star_rating(wpm: u32, accuracy: u32, min_wpm: u32, min_accuracy: u32) -> u8 {
    if accuracy >= 98 && wpm >= min_wpm + 15 {
        5
    } else if accuracy >= 95 && wpm >= min_wpm + 10 {
        4
    } else if accuracy >= min_accuracy + 5 && wpm >= min_wpm + 5 {
        3
    } else if accuracy >= min_accuracy && wpm >= min_wpm {
        2
    } else {
        1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LessonState {
    NotStarted,
    InExercise(usize),
    Completed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advance {
    Next { index: usize, text: String },
    Finished,
}

#[derive(Clone, Debug)]
pub struct LessonSequencer {
    lesson: Lesson,
    state: LessonState,
}

impl LessonSequencer {
    pub fn new(lesson: Lesson) -> Self {
        Self {
            lesson,
            state: LessonState::NotStarted,
        }
    }

    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    pub fn state(&self) -> LessonState {
        self.state
    }

    pub fn total(&self) -> usize {
        self.lesson.exercises.len()
    }

    /// Enter the first exercise and return its text
    pub fn start(&mut self) -> Option<&str> {
        if self.lesson.exercises.is_empty() {
            return None;
        }
        self.state = LessonState::InExercise(0);
        self.current_exercise()
    }

    pub fn current_exercise(&self) -> Option<&str> {
        match self.state {
            LessonState::InExercise(i) => self.lesson.exercises.get(i).map(String::as_str),
            _ => None,
        }
    }

    /// Called when the current exercise has been typed out
    pub fn advance(&mut self) -> Advance {
        match self.state {
            LessonState::InExercise(i) if i + 1 < self.total() => {
                self.state = LessonState::InExercise(i + 1);
                Advance::Next {
                    index: i + 1,
                    text: self.lesson.exercises[i + 1].clone(),
                }
            }
            _ => {
                self.state = LessonState::Completed;
                Advance::Finished
            }
        }
    }

    /// Theory lessons complete on acknowledgment
    pub fn complete(&mut self) {
        self.state = LessonState::Completed;
    }

    pub fn star_rating(&self, wpm: u32, accuracy: u32) -> u8 {
        star_rating(wpm, accuracy, self.lesson.min_wpm, self.lesson.min_accuracy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn lesson(exercises: &[&str]) -> Lesson {
        Lesson {
            id: 1,
            name: "test".into(),
            description: String::new(),
            exercises: exercises.iter().map(|s| s.to_string()).collect(),
            min_wpm: 10,
            min_accuracy: 90,
            layer: None,
            theory: false,
        }
    }

    #[test]
    fn test_embedded_table() {
        let table = LessonTable::embedded().unwrap();
        assert_eq!(table.len(), 35);
        let ids: Vec<u32> = table.ids().collect();
        assert_eq!(ids, (1..=35).collect::<Vec<_>>());

        let first = table.get(1).unwrap();
        assert_eq!(first.exercises[0], "fff fff fff");
        assert_eq!(first.layer(), LayerId::Base);
        assert!(!first.is_theory());

        let nav = table.get(35).unwrap();
        assert!(nav.is_theory());
        assert_eq!(nav.layer(), LayerId::Nav);

        assert!(table.iter().any(|l| l.layer == Some(LayerId::Num)));
        assert!(table.iter().any(|l| l.layer == Some(LayerId::Sym)));
        assert!(table.get(36).is_none());
    }

    #[test]
    fn test_invalid_table() {
        assert_matches!(LessonTable::from_json("{"), Err(TableError::Invalid(_)));
        assert_matches!(
            LessonTable::from_json(r#"{"lessons":[{"id":1,"name":"x","layer":9}]}"#),
            Err(TableError::Invalid(_))
        );
    }

    #[test]
    fn test_star_rating_tiers() {
        assert_eq!(star_rating(25, 99, 10, 90), 5);
        assert_eq!(star_rating(20, 96, 10, 90), 4);
        assert_eq!(star_rating(15, 95, 10, 90), 3);
        assert_eq!(star_rating(10, 90, 10, 90), 2);
        assert_eq!(star_rating(9, 100, 10, 90), 1);
        assert_eq!(star_rating(40, 89, 10, 90), 1);
    }

    #[test]
    fn test_star_rating_gates_are_independent() {
        // fails the min_accuracy+5 gate but clears the fixed 95% gate
        assert_eq!(star_rating(30, 96, 10, 95), 4);
        // 5-star gate satisfied even though min_accuracy is above 98
        assert_eq!(star_rating(30, 98, 10, 99), 5);
    }

    #[test]
    fn test_sequencer_walk() {
        let mut seq = LessonSequencer::new(lesson(&["aa", "bb", "cc"]));
        assert_eq!(seq.state(), LessonState::NotStarted);
        assert_eq!(seq.current_exercise(), None);

        assert_eq!(seq.start(), Some("aa"));
        assert_eq!(seq.state(), LessonState::InExercise(0));

        assert_eq!(
            seq.advance(),
            Advance::Next {
                index: 1,
                text: "bb".into()
            }
        );
        assert_eq!(seq.current_exercise(), Some("bb"));
        assert_matches!(seq.advance(), Advance::Next { index: 2, .. });
        assert_eq!(seq.advance(), Advance::Finished);
        assert_eq!(seq.state(), LessonState::Completed);
        assert_eq!(seq.current_exercise(), None);
    }

    #[test]
    fn test_sequencer_without_exercises() {
        let mut seq = LessonSequencer::new(lesson(&[]));
        assert!(seq.lesson().is_theory());
        assert_eq!(seq.start(), None);
        seq.complete();
        assert_eq!(seq.state(), LessonState::Completed);
    }
}
