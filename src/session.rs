use crate::keys::Timestamp;
use crate::metrics::{self, Progress, SessionResult};

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeystrokeRecord {
    pub expected: char,
    pub typed: char,
    pub outcome: Outcome,
    pub timestamp: Timestamp,
}

/// The text currently being typed and everything counted against it.
///
/// Counters and the start time span a whole lesson; `cursor` and `history`
/// belong to the current exercise only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PracticeSession {
    pub active: bool,
    pub expected_text: Vec<char>,
    pub cursor: usize,
    pub start_timestamp: Option<Timestamp>,
    pub last_timestamp: Option<Timestamp>,
    pub error_count: u32,
    pub total_keystrokes: u32,
    pub correct_keystrokes: u32,
    pub history: Vec<KeystrokeRecord>,
}

impl PracticeSession {
    pub fn new(text: &str) -> Self {
        Self {
            active: true,
            expected_text: text.chars().collect(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> String {
        self.expected_text.iter().collect()
    }

    /// Character the learner has to type next
    pub fn expected_char(&self) -> Option<char> {
        self.expected_text.get(self.cursor).copied()
    }

    pub fn has_started(&self) -> bool {
        self.start_timestamp.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.expected_text.len()
    }

    /// Was the character at `idx` typed correctly on the first attempt?
    pub fn first_try_correct(&self, idx: usize) -> bool {
        // history holds one record per attempt; count attempts until position idx is passed
        let mut pos = 0;
        for record in &self.history {
            if pos == idx {
                return record.outcome == Outcome::Correct;
            }
            if record.outcome == Outcome::Correct {
                pos += 1;
            }
        }
        true
    }

    /// Move on to the next exercise of the same lesson. Timing and counters
    /// carry over so elapsed time runs from the lesson's first keystroke.
    pub fn next_exercise(&mut self, text: &str) {
        self.expected_text = text.chars().collect();
        self.cursor = 0;
        self.history.clear();
    }

    pub fn finish(&mut self) {
        self.active = false;
    }

    pub fn progress(&self, now: Timestamp) -> Progress {
        let elapsed = metrics::elapsed_minutes(self.start_timestamp, now);
        Progress {
            wpm: metrics::words_per_minute(self.correct_keystrokes, elapsed),
            accuracy: metrics::accuracy(self.correct_keystrokes, self.total_keystrokes),
            error_count: self.error_count,
            cursor: self.cursor,
        }
    }

    /// Final figures, measured from the first to the last accepted keystroke
    pub fn result(&self) -> SessionResult {
        let end = self.last_timestamp.or(self.start_timestamp).unwrap_or(0);
        let elapsed = metrics::elapsed_minutes(self.start_timestamp, end);
        let elapsed_ms = self
            .start_timestamp
            .map(|start| end.saturating_sub(start))
            .unwrap_or(0);
        SessionResult {
            wpm: metrics::words_per_minute(self.correct_keystrokes, elapsed),
            accuracy: metrics::accuracy(self.correct_keystrokes, self.total_keystrokes),
            duration_seconds: (elapsed_ms as f64 / 1000.0).round() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let session = PracticeSession::new("fff");
        assert!(session.active);
        assert_eq!(session.expected_text, vec!['f', 'f', 'f']);
        assert_eq!(session.cursor, 0);
        assert_eq!(session.expected_char(), Some('f'));
        assert!(!session.has_started());
        assert!(!session.is_complete());
        assert_eq!(session.text(), "fff");
    }

    #[test]
    fn test_empty_text_is_complete() {
        let session = PracticeSession::new("");
        assert!(session.is_complete());
        assert_eq!(session.expected_char(), None);
    }

    #[test]
    fn test_next_exercise_keeps_timing_and_counters() {
        let mut session = PracticeSession::new("ab");
        session.start_timestamp = Some(1_000);
        session.cursor = 2;
        session.correct_keystrokes = 2;
        session.total_keystrokes = 3;
        session.error_count = 1;
        session.history.push(KeystrokeRecord {
            expected: 'a',
            typed: 'a',
            outcome: Outcome::Correct,
            timestamp: 1_000,
        });

        session.next_exercise("cd");

        assert_eq!(session.cursor, 0);
        assert!(session.history.is_empty());
        assert_eq!(session.text(), "cd");
        assert_eq!(session.start_timestamp, Some(1_000));
        assert_eq!(session.correct_keystrokes, 2);
        assert_eq!(session.total_keystrokes, 3);
        assert_eq!(session.error_count, 1);
    }

    #[test]
    fn test_progress_before_first_keystroke() {
        let session = PracticeSession::new("abc");
        let progress = session.progress(99_999);
        assert_eq!(progress.wpm, 0);
        assert_eq!(progress.accuracy, 100);
        assert_eq!(progress.error_count, 0);
        assert_eq!(progress.cursor, 0);
    }

    #[test]
    fn test_result_uses_last_keystroke() {
        let mut session = PracticeSession::new("aaaaaaaaaa");
        session.start_timestamp = Some(0);
        session.last_timestamp = Some(60_000);
        session.correct_keystrokes = 10;
        session.total_keystrokes = 10;
        let result = session.result();
        assert_eq!(result.wpm, 2);
        assert_eq!(result.accuracy, 100);
        assert_eq!(result.duration_seconds, 60);
    }

    #[test]
    fn test_first_try_correct() {
        let mut session = PracticeSession::new("ab");
        let rec = |expected, typed, outcome| KeystrokeRecord {
            expected,
            typed,
            outcome,
            timestamp: 0,
        };
        session.history.push(rec('a', 'x', Outcome::Incorrect));
        session.history.push(rec('a', 'a', Outcome::Correct));
        session.history.push(rec('b', 'b', Outcome::Correct));
        assert!(!session.first_try_correct(0));
        assert!(session.first_try_correct(1));
    }
}
