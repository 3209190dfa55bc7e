use crate::keys::{KeyEvent, Timestamp};
use crate::session::{KeystrokeRecord, Outcome, PracticeSession};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Keystroke {
    pub expected: char,
    pub typed: char,
    pub outcome: Outcome,
    /// The keystroke reached the end of the expected text
    pub completed: bool,
}

/// Character to submit for this event, or None when it never counts as a
/// keystroke (repeats, modifiers, layer signals, keys without a character).
pub fn typed_character(event: &KeyEvent) -> Option<char> {
    if event.is_repeat || event.code.is_typing_ignored() {
        return None;
    }
    event.character
}

/// Match one typed character against the session's expected text.
///
/// Wrong characters do not advance the cursor: the learner retypes the same
/// position until it is right. Returns None (and changes nothing) when no
/// session is active or the text is already complete.
pub fn submit_keystroke(
    session: &mut PracticeSession,
    typed: char,
    timestamp: Timestamp,
) -> Option<Keystroke> {
    if !session.active {
        return None;
    }
    let expected = session.expected_char()?;

    if session.start_timestamp.is_none() {
        session.start_timestamp = Some(timestamp);
    }
    session.last_timestamp = Some(timestamp);

    let outcome = if typed == expected {
        Outcome::Correct
    } else {
        Outcome::Incorrect
    };

    session.history.push(KeystrokeRecord {
        expected,
        typed,
        outcome,
        timestamp,
    });
    session.total_keystrokes += 1;

    match outcome {
        Outcome::Correct => {
            session.correct_keystrokes += 1;
            session.cursor += 1;
        }
        Outcome::Incorrect => {
            session.error_count += 1;
            debug!(pos = session.cursor, %expected, %typed, "mismatch");
        }
    }

    Some(Keystroke {
        expected,
        typed,
        outcome,
        completed: session.is_complete(),
    })
}
