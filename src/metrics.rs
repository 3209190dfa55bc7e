use crate::keys::Timestamp;

/// Standard word length used for words-per-minute
pub const CHARS_PER_WORD: f64 = 5.0;

const MS_PER_MINUTE: f64 = 60_000.0;

/// Live figures while a session is running
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub wpm: u32,
    pub accuracy: u32,
    pub error_count: u32,
    pub cursor: usize,
}

/// Final figures of a completed session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionResult {
    pub wpm: u32,
    pub accuracy: u32,
    pub duration_seconds: u64,
}

/// Zero when the session has not started yet
pub fn elapsed_minutes(start: Option<Timestamp>, now: Timestamp) -> f64 {
    match start {
        Some(start) => now.saturating_sub(start) as f64 / MS_PER_MINUTE,
        None => 0.0,
    }
}

pub fn words_per_minute(correct_keystrokes: u32, elapsed_minutes: f64) -> u32 {
    if elapsed_minutes > 0.0 {
        let words = correct_keystrokes as f64 / CHARS_PER_WORD;
        (words / elapsed_minutes).round() as u32
    } else {
        0
    }
}

/// Percentage of keystrokes that were correct; a session with no keystrokes
/// is perfectly accurate.
pub fn accuracy(correct_keystrokes: u32, total_keystrokes: u32) -> u32 {
    if total_keystrokes > 0 {
        (100.0 * correct_keystrokes as f64 / total_keystrokes as f64).round() as u32
    } else {
        100
    }
}

pub fn mean(data: &[f64]) -> Option<f64> {
    match data.len() {
        0 => None,
        count => Some(data.iter().sum::<f64>() / count as f64),
    }
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;
    Some(variance.sqrt())
}
