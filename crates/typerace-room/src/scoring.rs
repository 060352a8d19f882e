//! Race results.
//!
//! Every participant is scored against the room's full duration, not the
//! time they actually spent typing. Scores are floating point; ranking
//! is a stable descending sort, so ties keep join order.

use std::cmp::Ordering;

use typerace_protocol::RaceResult;

use crate::room::Participant;

/// Words in `typed`: trimmed, then split on single spaces.
///
/// An empty (or all-whitespace) text still counts as one word, and runs
/// of spaces produce empty words that are counted too.
pub fn word_count(typed: &str) -> usize {
    typed.trim().split(' ').count()
}

/// Words per minute over a race of `duration_secs`, rounded.
/// Zero if the duration is zero.
pub fn words_per_minute(words: usize, duration_secs: u64) -> u32 {
    if duration_secs == 0 {
        return 0;
    }
    (words as f64 / duration_secs as f64 * 60.0).round() as u32
}

/// Percentage of correct characters, rounded.
///
/// Zero for an empty text. Goes negative when `errors` exceeds the
/// text length.
pub fn accuracy(typed: &str, errors: u32) -> i64 {
    let len = typed.chars().count();
    if len == 0 {
        return 0;
    }
    let len = len as f64;
    ((len - f64::from(errors)) / len * 100.0).round() as i64
}

/// `wpm × accuracy / 100`. A zero score is always `+0.0`, so a zero
/// wpm with negative accuracy ties with an idle participant.
pub fn score(wpm: u32, accuracy: i64) -> f64 {
    let score = f64::from(wpm) * (accuracy as f64 / 100.0);
    if score == 0.0 { 0.0 } else { score }
}

/// Scores one participant.
pub fn result_for(participant: &Participant, duration_secs: u64) -> RaceResult {
    let wpm = words_per_minute(word_count(&participant.typed_text), duration_secs);
    let accuracy = accuracy(&participant.typed_text, participant.error_count);
    RaceResult {
        username: participant.name.clone(),
        wpm,
        accuracy,
        error_count: participant.error_count,
        score: score(wpm, accuracy),
    }
}

/// Scores every participant and orders them best first.
pub fn rank(participants: &[Participant], duration_secs: u64) -> Vec<RaceResult> {
    let mut results: Vec<RaceResult> = participants
        .iter()
        .map(|p| result_for(p, duration_secs))
        .collect();
    // `sort_by` is stable.
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    results
}
