//! Words-per-minute and accuracy scoring.
//!
//! Five characters count as one canonical word. Both functions round to the
//! nearest integer, halves away from zero.

/// Characters per canonical word
pub const CHARS_PER_WORD: f64 = 5.0;

pub fn words_per_minute(characters_typed: usize, elapsed_secs: u32) -> u32 {
    if elapsed_secs == 0 {
        return 0;
    }
    let words = characters_typed as f64 / CHARS_PER_WORD;
    let minutes = elapsed_secs as f64 / 60.0;
    (words / minutes).round() as u32
}

/// Percentage of attempted characters that were correct, in `0..=100`.
///
/// Backspace rewinds the attempt count without touching the correct count, so
/// `correct_chars` may exceed `total_attempted`; the result is capped at 100.
pub fn accuracy_percent(correct_chars: usize, total_attempted: usize) -> u32 {
    if total_attempted == 0 {
        return 100;
    }
    let pct = (correct_chars as f64 / total_attempted as f64 * 100.0).round() as u32;
    pct.min(100)
}

/// `45s` below a minute, `m:ss` from there on.
pub fn format_time(seconds: u64) -> String {
    if seconds < 60 {
        format!("{seconds}s")
    } else {
        format!("{}:{:02}", seconds / 60, seconds % 60)
    }
}

/// Zero padded `mm:ss`.
pub fn format_time_mmss(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
