use crate::session::SessionResult;
use crate::storage::KeyValueStore;
use crate::text_generator::{ContentType, Difficulty};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

pub const KEY_TYPING_HISTORY: &str = "typingHistory";
pub const HISTORY_CAPACITY: usize = 10;

/// One completed typing test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    pub wpm: u32,
    pub accuracy: u32,
    #[serde(rename = "duration")]
    pub duration_secs: u32,
    pub difficulty: Difficulty,
    pub content_type: ContentType,
    pub text_length: usize,
    pub correct_chars: usize,
    pub errors: usize,
}

impl HistoryEntry {
    pub fn from_result(
        result: &SessionResult,
        difficulty: Difficulty,
        content_type: ContentType,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: result.finished_at,
            wpm: result.wpm,
            accuracy: result.accuracy.min(100),
            duration_secs: result.elapsed_secs,
            difficulty,
            content_type,
            text_length: result.text_length,
            correct_chars: result.correct_chars,
            errors: result.errors,
        }
    }

    /// Local `YYYY-MM-DD HH:MM`
    pub fn local_time_label(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string()
    }
}

/// Aggregates over the stored entries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySummary {
    pub tests: usize,
    pub best_wpm: u32,
    pub mean_wpm: f64,
    pub mean_accuracy: f64,
    pub wpm_std_dev: f64,
}

/// Most recent results first, never more than `HISTORY_CAPACITY`.
///
/// The ledger is the only writer of the `typingHistory` key; every mutation is
/// followed by a write of the whole list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
}

impl HistoryLedger {
    pub fn load<S: KeyValueStore>(store: &S) -> Self {
        let mut entries: Vec<HistoryEntry> = store.get_or(KEY_TYPING_HISTORY, Vec::new());
        entries.truncate(HISTORY_CAPACITY);
        Self { entries }
    }

    pub fn record<S: KeyValueStore>(&mut self, entry: HistoryEntry, store: &mut S) {
        tracing::debug!("recording history entry {}", entry.id);
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAPACITY);
        store.put(KEY_TYPING_HISTORY, &self.entries);
    }

    pub fn clear<S: KeyValueStore>(&mut self, store: &mut S) {
        self.entries.clear();
        store.put(KEY_TYPING_HISTORY, &self.entries);
    }

    pub fn all(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> Option<HistorySummary> {
        if self.entries.is_empty() {
            return None;
        }
        let wpms: Vec<f64> = self.entries.iter().map(|e| e.wpm as f64).collect();
        let accuracies: Vec<f64> = self.entries.iter().map(|e| e.accuracy as f64).collect();
        let mean_wpm = mean(&wpms);

        Some(HistorySummary {
            tests: self.entries.len(),
            best_wpm: self.entries.iter().map(|e| e.wpm).max().unwrap_or(0),
            mean_wpm,
            mean_accuracy: mean(&accuracies),
            wpm_std_dev: std_dev(&wpms, mean_wpm),
        })
    }
}

fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

fn std_dev(data: &[f64], mean: f64) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let variance = data.iter().map(|v| (mean - v) * (mean - v)).sum::<f64>() / data.len() as f64;
    variance.sqrt()
}
