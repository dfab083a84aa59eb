use crate::storage::KeyValueStore;
use itertools::Itertools;
use std::collections::{BTreeMap, VecDeque};
use std::time::Instant;

pub const KEY_KEY_STATS: &str = "keyStats";
/// Keys kept in the on-screen echo strip
pub const ECHO_CAPACITY: usize = 32;

/// Human label for a key name as delivered by the input layer.
pub fn display_name(key: &str) -> &str {
    match key {
        " " => "Space",
        "Control" => "Ctrl",
        "Meta" => "Win",
        other => other,
    }
}

/// Press counts per key plus a short echo of the latest presses.
///
/// Counts persist under `keyStats`; the echo strip and session clock do not.
#[derive(Debug, Clone)]
pub struct KeyStats {
    counts: BTreeMap<String, u64>,
    echo: VecDeque<String>,
    pressed_this_session: usize,
    session_started: Instant,
}

impl KeyStats {
    pub fn load<S: KeyValueStore>(store: &S) -> Self {
        Self {
            counts: store.get_or(KEY_KEY_STATS, BTreeMap::new()),
            echo: VecDeque::with_capacity(ECHO_CAPACITY),
            pressed_this_session: 0,
            session_started: Instant::now(),
        }
    }

    pub fn record<S: KeyValueStore>(&mut self, key: &str, store: &mut S) {
        *self.counts.entry(key.to_string()).or_insert(0) += 1;

        if self.echo.len() == ECHO_CAPACITY {
            self.echo.pop_front();
        }
        self.echo.push_back(key.to_string());
        self.pressed_this_session += 1;

        store.put(KEY_KEY_STATS, &self.counts);
    }

    /// Empties the echo strip; counts are kept.
    pub fn clear_display(&mut self) {
        self.echo.clear();
        self.pressed_this_session = 0;
    }

    /// Forget everything and restart the session clock.
    pub fn reset<S: KeyValueStore>(&mut self, store: &mut S) {
        self.counts.clear();
        self.clear_display();
        self.session_started = Instant::now();
        store.put(KEY_KEY_STATS, &self.counts);
    }

    pub fn echo(&self) -> impl Iterator<Item = &str> {
        self.echo.iter().map(|k| display_name(k))
    }

    pub fn pressed_this_session(&self) -> usize {
        self.pressed_this_session
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn unique(&self) -> usize {
        self.counts.len()
    }

    pub fn count(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// The first key (in key order) with the highest count.
    pub fn most_used(&self) -> Option<(&str, u64)> {
        self.counts
            .iter()
            .fold(None, |best: Option<(&str, u64)>, (key, count)| match best {
                Some((_, c)) if c >= *count => best,
                _ => Some((key.as_str(), *count)),
            })
    }

    /// `Space (12)` or `None`
    pub fn most_used_label(&self) -> String {
        match self.most_used() {
            Some((key, count)) => format!("{} ({})", display_name(key), count),
            None => "None".to_string(),
        }
    }

    /// Highest counts first, ties in key order.
    pub fn top(&self, n: usize) -> Vec<(&str, u64)> {
        self.counts
            .iter()
            .map(|(k, c)| (k.as_str(), *c))
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
            .take(n)
            .collect()
    }

    pub fn session_secs(&self) -> u64 {
        self.session_started.elapsed().as_secs()
    }
}
