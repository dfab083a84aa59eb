use crate::storage::KeyValueStore;
use crate::text_generator::{ContentType, Difficulty};
use serde::{Deserialize, Serialize};

pub const KEY_TEST_DURATION: &str = "testDuration";
pub const KEY_CONTENT_TYPE: &str = "contentType";
pub const KEY_DIFFICULTY: &str = "difficulty";
pub const KEY_SHOW_ERRORS: &str = "showErrors";
pub const KEY_ACTIVE_TAB: &str = "activeTab";

pub const DEFAULT_TEST_DURATION: u32 = 60;
/// Durations offered by the settings tab
pub const DURATION_CHOICES: [u32; 4] = [15, 30, 60, 120];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tab {
    #[default]
    #[serde(rename = "keyTest")]
    KeyTest,
    #[serde(rename = "typingTest")]
    TypingTest,
    #[serde(rename = "settings")]
    Settings,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::KeyTest, Tab::TypingTest, Tab::Settings];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::KeyTest => "Keys",
            Tab::TypingTest => "Typing",
            Tab::Settings => "Settings",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Tab::KeyTest => Tab::TypingTest,
            Tab::TypingTest => Tab::Settings,
            Tab::Settings => Tab::KeyTest,
        }
    }
}

/// User facing settings, passed explicitly to whoever needs them.
///
/// Every setter writes the new value through to the store right away; a failed
/// write is logged by the store and the in-memory value still changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub test_duration: u32,
    pub difficulty: Difficulty,
    pub content_type: ContentType,
    pub show_errors: bool,
    pub active_tab: Tab,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            test_duration: DEFAULT_TEST_DURATION,
            difficulty: Difficulty::default(),
            content_type: ContentType::default(),
            show_errors: true,
            active_tab: Tab::default(),
        }
    }
}

impl Settings {
    pub fn load<S: KeyValueStore>(store: &S) -> Self {
        let defaults = Self::default();
        Self {
            test_duration: store
                .get_or(KEY_TEST_DURATION, defaults.test_duration)
                .max(1),
            difficulty: store.get_or(KEY_DIFFICULTY, defaults.difficulty),
            content_type: store.get_or(KEY_CONTENT_TYPE, defaults.content_type),
            show_errors: store.get_or(KEY_SHOW_ERRORS, defaults.show_errors),
            active_tab: store.get_or(KEY_ACTIVE_TAB, defaults.active_tab),
        }
    }

    pub fn save_all<S: KeyValueStore>(&self, store: &mut S) -> bool {
        [
            store.put(KEY_TEST_DURATION, &self.test_duration),
            store.put(KEY_DIFFICULTY, &self.difficulty),
            store.put(KEY_CONTENT_TYPE, &self.content_type),
            store.put(KEY_SHOW_ERRORS, &self.show_errors),
            store.put(KEY_ACTIVE_TAB, &self.active_tab),
        ]
        .iter()
        .all(|ok| *ok)
    }

    /// Zero is clamped to one second.
    pub fn set_test_duration<S: KeyValueStore>(&mut self, seconds: u32, store: &mut S) {
        self.test_duration = seconds.max(1);
        store.put(KEY_TEST_DURATION, &self.test_duration);
    }

    pub fn set_difficulty<S: KeyValueStore>(&mut self, difficulty: Difficulty, store: &mut S) {
        self.difficulty = difficulty;
        store.put(KEY_DIFFICULTY, &self.difficulty);
    }

    pub fn set_content_type<S: KeyValueStore>(&mut self, content_type: ContentType, store: &mut S) {
        self.content_type = content_type;
        store.put(KEY_CONTENT_TYPE, &self.content_type);
    }

    pub fn set_show_errors<S: KeyValueStore>(&mut self, show: bool, store: &mut S) {
        self.show_errors = show;
        store.put(KEY_SHOW_ERRORS, &self.show_errors);
    }

    pub fn set_active_tab<S: KeyValueStore>(&mut self, tab: Tab, store: &mut S) {
        self.active_tab = tab;
        store.put(KEY_ACTIVE_TAB, &self.active_tab);
    }

    /// Next entry of `DURATION_CHOICES`, wrapping around.
    pub fn next_duration(&self) -> u32 {
        DURATION_CHOICES
            .iter()
            .copied()
            .find(|d| *d > self.test_duration)
            .unwrap_or(DURATION_CHOICES[0])
    }
}
