use crate::scoring::{accuracy_percent, words_per_minute};
use chrono::{DateTime, Utc};

/// Seconds shown by the pre-run countdown
pub const COUNTDOWN_SECS: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Countdown,
    Active,
    Finished,
}

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// A keydown as far as the session cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Escape,
    /// Any other named key; never scored.
    Other,
}

/// Display state of one passage character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharState {
    Pending,
    Current,
    Typed(Outcome),
}

/// Final numbers of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionResult {
    pub wpm: u32,
    pub accuracy: u32,
    pub correct_chars: usize,
    pub errors: usize,
    pub elapsed_secs: u32,
    pub text_length: usize,
    pub finished_at: DateTime<Utc>,
}

/// What changed, for whoever renders the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Countdown(u8),
    Started,
    Typed { outcome: Outcome, accuracy: u32 },
    Rewound { cursor: usize },
    Tick { elapsed_secs: u32, wpm: u32 },
    Finished(SessionResult),
    Reset,
}

/// The single timer slot. Leaving `Countdown`/`Active` always puts it back to
/// `Stopped`, so a late tick can never reach a superseded run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    Stopped,
    Countdown { remaining: u8 },
    Running,
}

/// One typing test run over a fixed passage
#[derive(Debug, Clone)]
pub struct Session {
    text: Vec<char>,
    cursor: usize,
    correct: usize,
    errors: usize,
    marks: Vec<Option<Outcome>>,
    phase: Phase,
    timer: Timer,
    duration_limit: u32,
    elapsed: u32,
    started_at: Option<DateTime<Utc>>,
    result: Option<SessionResult>,
}

impl Session {
    pub fn new(text: &str, duration_limit: u32) -> Self {
        let text: Vec<char> = text.chars().collect();
        Self {
            marks: vec![None; text.len()],
            text,
            cursor: 0,
            correct: 0,
            errors: 0,
            phase: Phase::Idle,
            timer: Timer::Stopped,
            duration_limit: duration_limit.max(1),
            elapsed: 0,
            started_at: None,
            result: None,
        }
    }

    /// An idle session with nothing loaded yet
    pub fn empty(duration_limit: u32) -> Self {
        Self::new("", duration_limit)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn correct_count(&self) -> usize {
        self.correct
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed
    }

    pub fn duration_limit(&self) -> u32 {
        self.duration_limit
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    pub fn countdown_remaining(&self) -> Option<u8> {
        match self.timer {
            Timer::Countdown { remaining } => Some(remaining),
            _ => None,
        }
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer != Timer::Stopped
    }

    pub fn live_wpm(&self) -> u32 {
        words_per_minute(self.cursor, self.elapsed)
    }

    pub fn live_accuracy(&self) -> u32 {
        accuracy_percent(self.correct, self.cursor)
    }

    pub fn expected_char(&self) -> Option<char> {
        self.text.get(self.cursor).copied()
    }

    /// Per character markup for the passage display
    pub fn char_states(&self) -> impl Iterator<Item = (char, CharState)> + '_ {
        self.text.iter().enumerate().map(move |(idx, c)| {
            let state = if idx == self.cursor && self.phase != Phase::Finished {
                CharState::Current
            } else if idx < self.cursor {
                self.marks[idx].map_or(CharState::Pending, CharState::Typed)
            } else {
                CharState::Pending
            };
            (*c, state)
        })
    }

    /// Begin the countdown. Ignored unless `Idle` or `Finished`, or with no passage.
    pub fn start(&mut self, duration_limit: u32) -> Vec<SessionEvent> {
        if !matches!(self.phase, Phase::Idle | Phase::Finished) || self.text.is_empty() {
            return vec![];
        }
        self.clear_progress();
        self.duration_limit = duration_limit.max(1);
        self.result = None;
        self.phase = Phase::Countdown;
        self.timer = Timer::Countdown {
            remaining: COUNTDOWN_SECS,
        };
        tracing::debug!("countdown started, limit {}s", self.duration_limit);
        vec![SessionEvent::Countdown(COUNTDOWN_SECS)]
    }

    /// Restart a finished run over the same passage.
    pub fn retry(&mut self, duration_limit: u32) -> Vec<SessionEvent> {
        if self.phase != Phase::Finished {
            return vec![];
        }
        self.start(duration_limit)
    }

    /// Swap in a new passage from any phase. Stops timers and records nothing.
    pub fn reset_with(&mut self, text: &str) -> Vec<SessionEvent> {
        self.timer = Timer::Stopped;
        self.text = text.chars().collect();
        self.clear_progress();
        self.result = None;
        self.phase = Phase::Idle;
        vec![SessionEvent::Reset]
    }

    /// One second has passed.
    pub fn on_tick(&mut self) -> Vec<SessionEvent> {
        match (self.phase, self.timer) {
            (Phase::Countdown, Timer::Countdown { remaining }) => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.begin();
                    vec![SessionEvent::Started]
                } else {
                    self.timer = Timer::Countdown { remaining };
                    vec![SessionEvent::Countdown(remaining)]
                }
            }
            (Phase::Active, Timer::Running) => {
                self.elapsed += 1;
                let mut events = vec![SessionEvent::Tick {
                    elapsed_secs: self.elapsed,
                    wpm: self.live_wpm(),
                }];
                if self.elapsed >= self.duration_limit {
                    events.push(self.finish());
                }
                events
            }
            _ => vec![],
        }
    }

    pub fn on_key(&mut self, key: Key) -> Vec<SessionEvent> {
        if self.phase != Phase::Active {
            return vec![];
        }

        match key {
            Key::Escape => vec![self.finish()],
            Key::Backspace => {
                // Counters are left as they are; only the cursor rewinds.
                if self.cursor == 0 {
                    return vec![];
                }
                self.cursor -= 1;
                self.marks[self.cursor] = None;
                vec![SessionEvent::Rewound {
                    cursor: self.cursor,
                }]
            }
            Key::Char(c) => self.write(c),
            Key::Other => vec![],
        }
    }

    fn write(&mut self, c: char) -> Vec<SessionEvent> {
        let Some(expected) = self.expected_char() else {
            return vec![];
        };

        let outcome = if c == expected {
            self.correct += 1;
            Outcome::Correct
        } else {
            self.errors += 1;
            Outcome::Incorrect
        };
        self.marks[self.cursor] = Some(outcome);
        self.cursor += 1;

        let mut events = vec![SessionEvent::Typed {
            outcome,
            accuracy: self.live_accuracy(),
        }];
        if self.cursor == self.text.len() {
            events.push(self.finish());
        }
        events
    }

    fn begin(&mut self) {
        self.clear_progress();
        self.elapsed = 0;
        self.started_at = Some(Utc::now());
        self.phase = Phase::Active;
        self.timer = Timer::Running;
        tracing::debug!("session active over {} chars", self.text.len());
    }

    fn finish(&mut self) -> SessionEvent {
        self.timer = Timer::Stopped;
        self.phase = Phase::Finished;

        let result = SessionResult {
            wpm: words_per_minute(self.cursor, self.elapsed),
            accuracy: accuracy_percent(self.correct, self.cursor),
            correct_chars: self.correct,
            errors: self.errors,
            elapsed_secs: self.elapsed,
            text_length: self.text.len(),
            finished_at: Utc::now(),
        };
        self.result = Some(result);
        tracing::info!(
            "session finished: {} wpm, {}% accuracy, {}s",
            result.wpm,
            result.accuracy,
            result.elapsed_secs
        );
        SessionEvent::Finished(result)
    }

    fn clear_progress(&mut self) {
        self.cursor = 0;
        self.correct = 0;
        self.errors = 0;
        self.elapsed = 0;
        self.marks = vec![None; self.text.len()];
    }
}
