use std::sync::mpsc::{self, Sender};
use std::time::Duration;

use assert_matches::assert_matches;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use keytap::history::{HistoryLedger, HISTORY_CAPACITY};
use keytap::runtime::{session_key, AppEvent, FixedTicker, Runner, TestEventSource};
use keytap::session::{Phase, SessionEvent};
use keytap::storage::{JsonFileStore, KeyValueStore, MemoryStore};
use keytap::text_generator::TextGenerator;
use keytap::typing_test::{Control, TypingTest};

type TestRunner = Runner<TestEventSource, FixedTicker>;

// Headless harness: the library driven through Runner/TestEventSource without a TTY.
fn harness(tick_ms: u64) -> (Sender<AppEvent>, TestRunner) {
    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(tick_ms)),
    );
    (tx, runner)
}

fn app<S: KeyValueStore>(store: S, seed: u64) -> TypingTest<S> {
    TypingTest::with_generator(store, TextGenerator::seeded(seed).unwrap())
}

/// Feed events into the dispatcher until `done` holds, collecting session events.
fn drive<S: KeyValueStore>(
    test: &mut TypingTest<S>,
    runner: &TestRunner,
    done: impl Fn(&TypingTest<S>) -> bool,
) -> Vec<SessionEvent> {
    let mut events = vec![];
    for _ in 0..10_000u32 {
        if done(test) {
            return events;
        }
        match runner.step() {
            AppEvent::Tick => events.extend(test.on_tick()),
            AppEvent::Resize => {}
            AppEvent::Key(key) => events.extend(test.on_key(session_key(&key))),
        }
    }
    panic!("condition not reached, phase {:?}", test.session().phase());
}

fn send_chars(tx: &Sender<AppEvent>, text: &str) {
    for c in text.chars() {
        let code = if c == '\n' {
            KeyCode::Enter
        } else {
            KeyCode::Char(c)
        };
        tx.send(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
            .unwrap();
    }
}

fn start_and_wait_active<S: KeyValueStore>(test: &mut TypingTest<S>, runner: &TestRunner) {
    test.on_control(Control::Start);
    runner.resync();
    let events = drive(test, runner, |t| t.session().phase() == Phase::Active);
    assert_eq!(
        events,
        vec![
            SessionEvent::Countdown(2),
            SessionEvent::Countdown(1),
            SessionEvent::Started
        ]
    );
}

#[test]
fn headless_perfect_run_is_recorded() {
    let (tx, runner) = harness(5);
    let mut test = app(MemoryStore::new(), 1);
    start_and_wait_active(&mut test, &runner);

    let text = test.session().text();
    send_chars(&tx, &text);
    let events = drive(&mut test, &runner, |t| t.session().phase() == Phase::Finished);

    assert_matches!(events.last(), Some(SessionEvent::Finished(r)) if r.accuracy == 100);
    assert_eq!(test.session().correct_count(), text.chars().count());
    assert_eq!(test.session().error_count(), 0);
    assert_eq!(test.history().len(), 1);
    assert_eq!(test.history().all()[0].accuracy, 100);
}

#[test]
fn headless_time_limit_ends_the_run() {
    let (_tx, runner) = harness(1);
    let store = MemoryStore::new().with_entry("testDuration", &2);
    let mut test = app(store, 2);
    start_and_wait_active(&mut test, &runner);

    let events = drive(&mut test, &runner, |t| t.session().phase() == Phase::Finished);
    assert_matches!(
        events.as_slice(),
        [
            SessionEvent::Tick { elapsed_secs: 1, .. },
            SessionEvent::Tick { elapsed_secs: 2, .. },
            SessionEvent::Finished(r),
        ] if r.elapsed_secs == 2 && r.wpm == 0 && r.accuracy == 100
    );
    assert_eq!(test.history().all()[0].duration_secs, 2);
}

#[test]
fn headless_mistakes_lower_accuracy() {
    let (tx, runner) = harness(5);
    let mut test = app(MemoryStore::new(), 3);
    start_and_wait_active(&mut test, &runner);

    // Replace the first four characters with a digit that never appears in passages
    let text = test.session().text();
    let typed: String = text
        .chars()
        .enumerate()
        .map(|(i, c)| if i < 4 { '7' } else { c })
        .collect();
    send_chars(&tx, &typed);
    drive(&mut test, &runner, |t| t.session().phase() == Phase::Finished);

    let session = test.session();
    assert_eq!(session.error_count(), 4);
    assert_eq!(session.correct_count() + session.error_count(), session.cursor());
    let result = session.result().unwrap();
    let expected = ((session.len() - 4) as f64 / session.len() as f64 * 100.0).round() as u32;
    assert_eq!(result.accuracy, expected);
    assert!(result.accuracy < 100);
}

#[test]
fn headless_new_text_mid_run_records_nothing() {
    let (tx, runner) = harness(5);
    let mut test = app(MemoryStore::new(), 4);
    start_and_wait_active(&mut test, &runner);

    let text = test.session().text();
    send_chars(&tx, &text[..3]);
    drive(&mut test, &runner, |t| t.session().cursor() == 3);

    assert_eq!(test.on_control(Control::NewText), vec![SessionEvent::Reset]);
    assert_eq!(test.session().phase(), Phase::Idle);
    assert_eq!(test.session().cursor(), 0);
    assert_eq!(test.session().correct_count(), 0);
    assert!(test.history().is_empty());

    // Stray ticks after the reset do nothing
    for _ in 0..3 {
        if let AppEvent::Tick = runner.step() {
            assert!(test.on_tick().is_empty());
        }
    }
}

#[test]
fn headless_history_persists_and_is_capped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let (tx, runner) = harness(5);

    {
        let mut test = app(JsonFileStore::open(&path), 5);
        for _ in 0..HISTORY_CAPACITY + 2 {
            start_and_wait_active(&mut test, &runner);
            send_chars(&tx, &test.session().text());
            drive(&mut test, &runner, |t| t.session().phase() == Phase::Finished);
        }
        assert_eq!(test.history().len(), HISTORY_CAPACITY);
    }

    let reopened = JsonFileStore::open(&path);
    let history = HistoryLedger::load(&reopened);
    assert_eq!(history.len(), HISTORY_CAPACITY);
    assert!(history
        .all()
        .windows(2)
        .all(|pair| pair[0].timestamp >= pair[1].timestamp));

    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    let first = &raw["typingHistory"][0];
    for key in ["id", "date", "wpm", "accuracy", "duration", "difficulty", "contentType"] {
        assert!(first.get(key).is_some(), "missing {key}");
    }
    assert_eq!(first["difficulty"], "medium");
}
