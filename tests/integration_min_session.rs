// Drives the compiled binary through a PTY: real event loop, crossterm input
// and the JSON store on disk.
//
// Notes:
// - Requires a TTY; uses expectrl which allocates a pseudo terminal.
// - Unix-only and ignored by default.
// - Run manually via: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn settings_flags_are_stored_and_app_exits() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = dir.path().join("store.json");
    let log = dir.path().join("keytap.log");

    let bin = assert_cmd::cargo::cargo_bin("keytap");
    let cmd = format!(
        "{} -d 15 -l hard -c quotes --store {} --log-file {}",
        bin.display(),
        store.display(),
        log.display()
    );

    let mut p = spawn(cmd)?;
    std::thread::sleep(Duration::from_millis(300));

    // Keys tab records the press, then ctrl+c quits from anywhere
    p.send("a")?;
    std::thread::sleep(Duration::from_millis(100));
    p.send("\x03")?;
    p.expect(Eof)?;

    let saved: serde_json::Value = serde_json::from_slice(&std::fs::read(&store)?)?;
    assert_eq!(saved["testDuration"], 15);
    assert_eq!(saved["difficulty"], "hard");
    assert_eq!(saved["contentType"], "quotes");
    assert_eq!(saved["keyStats"]["a"], 1);
    Ok(())
}

#[test]
#[ignore]
fn typing_tab_starts_a_countdown() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = dir.path().join("store.json");

    let bin = assert_cmd::cargo::cargo_bin("keytap");
    let cmd = format!(
        "{} --store {} --log-file {}",
        bin.display(),
        store.display(),
        dir.path().join("keytap.log").display()
    );

    let mut p = spawn(cmd)?;
    std::thread::sleep(Duration::from_millis(300));

    // Keys -> Typing, start, then escape cancels the countdown and quits from idle
    p.send("\t")?;
    p.send("\r")?;
    p.expect("Starting in")?;
    p.send("\x1b")?;
    std::thread::sleep(Duration::from_millis(100));
    p.send("\x1b")?;
    p.expect(Eof)?;

    let saved: serde_json::Value = serde_json::from_slice(&std::fs::read(&store)?)?;
    assert_eq!(saved["activeTab"], "typingTest");
    Ok(())
}
