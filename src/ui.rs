use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::App;
use keytap::{
    config::Tab,
    history::HistoryLedger,
    key_stats::KeyStats,
    scoring::{format_time, format_time_mmss},
    session::{CharState, Outcome, Phase, Session},
    storage::KeyValueStore,
};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const EMPTY_HISTORY: &str = "Your typing test history will appear here";

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn capitalized(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl<S: KeyValueStore> Widget for &App<S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);

        Tabs::new(Tab::ALL.iter().map(|t| t.title()))
            .select(Tab::ALL.iter().position(|t| *t == self.tab).unwrap_or(0))
            .style(Style::default().add_modifier(Modifier::DIM))
            .highlight_style(bold().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED))
            .divider("|")
            .render(chunks[0], buf);

        let legend = match self.tab {
            Tab::KeyTest => "(tab) next tab / (ctrl+l) clear display / (ctrl+c) quit",
            Tab::TypingTest => match self.test.session().phase() {
                Phase::Active => "(backspace) fix / (esc) finish now",
                Phase::Countdown => "(esc) cancel",
                Phase::Idle | Phase::Finished => {
                    "(enter) start / (r)etry / (n)ew / (d)ifficulty / (c)ontent / (tab) next tab / (esc)ape"
                }
            },
            Tab::Settings => "(tab) next tab / (esc)ape",
        };

        match self.tab {
            Tab::KeyTest => render_key_test(self.test.key_stats(), chunks[2], buf),
            Tab::TypingTest => render_typing(self, chunks[2], buf),
            Tab::Settings => render_settings(self, chunks[2], buf),
        }

        Paragraph::new(Span::styled(legend, italic()))
            .wrap(Wrap { trim: true })
            .render(chunks[3], buf);
    }
}

fn render_key_test(stats: &KeyStats, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(0),
        ])
        .split(area);

    let echo: Vec<Span> = stats
        .echo()
        .map(|key| Span::styled(format!(" {key} "), bold().fg(Color::Black).bg(Color::Cyan)))
        .flat_map(|span| [span, Span::raw(" ")])
        .collect();
    let echo = if echo.is_empty() {
        Line::from(Span::styled("Press any key", dim_bold()))
    } else {
        Line::from(echo)
    };
    Paragraph::new(echo)
        .block(Block::default().borders(Borders::ALL).title("Keys"))
        .render(chunks[0], buf);

    let counters = vec![
        Line::from(format!("Total presses: {}", stats.total())),
        Line::from(format!("This session: {}", stats.pressed_this_session())),
        Line::from(format!("Unique keys: {}", stats.unique())),
        Line::from(format!("Most used: {}", stats.most_used_label())),
        Line::from(format!(
            "Session time: {}",
            format_time_mmss(stats.session_secs())
        )),
    ];
    Paragraph::new(counters).render(chunks[1], buf);

    let top: Vec<Line> = stats
        .top(5)
        .into_iter()
        .map(|(key, count)| {
            Line::from(vec![
                Span::styled(
                    format!("{:>10} ", keytap::key_stats::display_name(key)),
                    bold(),
                ),
                Span::raw(count.to_string()),
            ])
        })
        .collect();
    Paragraph::new(top)
        .block(Block::default().borders(Borders::TOP).title("Top keys"))
        .render(chunks[2], buf);
}

fn render_typing<S: KeyValueStore>(app: &App<S>, area: Rect, buf: &mut Buffer) {
    let test = &app.test;
    let session = test.session();
    let history_height = (test.history().len().max(1) + 3) as u16;
    let result_height = if session.phase() == Phase::Finished { 2 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(result_height),
            Constraint::Length(history_height),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(status_line(session, test.settings().test_duration))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    // a passage that fits on one line is centered
    let text = session.text();
    let one_line = !text.contains('\n') && text.width() <= chunks[1].width as usize;
    Paragraph::new(passage_lines(session, test.settings().show_errors))
        .block(Block::default().borders(Borders::TOP | Borders::BOTTOM))
        .alignment(if one_line {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: false })
        .render(chunks[1], buf);

    if let Some(result) = session.result() {
        let lines = vec![
            Line::from(Span::styled(
                format!("{} wpm   {}% acc", result.wpm, result.accuracy),
                bold().fg(Color::Magenta),
            )),
            Line::from(Span::styled(
                format!(
                    "{} correct   {} errors   {}",
                    result.correct_chars,
                    result.errors,
                    format_time(result.elapsed_secs as u64)
                ),
                dim_bold(),
            )),
        ];
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
    }

    render_history(test.history(), chunks[3], buf);

    Paragraph::new(Span::styled(format!("Tip: {}", test.tip()), italic().fg(Color::Gray)))
        .render(chunks[4], buf);
}

fn status_line(session: &Session, next_duration: u32) -> Line<'static> {
    match session.phase() {
        Phase::Idle => Line::from(Span::styled(
            format!("{} test, press enter to start", format_time(next_duration as u64)),
            dim_bold(),
        )),
        Phase::Countdown => Line::from(Span::styled(
            format!(
                "Starting in {}",
                session.countdown_remaining().unwrap_or_default()
            ),
            bold().fg(Color::Yellow),
        )),
        Phase::Active => {
            let elapsed = session.elapsed_secs();
            let left = session.duration_limit().saturating_sub(elapsed);
            Line::from(vec![
                Span::styled(format_time(elapsed as u64), bold()),
                Span::styled(format!(" ({} left)", format_time(left as u64)), dim_bold()),
                Span::raw("   "),
                Span::styled(format!("{} wpm", session.live_wpm()), bold().fg(Color::Magenta)),
                Span::raw("   "),
                Span::styled(format!("{}% acc", session.live_accuracy()), bold()),
            ])
        }
        Phase::Finished => Line::from(Span::styled("Finished", bold().fg(Color::Green))),
    }
}

/// Passage markup, one `Line` per line of the passage.
fn passage_lines(session: &Session, show_errors: bool) -> Vec<Line<'static>> {
    let correct = if show_errors {
        bold().fg(Color::Green)
    } else {
        bold()
    };
    let incorrect = if show_errors {
        bold().fg(Color::Red)
    } else {
        bold()
    };

    let mut lines = vec![];
    let mut spans = vec![];
    for (c, state) in session.char_states() {
        let style = match state {
            CharState::Pending => dim_bold(),
            CharState::Current => dim_bold().add_modifier(Modifier::UNDERLINED),
            CharState::Typed(Outcome::Correct) => correct,
            CharState::Typed(Outcome::Incorrect) => incorrect,
        };
        let symbol = match (c, state) {
            ('\n', _) => "⏎".to_string(),
            (' ', CharState::Typed(Outcome::Incorrect)) if show_errors => "·".to_string(),
            (c, _) => c.to_string(),
        };
        spans.push(Span::styled(symbol, style));
        if c == '\n' {
            lines.push(Line::from(std::mem::take(&mut spans)));
        }
    }
    lines.push(Line::from(spans));
    lines
}

fn render_history(history: &HistoryLedger, area: Rect, buf: &mut Buffer) {
    let mut lines: Vec<Line> = history
        .all()
        .iter()
        .map(|entry| {
            Line::from(vec![
                Span::styled(format!("{}  ", entry.local_time_label()), dim_bold()),
                Span::raw(format!(
                    "{} • {} • {}",
                    capitalized(&entry.difficulty.to_string()),
                    capitalized(&entry.content_type.to_string()),
                    format_time(entry.duration_secs as u64)
                )),
                Span::styled(
                    format!("   {} wpm  {}%", entry.wpm, entry.accuracy),
                    bold(),
                ),
            ])
        })
        .collect();

    match history.summary() {
        Some(summary) => lines.push(Line::from(Span::styled(
            format!(
                "best {} wpm   avg {:.1} wpm   avg {:.1}% acc   {:.2} sd",
                summary.best_wpm, summary.mean_wpm, summary.mean_accuracy, summary.wpm_std_dev
            ),
            italic().fg(Color::Cyan),
        ))),
        None => lines.push(Line::from(Span::styled(EMPTY_HISTORY, dim_bold()))),
    }

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("History"))
        .render(area, buf);
}

fn render_settings<S: KeyValueStore>(app: &App<S>, area: Rect, buf: &mut Buffer) {
    let settings = app.test.settings();
    let row = |key: &str, label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("({key}) "), dim_bold()),
            Span::raw(format!("{label:<14}")),
            Span::styled(value, bold()),
        ])
    };

    let mut lines = vec![
        row("t", "Duration", format_time(settings.test_duration as u64)),
        row(
            "d",
            "Difficulty",
            capitalized(&settings.difficulty.to_string()),
        ),
        row(
            "c",
            "Content",
            capitalized(&settings.content_type.to_string()),
        ),
        row(
            "e",
            "Show errors",
            if settings.show_errors { "on" } else { "off" }.to_string(),
        ),
        Line::default(),
        row("h", "Clear history", format!("{} stored", app.test.history().len())),
        row("X", "Reset all data", String::new()),
    ];
    if app.test.is_running() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Passage changes apply once the current test ends",
            italic().fg(Color::Yellow),
        )));
    }

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Settings"))
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cli;
    use keytap::{
        session::{Key, COUNTDOWN_SECS},
        storage::MemoryStore,
        text_generator::TextGenerator,
        typing_test::{Control, TypingTest},
    };

    fn create_test_app(tab: Tab) -> App<MemoryStore> {
        let test = TypingTest::with_generator(MemoryStore::new(), TextGenerator::seeded(5).unwrap());
        let mut app = App::new(test, &Cli::default());
        app.select_tab(tab);
        app
    }

    fn rendered(app: &App<MemoryStore>, area: Rect) -> String {
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    fn run_to_finish(app: &mut App<MemoryStore>) {
        app.test.on_control(Control::Start);
        for _ in 0..COUNTDOWN_SECS {
            app.on_tick();
        }
        app.on_tick();
        for c in app.test.session().text().chars() {
            app.test.on_key(Key::Char(c));
        }
    }

    #[test]
    fn test_capitalized() {
        assert_eq!(capitalized("medium"), "Medium");
        assert_eq!(capitalized(""), "");
    }

    #[test]
    fn test_tab_bar_names_every_tab() {
        let app = create_test_app(Tab::KeyTest);
        let out = rendered(&app, Rect::new(0, 0, 80, 24));
        assert!(out.contains("Keys"));
        assert!(out.contains("Typing"));
        assert!(out.contains("Settings"));
    }

    #[test]
    fn test_key_test_view() {
        let mut app = create_test_app(Tab::KeyTest);
        app.test.record_key(" ");
        app.test.record_key(" ");
        app.test.record_key("a");

        let out = rendered(&app, Rect::new(0, 0, 80, 24));
        assert!(out.contains("Most used: Space (2)"));
        assert!(out.contains("Unique keys: 2"));
        assert!(out.contains("Session time: 00:00"));
    }

    #[test]
    fn test_typing_view_idle_with_empty_history() {
        let app = create_test_app(Tab::TypingTest);
        let out = rendered(&app, Rect::new(0, 0, 100, 30));
        assert!(out.contains(EMPTY_HISTORY));
        assert!(out.contains("press enter to start"));
        assert!(out.contains("Tip: "));
    }

    #[test]
    fn test_typing_view_countdown() {
        let mut app = create_test_app(Tab::TypingTest);
        app.test.on_control(Control::Start);
        let out = rendered(&app, Rect::new(0, 0, 100, 30));
        assert!(out.contains("Starting in 3"));
    }

    #[test]
    fn test_typing_view_active_shows_elapsed() {
        let mut app = create_test_app(Tab::TypingTest);
        app.test.on_control(Control::Start);
        for _ in 0..COUNTDOWN_SECS {
            app.on_tick();
        }
        for _ in 0..12 {
            app.on_tick();
        }

        let line: String = status_line(app.test.session(), 60)
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect();
        assert!(line.starts_with("12s (48s left)"), "{line}");
    }

    #[test]
    fn test_typing_view_finished_shows_result_and_history() {
        let mut app = create_test_app(Tab::TypingTest);
        run_to_finish(&mut app);
        let result = *app.test.session().result().unwrap();

        let out = rendered(&app, Rect::new(0, 0, 120, 30));
        assert!(out.contains(&format!("{} wpm   100% acc", result.wpm)));
        assert!(out.contains("Medium • Random • 1s"));
        assert!(out.contains("best "));
        assert!(!out.contains(EMPTY_HISTORY));
    }

    #[test]
    fn test_passage_lines_split_on_newlines() {
        let session = Session::new("ab\ncd", 60);
        let lines = passage_lines(&session, true);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans.len(), 3);
        assert_eq!(lines[0].spans[2].content, "⏎");
    }

    #[test]
    fn test_passage_errors_hidden() {
        let mut session = Session::new("ab", 60);
        session.start(60);
        for _ in 0..COUNTDOWN_SECS {
            session.on_tick();
        }
        session.on_key(Key::Char('x'));

        let shown = passage_lines(&session, true);
        assert_eq!(shown[0].spans[0].style.fg, Some(Color::Red));
        let hidden = passage_lines(&session, false);
        assert_eq!(hidden[0].spans[0].style.fg, None);
    }

    #[test]
    fn test_settings_view() {
        let app = create_test_app(Tab::Settings);
        let out = rendered(&app, Rect::new(0, 0, 80, 24));
        assert!(out.contains("1:00"));
        assert!(out.contains("Medium"));
        assert!(out.contains("Random"));
        assert!(out.contains("on"));
    }

    #[test]
    fn test_render_extreme_sizes() {
        let mut app = create_test_app(Tab::TypingTest);
        run_to_finish(&mut app);
        for area in [
            Rect::new(0, 0, 10, 5),
            Rect::new(0, 0, 200, 5),
            Rect::new(0, 0, 20, 50),
            Rect::new(0, 0, 1000, 1000),
        ] {
            let mut buffer = Buffer::empty(area);
            (&app).render(area, &mut buffer);
            assert!(*buffer.area() == area);
        }
    }
}
