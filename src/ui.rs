pub mod charting;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Widget},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::options::{Mode, PRESETS};
use crate::session::Session;
use crate::textwrap::{default_start_line, line_visual_width, MAX_VISIBLE_LINES};

const KEYBOARD_ROWS: [&str; 3] = ["qwertyuiop[]", "asdfghjkl;'", "zxcvbnm,./"];
const VERTICAL_MARGIN: u16 = 1;

/// Refresh the wrap cache, then draw the app into the whole frame
pub fn draw(f: &mut Frame, app: &mut App) {
    app.session.lines();
    f.render_widget(&*app, f.area());
}

struct Styles {
    bold: Style,
    correct: Style,
    incorrect: Style,
    cursor: Style,
    pending: Style,
    dim: Style,
    active: Style,
    italic: Style,
}

impl Default for Styles {
    fn default() -> Self {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let dim = Style::default().add_modifier(Modifier::DIM);
        Self {
            bold,
            correct: bold.fg(Color::Green),
            incorrect: bold.fg(Color::Red),
            cursor: bold.add_modifier(Modifier::UNDERLINED | Modifier::REVERSED),
            pending: dim.patch(bold),
            dim,
            active: bold.fg(Color::Yellow),
            italic: Style::default().add_modifier(Modifier::ITALIC),
        }
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = &self.session;
        let styles = Styles::default();
        let finished = session.timer().finished;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // option bar
                Constraint::Length(1),
                Constraint::Length(1), // live stats
                Constraint::Length(1),
                Constraint::Length(MAX_VISIBLE_LINES as u16),
                Constraint::Length(1),
                Constraint::Min(4), // keyboard, or results and chart
                Constraint::Length(1), // footer
            ])
            .split(area);

        centered(option_bar(session, &styles), chunks[0], buf);
        centered(stats_line(session, &styles), chunks[2], buf);
        render_text(session, &styles, chunks[4], buf);

        if finished && session.results().visible {
            render_results(session, &styles, chunks[6], buf);
        } else {
            render_keyboard(session, &styles, chunks[6], buf);
        }

        let footer = match session.message() {
            Some(message) => Line::from(Span::styled(message.to_string(), styles.active)),
            None if finished => Line::from(Span::styled(
                "(r)estart / (↑↓ pgup pgdn home end) review / (esc)ape",
                styles.italic,
            )),
            None => Line::from(Span::styled(
                "(tab) restart / ctrl+(p)unct (n)umbers (t)mode (d)uration / (esc)ape",
                styles.italic,
            )),
        };
        centered(footer, chunks[7], buf);
    }
}

/// Write `line` horizontally centered on the first row of `area`
fn centered(line: Line, area: Rect, buf: &mut Buffer) {
    let text = line
        .spans
        .iter()
        .map(|s| s.content.as_ref())
        .collect::<String>();
    let width = text.trim_end().width();
    centered_by(line, width, area, buf);
}

/// Like [`centered`], with the width to center on supplied by the caller
fn centered_by(line: Line, width: usize, area: Rect, buf: &mut Buffer) {
    if area.height == 0 {
        return;
    }
    let width = u16::try_from(width).unwrap_or(u16::MAX).min(area.width);
    let x = area.x + (area.width - width) / 2;
    buf.set_line(x, area.y, &line, area.width - (x - area.x));
}

/// One-row slice of `area`, `offset` rows down
fn row_of(area: Rect, offset: u16) -> Rect {
    Rect {
        y: area.y + offset,
        height: 1,
        ..area
    }
}

fn option_bar(session: &Session, styles: &Styles) -> Line<'static> {
    let options = session.options();
    let pick = |on: bool| if on { styles.active } else { styles.dim };
    let selected = options.preset_index();

    let mut spans = vec![
        Span::styled("time", pick(options.mode == Mode::Time)),
        Span::raw(" "),
        Span::styled("words", pick(options.mode == Mode::Words)),
        Span::raw("  |  "),
    ];
    let presets = PRESETS
        .iter()
        .enumerate()
        .map(|(idx, preset)| Span::styled(preset.label(options.mode), pick(selected == Some(idx))));
    spans.extend(Itertools::intersperse(presets, Span::raw(" ")));
    spans.extend([
        Span::raw("  |  "),
        Span::styled("punctuation", pick(options.punctuation)),
        Span::raw(" "),
        Span::styled("numbers", pick(options.numbers)),
    ]);
    Line::from(spans)
}

fn stats_line(session: &Session, styles: &Styles) -> Line<'static> {
    let stats = session.stats();
    let progress = match session.options().mode {
        Mode::Time => {
            let secs = session.timer().remaining.as_secs();
            format!("{}:{:02}", secs / 60, secs % 60)
        }
        Mode::Words => format!("{} left", session.words_left()),
    };
    let text = [
        format!("{} wpm", stats.wpm),
        format!("{}% acc", stats.accuracy),
        format!("{}/{} chars", stats.correct, stats.incorrect),
        format!("streak {}", stats.streak),
        progress,
    ]
    .iter()
    .join("   ");
    Line::from(Span::styled(text, styles.bold))
}

fn render_text(session: &Session, styles: &Styles, area: Rect, buf: &mut Buffer) {
    let lines = session.cached_lines();
    let text = session.text();
    let cursor = text.typed.len();
    let finished = session.timer().finished;
    let start = if finished {
        session.review_start()
    } else {
        default_start_line(lines, cursor)
    };

    let rows = lines.iter().skip(start).take(MAX_VISIBLE_LINES);
    for (row, line) in rows.enumerate() {
        let spans = (line.start..line.end.min(text.target.len()))
            .map(|idx| {
                let expected = text.target[idx];
                match text.typed.get(idx) {
                    Some(&typed) if typed == expected => {
                        Span::styled(expected.to_string(), styles.correct)
                    }
                    Some(&typed) => Span::styled(
                        match typed {
                            ' ' => "·".to_owned(),
                            c => c.to_string(),
                        },
                        styles.incorrect,
                    ),
                    None if idx == cursor && !finished => {
                        Span::styled(expected.to_string(), styles.cursor)
                    }
                    None => Span::styled(expected.to_string(), styles.pending),
                }
            })
            .collect::<Vec<_>>();
        if row as u16 >= area.height {
            break;
        }
        let width = line_visual_width(&text.target, *line);
        centered_by(Line::from(spans), width, row_of(area, row as u16), buf);
    }
}

fn render_keyboard(session: &Session, styles: &Styles, area: Rect, buf: &mut Buffer) {
    let last_key = session.last_key();
    let mistakes = session.mistakes();
    let key_style = |c: char| {
        if last_key == Some(c) {
            styles.active.add_modifier(Modifier::REVERSED)
        } else if mistakes.get(&c).is_some_and(|n| *n > 0) {
            styles.incorrect
        } else {
            styles.dim
        }
    };

    for (row, keys) in KEYBOARD_ROWS.iter().enumerate() {
        if row as u16 >= area.height {
            return;
        }
        let spans = keys.chars().map(|c| Span::styled(c.to_string(), key_style(c)));
        let line = Line::from(Itertools::intersperse(spans, Span::raw(" ")).collect::<Vec<_>>());
        centered(line, row_of(area, row as u16), buf);
    }

    let row = KEYBOARD_ROWS.len() as u16;
    if row < area.height {
        let space = Line::from(Span::styled("─".repeat(17), key_style(' ')));
        centered(space, row_of(area, row), buf);
    }
}

fn render_results(session: &Session, styles: &Styles, area: Rect, buf: &mut Buffer) {
    let results = session.results();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1), // padding
            Constraint::Min(1),
        ])
        .split(area);

    let summary = format!(
        "final  net: {}  raw: {}  acc: {}%  cons: {}",
        results.net_wpm, results.raw_wpm, results.accuracy, results.consistency
    );
    centered(Line::from(Span::styled(summary, styles.bold)), chunks[0], buf);

    let indicator = if results.improved {
        "^"
    } else if results.worse {
        "v"
    } else {
        "="
    };
    let mut best = vec![Span::styled(
        format!(
            "best   wpm: {}  acc: {}%  {indicator}",
            results.best_wpm, results.best_accuracy
        ),
        styles.bold,
    )];
    if results.improved {
        best.push(Span::styled("  NEW BEST!", styles.active));
    }
    centered(Line::from(best), chunks[1], buf);

    let samples = session.sampler().samples();
    let fallback = session.options().duration.as_secs() as f64;
    let (overall_duration, highest_wpm) = charting::compute_chart_params(samples, fallback);
    let coords = samples
        .iter()
        .map(|p| <(f64, f64)>::from(*p))
        .collect::<Vec<_>>();
    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&coords)];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([0.0, overall_duration])
                .labels(vec![
                    Span::styled("0", styles.bold),
                    Span::styled(charting::format_label(overall_duration), styles.bold),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", styles.bold),
                    Span::styled(charting::format_label(highest_wpm), styles.bold),
                ]),
        );
    chart.render(chunks[3], buf);
}
