use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use lokitype::{
    classifier::CharClass, stats::TimeSeriesPoint, token_source::SourceDiagnostic, SessionEngine,
    SessionState, VocabularyKind,
};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Tokens shown at once; the view pages forward as the cursor moves.
const PAGE_SIZE: usize = 30;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.engine.state() {
            SessionState::Idle | SessionState::Active => render_typing(&self.engine, area, buf),
            SessionState::Finished => render_results(&self.engine, area, buf),
        }
    }
}

fn render_typing(engine: &SessionEngine, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_bold_style = bold_style.add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let (start, end) = page_bounds(engine.cursor(), engine.tokens().len());
    let spans = prompt_spans(engine, start, end);

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_width: usize = spans.iter().map(|s| s.content.width()).sum();
    let prompt_lines = ((prompt_width as f64 / max_chars_per_line as f64).ceil() as u16).max(1) + 1;
    let padding = area.height.saturating_sub(prompt_lines + 4) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(padding),
            Constraint::Length(2), // timer / live stats
            Constraint::Length(prompt_lines),
            Constraint::Length(1), // hint
            Constraint::Min(0),
        ])
        .split(area);

    let mut status = format!(
        "{} wpm   {}% acc",
        engine.live_wpm(),
        engine.live_accuracy()
    );
    if let Some(secs) = engine.remaining_seconds() {
        status = format!("{secs}s   {status}");
    }
    Paragraph::new(Span::styled(status, dim_bold_style))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Line::from(spans))
        .alignment(if prompt_width <= max_chars_per_line as usize {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    let mut hint = match engine.state() {
        SessionState::Idle if engine.config().is_timed() => {
            "start typing / (←→) time limit / (tab) new / (esc)ape".to_string()
        }
        SessionState::Idle => "start typing / (tab) new / (esc)ape".to_string(),
        _ => "(tab) new / (ctrl+r) retry / (esc)ape".to_string(),
    };
    // space is typed literally in sentences, so enter is the only way forward
    if engine.config().vocabulary == VocabularyKind::Sentences {
        hint = format!("(enter) next / {hint}");
    }
    Paragraph::new(Span::styled(hint, italic_style))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
}

/// Styled characters for tokens `start..end`, separated by spaces.
fn prompt_spans(engine: &SessionEngine, start: usize, end: usize) -> Vec<Span<'static>> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = bold_style.fg(Color::Green);
    let red_bold_style = bold_style.fg(Color::Red);
    let dim_bold_style = bold_style.add_modifier(Modifier::DIM);
    let underlined_dim_bold_style = dim_bold_style.add_modifier(Modifier::UNDERLINED);

    let mut spans = Vec::new();
    for index in start..end {
        let token = &engine.tokens()[index];
        match engine.classification(index) {
            Some(classes) => {
                for (ch, class) in token.chars().zip(classes) {
                    let style = match class {
                        CharClass::Correct => green_bold_style,
                        CharClass::Incorrect => red_bold_style,
                        CharClass::Pending => underlined_dim_bold_style,
                        CharClass::Untyped => dim_bold_style,
                    };
                    spans.push(Span::styled(ch.to_string(), style));
                }
                // typed past the end of the token
                let typed = if index == engine.cursor() {
                    engine.active_buffer()
                } else {
                    engine.committed_inputs()[index].as_str()
                };
                let overflow: String = typed.chars().skip(token.chars().count()).collect();
                if !overflow.is_empty() {
                    spans.push(Span::styled(
                        overflow,
                        red_bold_style.add_modifier(Modifier::CROSSED_OUT),
                    ));
                }
            }
            None => spans.push(Span::styled(token.clone(), dim_bold_style)),
        }
        if index + 1 < end {
            spans.push(Span::raw(" "));
        }
    }
    spans
}

fn page_bounds(cursor: usize, len: usize) -> (usize, usize) {
    let start = (cursor / PAGE_SIZE) * PAGE_SIZE;
    let start = start.min(len.saturating_sub(1));
    (start, (start + PAGE_SIZE).min(len))
}

fn render_results(engine: &SessionEngine, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let magenta_style = Style::default().fg(Color::Magenta);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // details
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let samples = &engine.stats().wpm_samples;
    let (overall_duration, highest_wpm) = compute_chart_params(samples);
    let tuples: Vec<(f64, f64)> = samples.iter().map(|p| (p.t, p.wpm)).collect();
    let datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .style(magenta_style)
        .graph_type(GraphType::Line)
        .data(&tuples)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([0.0, overall_duration])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(format_label(overall_duration), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(format_label(highest_wpm), bold_style),
                ]),
        )
        .render(chunks[0], buf);

    if let Some(summary) = engine.summary() {
        Paragraph::new(Span::styled(
            format!(
                "{} wpm   {}% acc   {:.2} sd",
                summary.wpm, summary.accuracy, summary.consistency
            ),
            bold_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        let mut details = format!(
            "{} tokens   {}/{} chars   {:.1}s   {}",
            summary.tokens_committed,
            summary.correct_chars,
            summary.total_typed_chars,
            summary.elapsed_secs,
            summary.finished_at.format("%H:%M:%S"),
        );
        if engine.diagnostic() == Some(SourceDiagnostic::RepeatsAllowed) {
            details.push_str("   (vocabulary too small to avoid repeats)");
        }
        Paragraph::new(Span::styled(
            details,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
    }

    Paragraph::new(Span::styled("(r)etry / (n)ew / (esc)ape", italic_style))
        .render(chunks[4], buf);
}

/// X (seconds) and Y (WPM) bounds for the results chart
fn compute_chart_params(samples: &[TimeSeriesPoint]) -> (f64, f64) {
    let highest_wpm = samples.iter().map(|p| p.wpm).fold(0.0, f64::max);
    let overall_duration = samples.last().map_or(1.0, |p| p.t).max(1.0);
    (overall_duration, highest_wpm.round().max(1.0))
}

fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
