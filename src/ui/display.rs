use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Paragraph, Widget},
};

use glance::Snapshot;

/// Scale at which words are drawn without extra spacing
const BASE_FONT_SCALE: f64 = 48.0;
const MAX_LETTER_GAP: usize = 4;

/// Columns inserted between letters for a given font scale.
///
/// A terminal cannot change its font size, so larger scales spread the
/// letters out instead.
pub fn letter_gap(font_scale: f64) -> usize {
    let steps = (font_scale / BASE_FONT_SCALE).round();
    if steps.is_nan() || steps <= 1.0 {
        0
    } else {
        (steps as usize - 1).min(MAX_LETTER_GAP)
    }
}

pub fn spaced(word: &str, gap: usize) -> String {
    if gap == 0 {
        return word.to_string();
    }
    let separator = " ".repeat(gap);
    word.chars()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(&separator)
}

pub fn render(snapshot: Snapshot<'_>, area: Rect, buf: &mut Buffer) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    let line = match snapshot.current_word() {
        Some(word) => Span::styled(
            spaced(word, letter_gap(snapshot.font_scale)),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        None => Span::styled(
            "Press e to add text",
            Style::default().fg(Color::DarkGray),
        ),
    };

    Paragraph::new(line)
        .alignment(Alignment::Center)
        .render(rows[1], buf);
}
