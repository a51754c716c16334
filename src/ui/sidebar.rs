use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{App, Mode};

/// Line the word at `index` lands on when `words` are wrapped greedily into `width` columns
pub fn line_of_word(words: &[String], index: usize, width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let mut line = 0u16;
    let mut col = 0usize;

    for (i, word) in words.iter().enumerate() {
        let len = word.width().max(1);
        if col > 0 && col + 1 + len > width {
            line = line.saturating_add(1);
            col = 0;
        }
        if col > 0 {
            col += 1;
        }
        col += len;
        if i == index {
            break;
        }
    }
    line
}

/// Rows `text` occupies when hard line breaks are kept and long lines wrap at `width`
pub fn wrapped_height(text: &str, width: u16) -> u16 {
    let width = usize::from(width.max(1));
    text.split('\n')
        .map(|l| l.width().div_ceil(width).max(1))
        .sum::<usize>()
        .min(usize::from(u16::MAX)) as u16
}

pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let editing = app.mode == Mode::Editing;
    let block = Block::default()
        .borders(Borders::RIGHT)
        .title(if editing { "Editing" } else { "Library" })
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    block.render(area, buf);

    let session = app.library.active_session();

    if editing {
        let text = format!("{}▏", session.raw_text());
        let offset = wrapped_height(&text, inner.width).saturating_sub(inner.height);
        Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .scroll((offset, 0))
            .render(inner, buf);
        return;
    }

    let words = session.words();
    if words.is_empty() {
        Paragraph::new(Span::styled(
            "No text content. Press e to add text.",
            Style::default().fg(Color::DarkGray),
        ))
        .wrap(Wrap { trim: true })
        .render(inner, buf);
        return;
    }

    let current = session.current_index();
    let highlight = Style::default()
        .fg(Color::Blue)
        .add_modifier(Modifier::BOLD | Modifier::REVERSED);

    let mut spans = Vec::with_capacity(words.len() * 2);
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        if i == current {
            spans.push(Span::styled(word.as_str(), highlight));
        } else {
            spans.push(Span::raw(word.as_str()));
        }
    }

    // keep the current word roughly centred
    let offset = line_of_word(words, current, inner.width).saturating_sub(inner.height / 2);
    Paragraph::new(Line::from(spans))
        .wrap(Wrap { trim: true })
        .scroll((offset, 0))
        .render(inner, buf);
}
