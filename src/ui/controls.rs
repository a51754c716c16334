use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use glance::Snapshot;

use crate::{App, Mode};

/// "3/120", counting from one; "0/0" without words
pub fn position_label(snapshot: &Snapshot<'_>) -> String {
    if snapshot.words.is_empty() {
        "0/0".to_string()
    } else {
        format!("{}/{}", snapshot.current_index + 1, snapshot.words.len())
    }
}

pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let snapshot = app.library.active_session().snapshot();
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().fg(Color::DarkGray);

    let (play_label, play_style) = if snapshot.is_playing {
        ("❚❚ Pause", Style::default().fg(Color::White).patch(bold_style))
    } else {
        ("▶ Play", Style::default().fg(Color::Blue).patch(bold_style))
    };

    let status = Line::from(vec![
        Span::styled("SPEED ", dim_style),
        Span::styled(format!("{}", snapshot.wpm), bold_style),
        Span::styled(" wpm", dim_style),
        Span::raw("   "),
        Span::styled(play_label, play_style),
        Span::raw("   "),
        Span::styled("ZOOM ", dim_style),
        Span::styled(format!("{:.0}", snapshot.font_scale), bold_style),
        Span::raw("   "),
        Span::styled(position_label(&snapshot), dim_style),
    ]);

    let legend = match app.mode {
        Mode::Reading => {
            "(space) play / (←→) seek / (↑↓) speed / (+-) zoom / (e)dit / (s)idebar / (t) new / (x) close / (tab) switch / (esc) quit"
        }
        Mode::Editing => "editing: type or paste text / (esc) done",
    };

    Paragraph::new(vec![
        status,
        Line::from(Span::styled(
            legend,
            Style::default().add_modifier(Modifier::ITALIC).fg(Color::Gray),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(dim_style),
    )
    .alignment(Alignment::Center)
    .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_label() {
        let words = glance::tokenize::words("a b c");
        let snapshot = Snapshot {
            words: &words,
            current_index: 1,
            is_playing: false,
            wpm: 300,
            font_scale: 48.0,
        };
        assert_eq!(position_label(&snapshot), "2/3");

        let empty = Snapshot {
            words: &[],
            ..snapshot
        };
        assert_eq!(position_label(&empty), "0/0");
    }
}
