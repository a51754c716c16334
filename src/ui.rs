pub mod controls;
pub mod display;
pub mod sidebar;

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::App;

const SIDEBAR_MAX_WIDTH: u16 = 40;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // tabs
                Constraint::Min(3),    // sidebar + reader
                Constraint::Length(3), // controls
            ])
            .split(area);

        render_tabs(self, chunks[0], buf);

        let body = if self.sidebar_open {
            let sidebar_width = (chunks[1].width / 3).min(SIDEBAR_MAX_WIDTH);
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(sidebar_width), Constraint::Min(10)])
                .split(chunks[1]);
            sidebar::render(self, columns[0], buf);
            columns[1]
        } else {
            chunks[1]
        };

        display::render(self.library.active_session().snapshot(), body, buf);
        controls::render(self, chunks[2], buf);
    }
}

fn render_tabs(app: &App, area: Rect, buf: &mut Buffer) {
    let active_style = Style::default()
        .fg(Color::White)
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD);
    let inactive_style = Style::default().fg(Color::Gray);

    let mut spans = Vec::new();
    for (idx, doc) in app.library.documents().iter().enumerate() {
        let style = if idx == app.library.active_index() {
            active_style
        } else {
            inactive_style
        };
        spans.push(Span::styled(format!(" {} ", doc.display_name), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(
        "(t) +",
        Style::default().fg(Color::DarkGray),
    ));

    Paragraph::new(Line::from(spans)).render(area, buf);
}
