//! Status bar and error display rendering
//!
//! The status bar shows keyboard shortcuts for the focused pane; the
//! error panel lists recent worker and client errors.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{AppState, Pane};
use crate::utils::formatting::preview;

/// Renders the status bar with context-appropriate keyboard shortcuts
pub(crate) fn render_status_bar(f: &mut Frame, app: &AppState, area: Rect) {
    let shortcuts = if app.worker_failed {
        "Consumer stopped - see errors  [e] Errors  [q] Quit".to_string()
    } else {
        match app.focus {
            Pane::Topics => {
                "[↑↓] Select topic  [Tab] Messages  [e] Errors  [q] Quit".to_string()
            }
            Pane::Messages => {
                "[↑↓] Scroll  [Home/End] Jump  [Tab] Topics  [e] Errors  [q] Quit".to_string()
            }
        }
    };

    let style = if app.worker_failed {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::White)
    };

    let status_bar = Paragraph::new(shortcuts)
        .style(style)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Gray)),
        );

    f.render_widget(status_bar, area);
}

/// Renders the error log panel
///
/// Newest entries at the top, as many as fit the pane height. Each
/// entry is flattened to a single line; once the poll worker has died
/// a notice is pinned above the log, since from that point the message
/// stream cannot recover.
pub(crate) fn render_error_panel(f: &mut Frame, app: &AppState, area: Rect) {
    let rows = area.height.saturating_sub(2) as usize;
    let entry_width = area.width.saturating_sub(12) as usize;

    let mut lines: Vec<Line> = Vec::new();
    if app.worker_failed {
        lines.push(Line::from(Span::styled(
            "consumer stopped, no further messages will arrive",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }

    let mut shown = 0usize;
    for (timestamp, error) in app.error_log.iter().rev() {
        if lines.len() >= rows {
            break;
        }
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} ", timestamp.format("%H:%M:%S")),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw(preview(error, entry_width)),
        ]));
        shown += 1;
    }

    let hidden = app.error_log.len() - shown;
    let title = if hidden > 0 {
        format!("Errors ({} shown, {} older)", shown, hidden)
    } else {
        format!("Errors ({})", shown)
    };

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(Color::Red)),
    );

    f.render_widget(panel, area);
}
