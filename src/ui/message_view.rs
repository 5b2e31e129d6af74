//! Message stream rendering
//!
//! The right-hand pane: a list of messages consumed from the selected
//! topic, newest at the bottom, with a detail block showing the full
//! payload of the message under the cursor.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{AppState, Pane, StoredMessage};
use crate::utils::formatting::preview;

/// Maximum characters of payload shown per list line
const LIST_PREVIEW_CHARS: usize = 80;

/// Renders the message stream pane
///
/// Splits the area into the scrolling list and a detail block for the
/// selected message.
pub(crate) fn render_message_stream(f: &mut Frame, app: &AppState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_message_list(f, app, chunks[0]);
    render_message_detail(f, app, chunks[1]);
}

fn render_message_list(f: &mut Frame, app: &AppState, area: Rect) {
    let empty = std::collections::VecDeque::new();
    let messages = app.current_messages().unwrap_or(&empty);

    let items: Vec<ListItem> = messages
        .iter()
        .map(|msg| {
            let key_display = msg.key.as_deref().unwrap_or("null");
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("[{}/{}] ", msg.partition, msg.offset),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(msg.timestamp.clone(), Style::default().fg(Color::Gray)),
                Span::raw(" | "),
                Span::styled(
                    format!("Key: {} ", key_display),
                    Style::default().fg(Color::Green),
                ),
                Span::raw("| "),
                Span::raw(preview(&msg.payload, LIST_PREVIEW_CHARS)),
            ]))
        })
        .collect();

    let title = match app.selected_topic() {
        Some(topic) if !messages.is_empty() => {
            format!("Messages - {} ({} shown)", topic, messages.len())
        }
        Some(topic) => format!("Messages - {} (waiting for messages)", topic),
        None => "Messages".to_string(),
    };

    let border_style = if app.focus == Pane::Messages {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Gray)
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        )
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol(">> ");

    let mut state = app.message_list_state.clone();
    f.render_stateful_widget(list, area, &mut state);
}

fn render_message_detail(f: &mut Frame, app: &AppState, area: Rect) {
    let selected: Option<&StoredMessage> = app
        .message_list_state
        .selected()
        .and_then(|index| app.current_messages().and_then(|m| m.get(index)));

    let (title, lines) = match selected {
        Some(msg) => {
            let mut lines = vec![
                Line::from(vec![
                    Span::styled("Partition: ", Style::default().fg(Color::DarkGray)),
                    Span::raw(msg.partition.to_string()),
                    Span::styled("  Offset: ", Style::default().fg(Color::DarkGray)),
                    Span::raw(msg.offset.to_string()),
                    Span::styled("  Timestamp: ", Style::default().fg(Color::DarkGray)),
                    Span::raw(format!(
                        "{} ({})",
                        msg.timestamp,
                        msg.timestamp_source.label()
                    )),
                    Span::styled("  Size: ", Style::default().fg(Color::DarkGray)),
                    Span::raw(format!("{}B", msg.payload_bytes)),
                ]),
                Line::from(""),
            ];
            lines.extend(msg.payload.lines().map(|l| Line::from(l.to_string())));
            (format!("Message {}/{}", msg.partition, msg.offset), lines)
        }
        None => (
            "Message".to_string(),
            vec![Line::from(Span::styled(
                "No message selected",
                Style::default().fg(Color::DarkGray),
            ))],
        ),
    };

    let detail = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(detail, area);
}
