//! Topic and consumer-group pane rendering

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use crate::app::{AppState, Pane};

/// Renders the topic list with partition counts
///
/// The subscribed topic is marked; the pane border highlights when the
/// list has keyboard focus.
pub(crate) fn render_topic_list(f: &mut Frame, app: &AppState, area: Rect) {
    let items: Vec<ListItem> = app
        .topics
        .iter()
        .map(|topic| {
            let marker = if topic.name == app.topic_name {
                "● "
            } else {
                "  "
            };
            ListItem::new(Line::from(vec![
                Span::raw(marker),
                Span::raw(topic.name.clone()),
                Span::styled(
                    format!("  {} partitions", topic.partitions),
                    Style::default().fg(Color::Green),
                ),
            ]))
        })
        .collect();

    let border_style = if app.focus == Pane::Topics {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Gray)
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(format!("Topics ({})", app.topics.len())),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    let mut state = app.topic_list_state.clone();
    f.render_stateful_widget(list, area, &mut state);
}

/// Renders the consumer-group pane
///
/// Shows each group from the startup listing with its broker-reported
/// state and member count, plus the live rebalance timestamp for this
/// dashboard's own group.
pub(crate) fn render_group_list(f: &mut Frame, app: &AppState, area: Rect) {
    let mut items: Vec<ListItem> = app
        .groups
        .iter()
        .map(|group| {
            let state_color = match group.state.as_str() {
                "Stable" => Color::Green,
                "Empty" | "Dead" => Color::DarkGray,
                _ => Color::Yellow,
            };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{} ", group.name)),
                Span::styled(group.state.clone(), Style::default().fg(state_color)),
                Span::styled(
                    format!("  {} members  {}", group.members, group.protocol),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    if let Some(last) = app.group_state.last_rebalance {
        items.push(ListItem::new(Line::from(Span::styled(
            format!("last rebalance: {}", last.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ))));
    }

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Gray))
            .title(format!("Consumer Groups ({})", app.groups.len())),
    );

    f.render_widget(list, area);
}
